//! Camera controllers and the mode state machine
//!
//! Two controllers with incompatible semantics share one camera:
//! - Fly: free 6-DOF movement in the camera's local frame
//! - Orbit: rotation and zoom about a fixed target
//!
//! Exactly one is enabled at a time; only the enabled one may touch the pose.

use std::f64::consts::PI;
use thiserror::Error;
use tracing::{debug, info};

use crate::camera::{self, CameraState, Vec3};
use crate::config::ControlsConfig;
use crate::input::{InputState, Key};

/// Keeps the orbit away from the poles where look-at degenerates
const POLAR_EPSILON: f64 = 1e-3;

#[derive(Error, Debug, PartialEq)]
pub enum SpeedError {
    #[error("Speed level {0} out of range (0-10)")]
    LevelOutOfRange(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Orbit,
    Fly,
}

impl ControlMode {
    pub fn toggled(self) -> Self {
        match self {
            ControlMode::Orbit => ControlMode::Fly,
            ControlMode::Fly => ControlMode::Orbit,
        }
    }
}

/// Speed preset: both scalars follow the same quadratic law
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSetting {
    level: u8,
    movement_speed: f64,
    forward_speed: f64,
}

impl SpeedSetting {
    /// Preset from a digit key; 0 selects the fastest preset (10)
    pub fn from_level(level: u8) -> Result<Self, SpeedError> {
        let level = match level {
            0 => 10,
            1..=10 => level,
            other => return Err(SpeedError::LevelOutOfRange(other)),
        };
        let squared = (level as f64).powi(2);
        Ok(Self {
            level,
            movement_speed: squared / 3.0 * 100.0 / 6.0,
            forward_speed: squared * 100.0 / 6.0,
        })
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Scene units per second applied by the fly controller
    pub fn movement_speed(&self) -> f64 {
        self.movement_speed
    }

    pub fn forward_speed(&self) -> f64 {
        self.forward_speed
    }

    /// Gauge arc fraction, 1.0 at the fastest preset
    pub fn fraction(&self) -> f64 {
        self.forward_speed * 6.0 / 10000.0
    }

    /// Number shown inside the gauge
    pub fn display(&self) -> f64 {
        self.forward_speed * 60.0 / 100.0
    }
}

/// A camera-control implementation
pub trait Controller {
    /// Take ownership of the camera; must not change the pose
    fn enable(&mut self, camera: &CameraState);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
    /// Advance by `dt` seconds using the current input
    fn tick(&mut self, camera: &mut CameraState, input: &mut InputState, dt: f64);
}

#[derive(Debug)]
pub struct FlyController {
    enabled: bool,
    movement_speed: f64,
    rotation_speed: f64,
}

impl FlyController {
    pub fn new(movement_speed: f64, rotation_speed: f64) -> Self {
        Self {
            enabled: false,
            movement_speed,
            rotation_speed,
        }
    }

    pub fn set_movement_speed(&mut self, speed: f64) {
        self.movement_speed = speed;
    }

    #[cfg(test)]
    pub fn movement_speed(&self) -> f64 {
        self.movement_speed
    }
}

impl Controller for FlyController {
    fn enable(&mut self, _camera: &CameraState) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn tick(&mut self, camera: &mut CameraState, input: &mut InputState, dt: f64) {
        // Pointer input only drives the orbit controller
        let _ = input.drain_pointer();
        if !self.enabled {
            return;
        }

        let local_move: Vec3 = [
            input.axis(Key::Right, Key::Left),
            input.axis(Key::Up, Key::Down),
            input.axis(Key::Back, Key::Forward),
        ];
        let step = self.movement_speed * dt;
        let world_move = camera::q_rotate_vec(camera.orientation, local_move);
        camera.position = camera::add(camera.position, camera::scale(world_move, step));

        let angle = self.rotation_speed * dt;
        let pitch = input.axis(Key::PitchUp, Key::PitchDown) * angle;
        let yaw = input.axis(Key::YawLeft, Key::YawRight) * angle;
        let roll = input.axis(Key::RollLeft, Key::RollRight) * angle;

        if pitch != 0.0 || yaw != 0.0 || roll != 0.0 {
            let mut q = camera.orientation;
            q = camera::q_mul(q, camera::q_from_axis_angle([1.0, 0.0, 0.0], pitch));
            q = camera::q_mul(q, camera::q_from_axis_angle([0.0, 1.0, 0.0], yaw));
            q = camera::q_mul(q, camera::q_from_axis_angle([0.0, 0.0, 1.0], roll));
            camera.orientation = camera::q_normalize(q);
        }
    }
}

#[derive(Debug)]
pub struct OrbitController {
    enabled: bool,
    target: Vec3,
    radius: f64,
    /// Azimuth about +Y
    theta: f64,
    /// Polar angle from +Y
    phi: f64,
    drag_speed: f64,
    key_speed: f64,
    zoom_speed: f64,
    min_radius: f64,
    max_radius: f64,
}

impl OrbitController {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            enabled: false,
            target: config.orbit_target,
            radius: config.orbit_min_radius,
            theta: 0.0,
            phi: PI / 2.0,
            drag_speed: config.orbit_drag_speed,
            key_speed: config.orbit_key_speed,
            zoom_speed: config.orbit_zoom_speed,
            min_radius: config.orbit_min_radius,
            max_radius: config.orbit_max_radius,
        }
    }

    /// Re-derive spherical coordinates from a camera position
    fn sync_from(&mut self, position: Vec3) {
        let offset = camera::sub(position, self.target);
        let radius = camera::length(offset);
        if radius < 1e-9 {
            self.radius = self.min_radius;
            self.theta = 0.0;
            self.phi = PI / 2.0;
            return;
        }
        self.radius = radius;
        self.theta = offset[0].atan2(offset[2]);
        self.phi = (offset[1] / radius).clamp(-1.0, 1.0).acos();
    }

    fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        camera::add(
            self.target,
            [
                self.radius * sin_phi * self.theta.sin(),
                self.radius * self.phi.cos(),
                self.radius * sin_phi * self.theta.cos(),
            ],
        )
    }
}

impl Controller for OrbitController {
    fn enable(&mut self, camera: &CameraState) {
        self.sync_from(camera.position);
        self.enabled = true;
        debug!(
            "Orbit synced: radius={:.1} theta={:.3} phi={:.3}",
            self.radius, self.theta, self.phi
        );
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn tick(&mut self, camera: &mut CameraState, input: &mut InputState, dt: f64) {
        let (drag, scroll) = input.drain_pointer();
        if !self.enabled {
            return;
        }

        self.theta -= drag[0] * self.drag_speed;
        self.phi -= drag[1] * self.drag_speed;
        self.theta += input.axis(Key::YawLeft, Key::YawRight) * self.key_speed * dt;
        self.phi -= input.axis(Key::PitchUp, Key::PitchDown) * self.key_speed * dt;
        self.phi = self.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        let mut zoom = (1.0 - scroll * self.zoom_speed).clamp(0.5, 1.5);
        if input.is_held(Key::ZoomIn) {
            zoom *= 0.98;
        }
        if input.is_held(Key::ZoomOut) {
            zoom *= 1.02;
        }
        self.radius = (self.radius * zoom).clamp(self.min_radius, self.max_radius);

        camera.position = self.position();
        camera.orientation = camera::look_at(camera.position, self.target, [0.0, 1.0, 0.0]);
    }
}

/// Two-state machine owning both controllers
pub struct ControlModeManager {
    mode: ControlMode,
    orbit: OrbitController,
    fly: FlyController,
    speed: SpeedSetting,
}

impl ControlModeManager {
    /// Starts in orbit mode with the orbit controller synced to `camera`
    pub fn new(config: &ControlsConfig, camera: &CameraState) -> anyhow::Result<Self> {
        let speed = SpeedSetting::from_level(config.initial_speed)?;
        let mut orbit = OrbitController::new(config);
        orbit.enable(camera);
        let fly = FlyController::new(speed.movement_speed(), config.rotation_speed);

        Ok(Self {
            mode: ControlMode::Orbit,
            orbit,
            fly,
            speed,
        })
    }

    pub fn active_mode(&self) -> ControlMode {
        self.mode
    }

    pub fn speed(&self) -> SpeedSetting {
        self.speed
    }

    #[cfg(test)]
    pub fn orbit(&self) -> &OrbitController {
        &self.orbit
    }

    #[cfg(test)]
    pub fn fly(&self) -> &FlyController {
        &self.fly
    }

    fn active_mut(&mut self) -> &mut dyn Controller {
        match self.mode {
            ControlMode::Orbit => &mut self.orbit,
            ControlMode::Fly => &mut self.fly,
        }
    }

    /// Flip Orbit <-> Fly. The camera is handed over unchanged.
    pub fn toggle_mode(&mut self, camera: &CameraState) -> ControlMode {
        self.active_mut().disable();
        self.mode = self.mode.toggled();
        self.active_mut().enable(camera);
        info!("Control mode -> {:?}", self.mode);
        self.mode
    }

    /// Re-enable the active controller after the camera was moved externally
    pub fn resync(&mut self, camera: &CameraState) {
        self.active_mut().enable(camera);
    }

    /// Apply a digit-key speed preset
    pub fn set_speed(&mut self, level: u8) -> Result<SpeedSetting, SpeedError> {
        let speed = SpeedSetting::from_level(level)?;
        self.fly.set_movement_speed(speed.movement_speed());
        self.speed = speed;
        debug!(
            "Speed level {} (movement={:.2}, forward={:.2})",
            speed.level(),
            speed.movement_speed(),
            speed.forward_speed()
        );
        Ok(speed)
    }

    /// Advance whichever controller is active
    pub fn tick(&mut self, camera: &mut CameraState, input: &mut InputState, dt: f64) {
        let controller = self.active_mut();
        if controller.is_enabled() {
            controller.tick(camera, input, dt);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(camera: &CameraState) -> ControlModeManager {
        ControlModeManager::new(&ControlsConfig::default(), camera).unwrap()
    }

    #[test]
    fn test_zero_aliases_ten() {
        assert_eq!(SpeedSetting::from_level(0).unwrap(), SpeedSetting::from_level(10).unwrap());
        assert_eq!(SpeedSetting::from_level(0).unwrap().fraction(), 1.0);
        assert_eq!(SpeedSetting::from_level(11), Err(SpeedError::LevelOutOfRange(11)));
    }

    #[test]
    fn test_speed_is_quadratic() {
        let one = SpeedSetting::from_level(1).unwrap();
        for k in 1..=9u8 {
            let s = SpeedSetting::from_level(k).unwrap();
            let k2 = (k as f64).powi(2);
            assert!((s.movement_speed() / one.movement_speed() - k2).abs() < 1e-9);
            assert!((s.forward_speed() / one.forward_speed() - k2).abs() < 1e-9);
        }
        assert!((one.display() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_preset_sequence() {
        let cam = CameraState::default();
        let mut m = manager(&cam);
        m.set_speed(3).unwrap();
        let after_zero = m.set_speed(0).unwrap();
        let zero_movement = m.fly().movement_speed();
        let after_ten = m.set_speed(10).unwrap();
        assert_eq!(after_zero, after_ten);
        assert_eq!(zero_movement, m.fly().movement_speed());
    }

    #[test]
    fn test_toggle_twice_keeps_mode_and_pose() {
        let cam = CameraState::looking_at([-1880.2, -790.3, -2993.9], [0.0; 3]);
        let before = cam;
        let mut m = manager(&cam);
        assert_eq!(m.active_mode(), ControlMode::Orbit);
        assert_eq!(m.toggle_mode(&cam), ControlMode::Fly);
        assert!(m.fly().is_enabled() && !m.orbit().is_enabled());
        assert_eq!(m.toggle_mode(&cam), ControlMode::Orbit);
        assert!(!m.fly().is_enabled() && m.orbit().is_enabled());
        assert_eq!(cam, before);
    }

    #[test]
    fn test_fly_moves_along_view_direction() {
        let mut cam = CameraState::default();
        let mut m = manager(&cam);
        m.toggle_mode(&cam);
        m.set_speed(10).unwrap();

        let mut input = InputState::default();
        input.press(Key::Forward);
        m.tick(&mut cam, &mut input, 0.01);

        let expected = m.speed().movement_speed() * 0.01;
        assert!(cam.position[0].abs() < 1e-9);
        assert!((cam.position[2] + expected).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_fly_ignores_input() {
        let mut cam = CameraState::looking_at([0.0, 0.0, 100.0], [0.0; 3]);
        let mut fly = FlyController::new(50.0, 1.0);
        let mut input = InputState::default();
        input.press(Key::Forward);
        let before = cam;
        fly.tick(&mut cam, &mut input, 0.01);
        assert_eq!(cam, before);
    }

    #[test]
    fn test_orbit_keeps_distance_to_target() {
        let mut cam = CameraState::looking_at([0.0, 0.0, 500.0], [0.0; 3]);
        let mut m = manager(&cam);
        let mut input = InputState::default();
        input.set_pointer_down(true);
        input.add_drag(40.0, -25.0);
        m.tick(&mut cam, &mut input, 0.01);

        assert!((cam.radius() - 500.0).abs() < 1e-6);
        assert!(cam.position[0].abs() > 1.0);
        let to_target = camera::normalize(camera::scale(cam.position, -1.0)).unwrap();
        let f = cam.forward();
        assert!((camera::dot(f, to_target) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_orbit_zoom_is_clamped() {
        let config = ControlsConfig::default();
        let mut cam = CameraState::looking_at([0.0, 0.0, config.orbit_min_radius + 1.0], [0.0; 3]);
        let mut m = manager(&cam);
        let mut input = InputState::default();
        input.press(Key::ZoomIn);
        for _ in 0..500 {
            m.tick(&mut cam, &mut input, 0.01);
        }
        assert!((cam.radius() - config.orbit_min_radius).abs() < 1e-6);
    }
}
