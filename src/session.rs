//! Viewer session - the explicit context behind the frame loop
//!
//! Owns the camera, the control modes, input state, toggles and loaded
//! assets. Event handlers mutate it between frames; `frame` runs one
//! cooperative step: tick the active controller, then refresh the HUD when
//! something changed. Rendering is left to the caller and happens every frame.

use tracing::{debug, info, warn};

use crate::assets::{AssetEvent, AssetKind};
use crate::camera::CameraState;
use crate::catalog::Catalog;
use crate::config::{Config, DeviceKind};
use crate::controls::{ControlMode, ControlModeManager};
use crate::hud::{self, HudVisibility};
use crate::input::{InputState, Key};
use crate::log_error;
use crate::navigation::{self, DerivedHudState, HudInputs};
use crate::redshift::RedshiftTable;
use crate::render::PointCloudRenderer;

/// Lifecycle of a startup asset
#[derive(Debug)]
pub enum AssetState<T> {
    Loading,
    Ready(T),
    /// Fetch failed; stays this way for the session
    Unavailable,
}

impl<T> AssetState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            AssetState::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AssetState::Loading)
    }
}

/// Host input, already mapped to logical keys
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown,
    PointerUp,
    PointerDrag { dx: f64, dy: f64 },
    Scroll(f64),
    Resize { width: f32, height: f32 },
    /// Tap on the help panel
    Tap,
    FocusLost,
}

/// What one frame step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub ticked: bool,
    pub hud_refreshed: bool,
}

pub struct Session {
    camera: CameraState,
    start_camera: CameraState,
    controls: ControlModeManager,
    input: InputState,
    visibility: HudVisibility,
    hud: DerivedHudState,
    hud_dirty: bool,
    show_colors: bool,
    show_panel: bool,
    device: DeviceKind,
    catalog: AssetState<Catalog>,
    redshift: AssetState<RedshiftTable>,
    renderer: PointCloudRenderer,
    scale_factor: f64,
    tick_dt: f64,
    max_points: usize,
}

impl Session {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let start_camera =
            CameraState::looking_at(config.scene_start_position(), config.controls.orbit_target);
        let controls = ControlModeManager::new(&config.controls, &start_camera)?;
        let visibility = HudVisibility::for_mode(controls.active_mode());

        info!(
            "Session created: mode={:?}, device={:?}, start={:?}",
            controls.active_mode(),
            config.device,
            start_camera.position
        );

        Ok(Self {
            camera: start_camera,
            start_camera,
            controls,
            input: InputState::default(),
            visibility,
            hud: DerivedHudState::default(),
            hud_dirty: true,
            show_colors: false,
            show_panel: true,
            device: config.device,
            catalog: AssetState::Loading,
            redshift: AssetState::Loading,
            renderer: PointCloudRenderer::new(&config.camera, &config.render),
            scale_factor: config.dataset.scale_factor,
            tick_dt: config.controls.tick_dt,
            max_points: config.render.max_points,
        })
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn mode(&self) -> ControlMode {
        self.controls.active_mode()
    }

    pub fn hud(&self) -> &DerivedHudState {
        &self.hud
    }

    pub fn visibility(&self) -> HudVisibility {
        self.visibility
    }

    pub fn show_colors(&self) -> bool {
        self.show_colors
    }

    pub fn show_panel(&self) -> bool {
        self.show_panel
    }

    pub fn renderer(&self) -> &PointCloudRenderer {
        &self.renderer
    }

    /// Loading notice is shown until the catalog resolves either way
    pub fn is_loading(&self) -> bool {
        self.catalog.is_loading()
    }

    pub fn help_lines(&self) -> Vec<String> {
        hud::help_lines(self.mode(), self.device, self.show_colors)
    }

    /// Apply one host event. Runs entirely between frames.
    pub fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::KeyDown(key) => self.key_down(key),
            SessionEvent::KeyUp(key) => {
                self.input.release(key);
                self.hud_dirty = true;
            }
            SessionEvent::PointerDown => {
                self.input.set_pointer_down(true);
                self.hud_dirty = true;
            }
            SessionEvent::PointerUp => {
                self.input.set_pointer_down(false);
                self.hud_dirty = true;
            }
            SessionEvent::PointerDrag { dx, dy } => self.input.add_drag(dx, dy),
            SessionEvent::Scroll(delta) => {
                self.input.add_scroll(delta);
                self.hud_dirty = true;
            }
            SessionEvent::Resize { width, height } => {
                debug!("Viewport resized to {}x{}", width, height);
                self.renderer.projection.set_viewport(width, height);
            }
            SessionEvent::Tap => {
                if self.device == DeviceKind::Touch {
                    self.toggle_colors();
                }
            }
            SessionEvent::FocusLost => {
                self.input.clear();
                self.hud_dirty = true;
            }
        }
    }

    fn key_down(&mut self, key: Key) {
        self.hud_dirty = true;
        // Auto-repeat of a held key is not a new press
        if !self.input.press(key) {
            return;
        }
        match key {
            Key::ToggleColors => self.toggle_colors(),
            Key::TogglePanel => {
                self.show_panel = !self.show_panel;
                debug!("Help panel {}", if self.show_panel { "shown" } else { "hidden" });
            }
            Key::ToggleMode => self.toggle_mode(),
            Key::Home => self.reset_view(),
            Key::Digit(level) => {
                if let Err(e) = self.controls.set_speed(level) {
                    warn!("Ignoring speed key: {}", e);
                }
            }
            _ => {}
        }
    }

    fn toggle_colors(&mut self) {
        self.show_colors = !self.show_colors;
        debug!("Category colors {}", if self.show_colors { "enabled" } else { "disabled" });
    }

    /// Switch control mode; HUD visibility follows in the same step
    pub fn toggle_mode(&mut self) {
        if self.device == DeviceKind::Touch {
            debug!("Fly mode is keyboard-only");
            return;
        }
        let mode = self.controls.toggle_mode(&self.camera);
        self.visibility = HudVisibility::for_mode(mode);
        self.hud_dirty = true;
    }

    /// Return to the start pose; the active controller picks it up from there
    pub fn reset_view(&mut self) {
        self.camera = self.start_camera;
        self.controls.resync(&self.camera);
        self.hud_dirty = true;
        info!("View reset to start position");
    }

    /// Take a finished asset load
    pub fn handle_asset(&mut self, event: AssetEvent) {
        match event {
            AssetEvent::Catalog(Ok(catalog)) => {
                if catalog.is_empty() {
                    warn!("Galaxy catalog loaded but contains no rows");
                }
                self.renderer.set_catalog(&catalog, self.max_points);
                self.catalog = AssetState::Ready(catalog);
            }
            AssetEvent::Catalog(Err(e)) => {
                log_error!(e, asset = %AssetKind::Catalog);
                self.catalog = AssetState::Unavailable;
            }
            AssetEvent::RedshiftTable(Ok(table)) => {
                self.redshift = AssetState::Ready(table);
            }
            AssetEvent::RedshiftTable(Err(e)) => {
                log_error!(e, asset = %AssetKind::RedshiftTable);
                self.redshift = AssetState::Unavailable;
            }
        }
        self.hud_dirty = true;
    }

    /// One cooperative step of the frame loop
    pub fn frame(&mut self) -> FrameReport {
        let active = self.input.is_active();

        if active {
            let before = self.camera;
            self.controls.tick(&mut self.camera, &mut self.input, self.tick_dt);
            if !self.camera.is_finite() {
                warn!("Controller produced a non-finite pose, keeping previous");
                self.camera = before;
            }
        }

        let refresh = active || self.hud_dirty;
        if refresh {
            self.refresh_hud();
            self.hud_dirty = false;
        }

        FrameReport {
            ticked: active,
            hud_refreshed: refresh,
        }
    }

    fn refresh_hud(&mut self) {
        let throttle_held = self.input.is_held(Key::Forward) || self.input.is_held(Key::Back);
        self.hud = navigation::derive_hud(&HudInputs {
            camera: &self.camera,
            speed: self.controls.speed(),
            throttle_held,
            table: self.redshift.ready(),
            scale_factor: self.scale_factor,
            previous_heading: self.hud.map_heading_deg,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetError;
    use crate::camera::IDENTITY;

    fn session() -> Session {
        Session::new(&Config::default()).unwrap()
    }

    fn table() -> RedshiftTable {
        RedshiftTable::new(vec![(0.0, 0.0), (100.0, 0.5), (200.0, 1.0)]).unwrap()
    }

    fn press(s: &mut Session, key: Key) {
        s.handle(SessionEvent::KeyDown(key));
        s.handle(SessionEvent::KeyUp(key));
    }

    #[test]
    fn test_starts_in_orbit_with_hud_hidden() {
        let mut s = session();
        assert_eq!(s.mode(), ControlMode::Orbit);
        assert!(!s.visibility().any());
        assert!(s.is_loading());
        let report = s.frame();
        assert!(!report.ticked);
        assert!(report.hud_refreshed);
        assert!(!s.frame().hud_refreshed);
    }

    #[test]
    fn test_double_toggle_restores_everything() {
        let mut s = session();
        s.frame();
        let pose = *s.camera();
        let visibility = s.visibility();

        press(&mut s, Key::ToggleMode);
        assert_eq!(s.mode(), ControlMode::Fly);
        assert!(s.visibility().any());
        s.frame();
        press(&mut s, Key::ToggleMode);
        s.frame();

        assert_eq!(s.mode(), ControlMode::Orbit);
        assert_eq!(s.visibility(), visibility);
        assert_eq!(*s.camera(), pose);
    }

    #[test]
    fn test_key_repeat_does_not_retoggle() {
        let mut s = session();
        s.handle(SessionEvent::KeyDown(Key::ToggleColors));
        s.handle(SessionEvent::KeyDown(Key::ToggleColors));
        assert!(s.show_colors());
        s.handle(SessionEvent::KeyUp(Key::ToggleColors));
        press(&mut s, Key::ToggleColors);
        assert!(!s.show_colors());
    }

    #[test]
    fn test_tap_toggles_colors_only_on_touch() {
        let mut s = session();
        s.handle(SessionEvent::Tap);
        assert!(!s.show_colors());

        let mut config = Config::default();
        config.device = DeviceKind::Touch;
        let mut t = Session::new(&config).unwrap();
        t.handle(SessionEvent::Tap);
        assert!(t.show_colors());
        press(&mut t, Key::ToggleMode);
        assert_eq!(t.mode(), ControlMode::Orbit);
    }

    #[test]
    fn test_redshift_scenario() {
        let mut s = session();
        s.handle_asset(AssetEvent::Catalog(Catalog::from_json(
            b"[[10,0,0,0],[0,10,0,1],[0,0,10,2]]",
            0.7,
        )
        .map_err(AssetError::from)));
        s.handle_asset(AssetEvent::RedshiftTable(Ok(table())));
        assert!(!s.is_loading());
        assert_eq!(s.renderer().point_count(), 3);

        // Scene radius 105 is comoving distance 150 at h = 0.7
        s.camera = CameraState::new([105.0, 0.0, 0.0], IDENTITY);
        s.hud_dirty = true;
        s.frame();
        assert!((s.hud().radial_distance - 150.0).abs() < 1e-9);
        assert_eq!(s.hud().redshift_display, "0.75");

        s.camera = CameraState::new([0.0, 350.0, 0.0], IDENTITY);
        s.hud_dirty = true;
        s.frame();
        assert!((s.hud().radial_distance - 500.0).abs() < 1e-9);
        assert_eq!(s.hud().redshift_display, "> 1");
    }

    #[test]
    fn test_unloaded_table_is_blank_not_error() {
        let mut s = session();
        s.frame();
        assert_eq!(s.hud().redshift_display, "");

        s.handle_asset(AssetEvent::RedshiftTable(Err(AssetError::Task("boom".to_string()))));
        s.handle_asset(AssetEvent::Catalog(Err(AssetError::Task("boom".to_string()))));
        s.frame();
        assert_eq!(s.hud().redshift_display, "");
        assert!(!s.is_loading());
        assert_eq!(s.renderer().point_count(), 0);
    }

    #[test]
    fn test_origin_camera_has_defined_declination() {
        let mut s = session();
        s.camera = CameraState::new([0.0, 0.0, 0.0], IDENTITY);
        s.hud_dirty = true;
        s.frame();
        assert_eq!(s.hud().sky_dec_deg, 0.0);
        assert!(s.hud().sky_ra_deg.is_finite());
    }

    #[test]
    fn test_hud_settles_after_release() {
        let mut s = session();
        press(&mut s, Key::ToggleMode);
        s.frame();

        s.handle(SessionEvent::KeyDown(Key::Forward));
        let r = s.frame();
        assert!(r.ticked && r.hud_refreshed);
        assert!(s.hud().throttle_fraction > 0.0);
        s.frame();

        s.handle(SessionEvent::KeyUp(Key::Forward));
        let r = s.frame();
        assert!(!r.ticked && r.hud_refreshed);
        assert_eq!(s.hud().position, s.camera().position);
        assert_eq!(s.hud().throttle_fraction, 0.0);

        assert!(!s.frame().hud_refreshed);
        assert_eq!(s.hud().position, s.camera().position);
    }

    #[test]
    fn test_speed_keys() {
        let mut s = session();
        press(&mut s, Key::Digit(3));
        s.frame();
        assert_eq!(s.hud().speed_display, "90");
        press(&mut s, Key::Digit(0));
        s.frame();
        assert_eq!(s.hud().speed_display, "1000");
        assert_eq!(s.hud().speed_fraction, 1.0);
    }

    #[test]
    fn test_orbit_does_not_move_while_flying() {
        let mut s = session();
        press(&mut s, Key::ToggleMode);
        s.handle(SessionEvent::PointerDown);
        s.handle(SessionEvent::PointerDrag { dx: 50.0, dy: 20.0 });
        let before = *s.camera();
        s.frame();
        assert_eq!(*s.camera(), before);
    }

    #[test]
    fn test_non_finite_step_keeps_previous_pose() {
        let mut s = session();
        press(&mut s, Key::ToggleMode);
        s.frame();
        s.tick_dt = f64::INFINITY;
        let before = *s.camera();

        s.handle(SessionEvent::KeyDown(Key::Forward));
        assert!(s.frame().ticked);
        assert_eq!(*s.camera(), before);
        s.handle(SessionEvent::KeyUp(Key::Forward));

        s.handle(SessionEvent::KeyDown(Key::YawLeft));
        assert!(s.frame().ticked);
        assert_eq!(*s.camera(), before);

        let hud = s.hud();
        assert_eq!(hud.position, before.position);
        for v in [
            hud.map_x,
            hud.map_y,
            hud.map_heading_deg,
            hud.sky_ra_deg,
            hud.sky_dec_deg,
            hud.radial_distance,
        ] {
            assert!(v.is_finite());
        }
    }

    #[test]
    fn test_empty_catalog_clears_loading() {
        let mut s = session();
        s.handle_asset(AssetEvent::Catalog(Ok(Catalog::default())));
        assert!(!s.is_loading());
        assert_eq!(s.renderer().point_count(), 0);
    }

    #[test]
    fn test_reset_view() {
        let mut s = session();
        let start = *s.camera();
        press(&mut s, Key::ToggleMode);
        s.handle(SessionEvent::KeyDown(Key::Forward));
        s.frame();
        s.handle(SessionEvent::KeyUp(Key::Forward));
        assert_ne!(*s.camera(), start);
        press(&mut s, Key::Home);
        assert_eq!(*s.camera(), start);
        assert_eq!(s.mode(), ControlMode::Fly);
    }
}
