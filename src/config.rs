//! Configuration loader - YAML viewer settings + .env environment

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration loaded from galaxy_flyer.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assets: AssetsConfig,
    pub dataset: DatasetConfig,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub render: RenderConfig,
    pub device: DeviceKind,
}

/// Where the two startup assets come from (path or http(s) URL)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub catalog: String,
    pub redshift_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Dimensionless Hubble parameter applied to catalog coordinates
    pub scale_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_deg: f64,
    pub near: f64,
    pub far: f64,
    /// Start position in catalog units (scaled by `scale_factor`)
    pub start_position: [f64; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Digit preset applied at startup
    pub initial_speed: u8,
    /// Fixed controller step per frame, seconds
    pub tick_dt: f64,
    /// Fly-mode rotation, radians per second
    pub rotation_speed: f64,
    pub orbit_target: [f64; 3],
    /// Radians per pixel of pointer drag
    pub orbit_drag_speed: f64,
    /// Radians per second while an arrow key is held
    pub orbit_key_speed: f64,
    /// Radius change per unit of scroll
    pub orbit_zoom_speed: f64,
    pub orbit_min_radius: f64,
    pub orbit_max_radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub point_size: f32,
    /// Upper bound on drawn points; larger catalogs are subsampled
    pub max_points: usize,
    pub window_size: [f32; 2],
}

/// Input device class; decides help text and the tap-to-toggle target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Keyboard,
    Touch,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            catalog: "data/galaxies.json.gz".to_string(),
            redshift_table: "data/comoving_distances.json".to_string(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self { scale_factor: 0.7 }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: 60.0,
            near: 0.1,
            far: 100_000.0,
            start_position: [-2686.0, -1129.0, -4277.0],
        }
    }
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            initial_speed: 1,
            tick_dt: 0.01,
            rotation_speed: 1.5,
            orbit_target: [0.0, 0.0, 0.0],
            orbit_drag_speed: 0.005,
            orbit_key_speed: 1.5,
            orbit_zoom_speed: 0.002,
            orbit_min_radius: 10.0,
            orbit_max_radius: 50_000.0,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            point_size: 2.0,
            max_points: 300_000,
            window_size: [1280.0, 800.0],
        }
    }
}

/// Environment loaded from .env
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// Prefix for relative asset sources (directory or URL)
    pub asset_base: Option<String>,
    pub log_dir: String,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dataset.scale_factor.is_finite() && self.dataset.scale_factor > 0.0) {
            anyhow::bail!("dataset.scale_factor must be positive, got {}", self.dataset.scale_factor);
        }
        if !(1.0..179.0).contains(&self.camera.fov_deg) {
            anyhow::bail!("camera.fov_deg must be within 1..179, got {}", self.camera.fov_deg);
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            anyhow::bail!("camera clip planes invalid: near={} far={}", self.camera.near, self.camera.far);
        }
        if self.camera.start_position.iter().any(|v| !v.is_finite()) {
            anyhow::bail!("camera.start_position must be finite");
        }
        if self.controls.initial_speed > 9 {
            anyhow::bail!("controls.initial_speed must be a digit 0-9, got {}", self.controls.initial_speed);
        }
        let c = &self.controls;
        if !(c.tick_dt.is_finite() && c.tick_dt > 0.0) {
            anyhow::bail!("controls.tick_dt must be positive and finite, got {}", c.tick_dt);
        }
        if !(c.rotation_speed.is_finite() && c.rotation_speed > 0.0) {
            anyhow::bail!("controls.rotation_speed must be positive and finite, got {}", c.rotation_speed);
        }
        for (name, value) in [
            ("orbit_drag_speed", c.orbit_drag_speed),
            ("orbit_key_speed", c.orbit_key_speed),
            ("orbit_zoom_speed", c.orbit_zoom_speed),
        ] {
            if !value.is_finite() {
                anyhow::bail!("controls.{} must be finite, got {}", name, value);
            }
        }
        if c.orbit_target.iter().any(|v| !v.is_finite()) {
            anyhow::bail!("controls.orbit_target must be finite");
        }
        if !(c.orbit_min_radius > 0.0 && c.orbit_max_radius > c.orbit_min_radius) {
            anyhow::bail!(
                "orbit radius bounds invalid: min={} max={}",
                c.orbit_min_radius,
                c.orbit_max_radius
            );
        }
        if self.render.max_points == 0 {
            anyhow::bail!("render.max_points must be at least 1");
        }
        Ok(())
    }

    /// Camera start position in scene units
    pub fn scene_start_position(&self) -> [f64; 3] {
        let h = self.dataset.scale_factor;
        let p = self.camera.start_position;
        [p[0] * h, p[1] * h, p[2] * h]
    }
}

impl Environment {
    /// Load environment from .env file
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Environment {
            asset_base: std::env::var("GALAXY_ASSET_BASE").ok().filter(|s| !s.is_empty()),
            log_dir: std::env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "dataset:\n  scale_factor: 0.5\ndevice: touch\ncontrols:\n  initial_speed: 4\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dataset.scale_factor, 0.5);
        assert_eq!(config.device, DeviceKind::Touch);
        assert_eq!(config.controls.initial_speed, 4);
        assert_eq!(config.controls.tick_dt, 0.01);
        assert_eq!(config.assets.catalog, "data/galaxies.json.gz");
        config.validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.dataset.scale_factor = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.controls.initial_speed = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_controls() {
        let cases: [fn(&mut ControlsConfig); 7] = [
            |c| c.tick_dt = f64::INFINITY,
            |c| c.tick_dt = f64::NAN,
            |c| c.rotation_speed = f64::NAN,
            |c| c.rotation_speed = -1.0,
            |c| c.orbit_drag_speed = f64::INFINITY,
            |c| c.orbit_key_speed = f64::NAN,
            |c| c.orbit_zoom_speed = f64::NEG_INFINITY,
        ];
        for (i, mutate) in cases.iter().enumerate() {
            let mut config = Config::default();
            mutate(&mut config.controls);
            assert!(config.validate().is_err(), "case {} should be rejected", i);
        }
    }

    #[test]
    fn test_yaml_with_infinite_tick_fails_to_load() {
        let path = std::env::temp_dir().join(format!("galaxy_flyer_cfg_{}.yaml", std::process::id()));
        std::fs::write(&path, "controls:\n  tick_dt: .inf\n").unwrap();
        let result = Config::load(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_scene_start_position() {
        let config = Config::default();
        let p = config.scene_start_position();
        assert!((p[0] - (-2686.0 * 0.7)).abs() < 1e-9);
    }
}
