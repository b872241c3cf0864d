//! Navigation readings derived from the camera pose
//!
//! Everything here is a pure function of the camera, the speed preset and
//! the redshift table. The HUD only formats and paints the results.

use crate::camera::{CameraState, Vec3};
use crate::controls::SpeedSetting;
use crate::redshift::RedshiftTable;

/// Scene units per map display unit
const MAP_DIVISOR: f64 = 120.0;
/// Map display is 100 x 100 with the origin in the middle
const MAP_CENTER: f64 = 50.0;
/// Rotates atan2 output so 0 degrees points up the map
const HEADING_OFFSET_DEG: f64 = 90.0;
/// Below this the look direction is vertical and the heading is kept
const HEADING_MIN_NORM: f64 = 1e-9;
/// Chart RA origin
const CHART_RA_OFFSET_DEG: f64 = 270.0;
/// Shift from chart RA to the printed RA label
const RA_LABEL_OFFSET_DEG: f64 = 90.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapReading {
    pub map_x: f64,
    pub map_y: f64,
    pub heading_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyReading {
    /// Horizontal chart coordinate, [0, 360)
    pub ra_deg: f64,
    pub dec_deg: f64,
}

impl SkyReading {
    /// RA as printed under the chart, [0, 360)
    pub fn ra_label(&self) -> f64 {
        (self.ra_deg + RA_LABEL_OFFSET_DEG).rem_euclid(360.0)
    }
}

/// Everything the HUD paints, recomputed from the camera each refresh
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedHudState {
    pub position: Vec3,
    pub map_x: f64,
    pub map_y: f64,
    pub map_heading_deg: f64,
    pub sky_ra_deg: f64,
    pub sky_dec_deg: f64,
    /// Comoving distance: scene radius divided by the scale factor
    pub radial_distance: f64,
    /// Empty while the table has not loaded
    pub redshift_display: String,
    pub speed_fraction: f64,
    /// Colored gauge trace: the speed fraction while thrust is held
    pub throttle_fraction: f64,
    pub speed_display: String,
}

impl Default for DerivedHudState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            map_x: MAP_CENTER,
            map_y: MAP_CENTER,
            map_heading_deg: 0.0,
            sky_ra_deg: 0.0,
            sky_dec_deg: 0.0,
            radial_distance: 0.0,
            redshift_display: String::new(),
            speed_fraction: 0.0,
            throttle_fraction: 0.0,
            speed_display: String::new(),
        }
    }
}

/// Heading in degrees from the horizontal part of `forward`, or `None` when vertical
pub fn heading_deg(forward: Vec3) -> Option<f64> {
    let (dx, dy) = (forward[0], forward[1]);
    let norm = (dx * dx + dy * dy).sqrt();
    if !(norm >= HEADING_MIN_NORM) {
        return None;
    }
    let (dx, dy) = (dx / norm, dy / norm);
    Some((-dy).atan2(dx).to_degrees() + HEADING_OFFSET_DEG)
}

/// Affine map of x/y onto the 100 x 100 display plus heading
pub fn map_projection(camera: &CameraState, previous_heading: f64) -> MapReading {
    let [x, y, _] = camera.position;
    MapReading {
        map_x: x / MAP_DIVISOR + MAP_CENTER,
        map_y: MAP_CENTER - y / MAP_DIVISOR,
        heading_deg: heading_deg(camera.forward()).unwrap_or(previous_heading),
    }
}

/// Declination and chart RA of a position.
///
/// The `cos(30°)` pre-scale on x is part of the chart's projection and is
/// kept as-is.
pub fn sky_projection(position: Vec3) -> SkyReading {
    let [x, y, z] = position;
    let r = (x * x + y * y + z * z).sqrt();

    let dec = if r > 0.0 && r.is_finite() {
        (z / r).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };
    let ra = y.atan2(x / std::f64::consts::FRAC_PI_6.cos());

    let ra_deg = (ra.to_degrees() + CHART_RA_OFFSET_DEG).rem_euclid(360.0);
    SkyReading {
        // rem_euclid can round up to exactly 360 for tiny negative inputs
        ra_deg: if ra_deg >= 360.0 { 0.0 } else { ra_deg },
        dec_deg: dec.to_degrees(),
    }
}

/// Comoving distance of the camera from the origin
pub fn radial_distance(camera: &CameraState, scale_factor: f64) -> f64 {
    camera.radius() / scale_factor
}

/// Inputs to one HUD recompute
pub struct HudInputs<'a> {
    pub camera: &'a CameraState,
    pub speed: SpeedSetting,
    pub throttle_held: bool,
    pub table: Option<&'a RedshiftTable>,
    pub scale_factor: f64,
    pub previous_heading: f64,
}

pub fn derive_hud(inputs: &HudInputs<'_>) -> DerivedHudState {
    let map = map_projection(inputs.camera, inputs.previous_heading);
    let sky = sky_projection(inputs.camera.position);
    let distance = radial_distance(inputs.camera, inputs.scale_factor);

    let redshift_display = inputs
        .table
        .map(|t| t.display(distance))
        .unwrap_or_default();

    let speed_fraction = inputs.speed.fraction();

    DerivedHudState {
        position: inputs.camera.position,
        map_x: map.map_x,
        map_y: map.map_y,
        map_heading_deg: map.heading_deg,
        sky_ra_deg: sky.ra_deg,
        sky_dec_deg: sky.dec_deg,
        radial_distance: distance,
        redshift_display,
        speed_fraction,
        throttle_fraction: if inputs.throttle_held { speed_fraction } else { 0.0 },
        speed_display: format!("{:.0}", inputs.speed.display()),
    }
}
