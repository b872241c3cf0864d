//! HUD instruments
//!
//! Stateless sinks: each one paints the values it is handed into a screen
//! rectangle. Nothing here derives navigation state.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Stroke, Vec2};

use crate::config::DeviceKind;
use crate::controls::ControlMode;
use crate::navigation::{DerivedHudState, SkyReading};

const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 150);
const HUD_WHITE: Color32 = Color32::from_rgb(230, 230, 240);
const HUD_DIM: Color32 = Color32::from_rgba_premultiplied(90, 90, 110, 120);
const HUD_ACCENT: Color32 = Color32::from_rgb(120, 200, 255);

/// Pixels per map display unit (map display is 100 x 100)
const MAP_PIXELS_PER_UNIT: f32 = 1.5;
/// Gauge arc covers three quarters of the circle
const GAUGE_SWEEP_DEG: f32 = 270.0;
const GAUGE_START_DEG: f32 = 135.0;
/// Lowest declination drawn on the chart
const CHART_MIN_DEC: f32 = -40.0;
const CHART_MAX_DEC: f32 = 90.0;

/// Which instruments are on screen; a pure function of control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudVisibility {
    pub gauge: bool,
    pub map: bool,
    pub chart: bool,
    pub info: bool,
}

impl HudVisibility {
    pub fn for_mode(mode: ControlMode) -> Self {
        let shown = mode == ControlMode::Fly;
        Self {
            gauge: shown,
            map: shown,
            chart: shown,
            info: shown,
        }
    }

    pub fn any(&self) -> bool {
        self.gauge || self.map || self.chart || self.info
    }
}

/// Help panel lines for the current mode and device
pub fn help_lines(mode: ControlMode, device: DeviceKind, show_colors: bool) -> Vec<String> {
    let keyboard = device == DeviceKind::Keyboard;
    let flying = mode == ControlMode::Fly;
    let mut lines = Vec::new();

    if keyboard && flying {
        lines.push("Move [WASDRF]".to_string());
        lines.push("Rotate [▲ ▼ ◀ ▶ QE]".to_string());
        lines.push("Change speed [0–9]".to_string());
    }
    if keyboard && !flying {
        lines.push("Orbit [drag ▲ ▼ ◀ ▶], zoom [scroll + −]".to_string());
    }
    if keyboard {
        lines.push(format!(
            "Fly mode [M]: {}",
            if flying { "enabled" } else { "disabled" }
        ));
    }
    lines.push(format!(
        "Colors {}: {}",
        if keyboard { "[C]" } else { "[tap here]" },
        if show_colors { "enabled" } else { "disabled" }
    ));
    if keyboard {
        lines.push("Hide this panel [P]".to_string());
    } else {
        lines.push("Fly mode: computer-only".to_string());
    }
    lines
}

/// Points along a circular arc; angles in degrees, clockwise on screen
fn arc_points(center: Pos2, radius: f32, start_deg: f32, sweep_deg: f32) -> Vec<Pos2> {
    let segments = ((sweep_deg.abs() / 4.0).ceil() as usize).max(1);
    (0..=segments)
        .map(|i| {
            let a = (start_deg + sweep_deg * i as f32 / segments as f32).to_radians();
            center + radius * Vec2::new(a.cos(), a.sin())
        })
        .collect()
}

/// Arrow pointing along `heading_deg` (0 = up, clockwise)
fn paint_arrow(painter: &egui::Painter, tip_center: Pos2, heading_deg: f32, size: f32, color: Color32) {
    let a = heading_deg.to_radians();
    let dir = Vec2::new(a.sin(), -a.cos());
    let side = Vec2::new(-dir.y, dir.x);
    let tip = tip_center + dir * size;
    let left = tip_center - dir * size * 0.5 + side * size * 0.6;
    let right = tip_center - dir * size * 0.5 - side * size * 0.6;
    painter.add(egui::Shape::convex_polygon(vec![tip, left, right], color, Stroke::NONE));
}

fn paint_crosshair(painter: &egui::Painter, rect: Rect, at: Pos2) {
    let stroke = Stroke::new(1.0, HUD_ACCENT.gamma_multiply(0.6));
    painter.line_segment([Pos2::new(at.x, rect.top()), Pos2::new(at.x, rect.bottom())], stroke);
    painter.line_segment([Pos2::new(rect.left(), at.y), Pos2::new(rect.right(), at.y)], stroke);
}

/// Two-trace speed gauge: white for current speed, colored while throttle is held
pub struct SpeedGauge;

impl SpeedGauge {
    pub const SIZE: Vec2 = Vec2::new(130.0, 130.0);

    pub fn paint(painter: &egui::Painter, rect: Rect, speed_fraction: f64, throttle_fraction: f64, number: &str) {
        let center = rect.center();
        let radius = rect.width().min(rect.height()) * 0.4;

        painter.circle_filled(center, radius + 10.0, PANEL_BG);
        painter.add(egui::Shape::line(
            arc_points(center, radius, GAUGE_START_DEG, GAUGE_SWEEP_DEG),
            Stroke::new(6.0, HUD_DIM),
        ));

        let white = speed_fraction.clamp(0.0, 1.0) as f32;
        if white > 0.0 {
            painter.add(egui::Shape::line(
                arc_points(center, radius, GAUGE_START_DEG, GAUGE_SWEEP_DEG * white),
                Stroke::new(6.0, HUD_WHITE),
            ));
        }
        let colored = throttle_fraction.clamp(0.0, 1.0) as f32;
        if colored > 0.0 {
            painter.add(egui::Shape::line(
                arc_points(center, radius - 8.0, GAUGE_START_DEG, GAUGE_SWEEP_DEG * colored),
                Stroke::new(4.0, HUD_ACCENT),
            ));
        }

        painter.text(center, Align2::CENTER_CENTER, number, FontId::proportional(26.0), HUD_WHITE);
        painter.text(
            center + Vec2::new(0.0, radius * 0.55),
            Align2::CENTER_CENTER,
            "Mpc/s",
            FontId::proportional(11.0),
            HUD_WHITE,
        );
    }
}

/// Top-down x/y map with heading arrow
pub struct PositionMap;

impl PositionMap {
    pub const SIZE: Vec2 = Vec2::new(100.0 * MAP_PIXELS_PER_UNIT, 100.0 * MAP_PIXELS_PER_UNIT + 18.0);

    pub fn paint(painter: &egui::Painter, rect: Rect, hud: &DerivedHudState) {
        let map_rect = Rect::from_min_size(rect.min, Vec2::splat(100.0 * MAP_PIXELS_PER_UNIT));
        painter.rect_filled(rect, 4.0, PANEL_BG);
        painter.rect_stroke(map_rect, 0.0, Stroke::new(1.0, HUD_DIM));

        let at = map_rect.min
            + Vec2::new(
                hud.map_x as f32 * MAP_PIXELS_PER_UNIT,
                hud.map_y as f32 * MAP_PIXELS_PER_UNIT,
            );
        let clipped = painter.with_clip_rect(map_rect);
        paint_crosshair(&clipped, map_rect, at);
        paint_arrow(&clipped, at, hud.map_heading_deg as f32, 7.0, HUD_WHITE);

        let [x, y, z] = hud.position;
        painter.text(
            Pos2::new(rect.center().x, rect.bottom() - 2.0),
            Align2::CENTER_BOTTOM,
            format!("({:.0}, {:.0}, {:.0})", x, y, z),
            FontId::monospace(11.0),
            HUD_WHITE,
        );
    }
}

/// RA/DEC chart using the same crosshair idiom as the map
pub struct SkyChart;

impl SkyChart {
    pub const SIZE: Vec2 = Vec2::new(360.0, CHART_MAX_DEC - CHART_MIN_DEC + 18.0);

    pub fn paint(painter: &egui::Painter, rect: Rect, hud: &DerivedHudState) {
        let chart_rect = Rect::from_min_size(rect.min, Vec2::new(360.0, CHART_MAX_DEC - CHART_MIN_DEC));
        painter.rect_filled(rect, 4.0, PANEL_BG);
        painter.rect_stroke(chart_rect, 0.0, Stroke::new(1.0, HUD_DIM));

        let at = chart_rect.min + Vec2::new(hud.sky_ra_deg as f32, CHART_MAX_DEC - hud.sky_dec_deg as f32);
        let clipped = painter.with_clip_rect(chart_rect);
        paint_crosshair(&clipped, chart_rect, at);
        clipped.circle_filled(at, 3.5, HUD_WHITE);

        let sky = SkyReading {
            ra_deg: hud.sky_ra_deg,
            dec_deg: hud.sky_dec_deg,
        };
        painter.text(
            Pos2::new(rect.center().x, rect.bottom() - 2.0),
            Align2::CENTER_BOTTOM,
            format!("RA = {:.1}°,   DEC = {:.1}°", sky.ra_label(), sky.dec_deg),
            FontId::monospace(11.0),
            HUD_WHITE,
        );
    }
}

/// Redshift and distance readout
pub struct HudInfo;

impl HudInfo {
    pub const SIZE: Vec2 = Vec2::new(220.0, 48.0);

    pub fn paint(painter: &egui::Painter, rect: Rect, hud: &DerivedHudState) {
        painter.rect_filled(rect, 4.0, PANEL_BG);
        let font = FontId::proportional(14.0);
        let left = rect.left() + 8.0;
        painter.text(
            Pos2::new(left, rect.top() + 6.0),
            Align2::LEFT_TOP,
            format!("Redshift: {}", hud.redshift_display),
            font.clone(),
            HUD_WHITE,
        );
        painter.text(
            Pos2::new(left, rect.top() + 26.0),
            Align2::LEFT_TOP,
            format!("Comoving distance: {:.0} Mpc", hud.radial_distance),
            font,
            HUD_WHITE,
        );
    }
}

/// Help text block; returns the rect it occupied so callers can hit-test taps
pub fn paint_help(painter: &egui::Painter, top_left: Pos2, lines: &[String]) -> Rect {
    let font = FontId::proportional(13.0);
    let line_height = 18.0;
    let width = 280.0;
    let rect = Rect::from_min_size(top_left, Vec2::new(width, line_height * lines.len() as f32 + 12.0));
    painter.rect_filled(rect, 4.0, PANEL_BG);
    for (i, line) in lines.iter().enumerate() {
        painter.text(
            top_left + Vec2::new(8.0, 6.0 + line_height * i as f32),
            Align2::LEFT_TOP,
            line,
            font.clone(),
            HUD_WHITE,
        );
    }
    rect
}

pub fn paint_loading(painter: &egui::Painter, screen: Rect) {
    painter.text(
        screen.center(),
        Align2::CENTER_CENTER,
        "Loading galaxies…",
        FontId::proportional(22.0),
        HUD_WHITE,
    );
}

/// Lay out and paint every visible instrument
pub fn paint_instruments(painter: &egui::Painter, screen: Rect, visibility: HudVisibility, hud: &DerivedHudState) {
    let margin = 16.0;
    let bottom = screen.bottom() - margin;

    if visibility.gauge {
        let rect = Rect::from_min_size(
            Pos2::new(screen.left() + margin, bottom - SpeedGauge::SIZE.y),
            SpeedGauge::SIZE,
        );
        SpeedGauge::paint(
            painter,
            rect,
            hud.speed_fraction,
            hud.throttle_fraction,
            &hud.speed_display,
        );
    }
    if visibility.map {
        let rect = Rect::from_min_size(
            Pos2::new(screen.left() + margin * 2.0 + SpeedGauge::SIZE.x, bottom - PositionMap::SIZE.y),
            PositionMap::SIZE,
        );
        PositionMap::paint(painter, rect, hud);
    }
    if visibility.chart {
        let rect = Rect::from_min_size(
            Pos2::new(screen.right() - margin - SkyChart::SIZE.x, bottom - SkyChart::SIZE.y),
            SkyChart::SIZE,
        );
        SkyChart::paint(painter, rect, hud);
    }
    if visibility.info {
        let rect = Rect::from_min_size(
            Pos2::new(screen.right() - margin - HudInfo::SIZE.x, screen.top() + margin),
            HudInfo::SIZE,
        );
        HudInfo::paint(painter, rect, hud);
    }
}
