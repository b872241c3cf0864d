//! Point-cloud renderer
//!
//! Perspective-projects the catalog through the camera and paints every
//! visible galaxy as a small additive glow disc into one mesh.

use eframe::egui::{self, Color32, Pos2, Rect, Vec2};

use crate::camera::CameraState;
use crate::catalog::{Catalog, Galaxy};
use crate::config::{CameraConfig, RenderConfig};

/// Sprite size bounds in pixels
const MIN_POINT_PX: f32 = 1.2;
const MAX_POINT_PX: f32 = 12.0;

/// Glow profile as fractions of the sprite radius: opaque core, then a
/// linear fade that reaches zero before the sprite edge
const DISC_CORE: f32 = 0.5;
const DISC_EDGE: f32 = 0.8;
const DISC_SEGMENTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
}

impl Projection {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            fov_y_deg: config.fov_deg,
            near: config.near,
            far: config.far,
            aspect: 1.0,
        }
    }

    /// Recompute aspect ratio after a viewport change
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width as f64 / height as f64;
        }
    }

    fn focal(&self) -> f64 {
        1.0 / (self.fov_y_deg.to_radians() / 2.0).tan()
    }

    /// Normalized device coordinates and view depth, `None` if clipped
    pub fn project(&self, camera: &CameraState, world: [f64; 3]) -> Option<([f64; 2], f64)> {
        let v = camera.to_view(world);
        let depth = -v[2];
        if depth < self.near || depth > self.far {
            return None;
        }
        let f = self.focal();
        let ndc = [f / self.aspect * v[0] / depth, f * v[1] / depth];
        if ndc[0].abs() > 1.0 || ndc[1].abs() > 1.0 {
            return None;
        }
        Some((ndc, depth))
    }
}

/// Maps NDC to a screen rectangle (y down)
pub fn ndc_to_screen(ndc: [f64; 2], viewport: Rect) -> Pos2 {
    let c = viewport.center();
    Pos2::new(
        c.x + ndc[0] as f32 * viewport.width() / 2.0,
        c.y - ndc[1] as f32 * viewport.height() / 2.0,
    )
}

/// Append one glow sprite: a core fan in `color` plus a ring fading to transparent
fn add_soft_disc(mesh: &mut egui::Mesh, center: Pos2, radius: f32, color: Color32) {
    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(center, color);
    for i in 0..DISC_SEGMENTS {
        let a = std::f32::consts::TAU * i as f32 / DISC_SEGMENTS as f32;
        let dir = Vec2::new(a.cos(), a.sin());
        mesh.colored_vertex(center + dir * radius * DISC_CORE, color);
        mesh.colored_vertex(center + dir * radius * DISC_EDGE, Color32::TRANSPARENT);
    }
    for i in 0..DISC_SEGMENTS {
        let j = (i + 1) % DISC_SEGMENTS;
        let (core_i, edge_i) = (base + 1 + 2 * i, base + 2 + 2 * i);
        let (core_j, edge_j) = (base + 1 + 2 * j, base + 2 + 2 * j);
        mesh.add_triangle(base, core_i, core_j);
        mesh.add_triangle(core_i, edge_i, edge_j);
        mesh.add_triangle(core_i, edge_j, core_j);
    }
}

pub struct PointCloudRenderer {
    points: Vec<Galaxy>,
    point_size: f32,
    pub projection: Projection,
}

impl PointCloudRenderer {
    pub fn new(camera: &CameraConfig, render: &RenderConfig) -> Self {
        Self {
            points: Vec::new(),
            point_size: render.point_size,
            projection: Projection::new(camera),
        }
    }

    /// Upload geometry; larger catalogs are subsampled to `max_points`
    pub fn set_catalog(&mut self, catalog: &Catalog, max_points: usize) {
        self.points = catalog.subsample(max_points);
        tracing::info!(
            "Point cloud ready: {} of {} galaxies",
            self.points.len(),
            catalog.len()
        );
    }

    #[cfg(test)]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Draw the cloud; `show_colors` switches between category colors and white
    pub fn paint(&self, painter: &egui::Painter, viewport: Rect, camera: &CameraState, show_colors: bool) {
        if self.points.is_empty() {
            return;
        }

        // Perspective size attenuation: world size -> pixels at unit depth
        let pixel_scale = viewport.height() as f64 * 0.5 * self.projection.focal();
        let mut mesh = egui::Mesh::default();

        for g in &self.points {
            let world = [g.position[0] as f64, g.position[1] as f64, g.position[2] as f64];
            let Some((ndc, depth)) = self.projection.project(camera, world) else {
                continue;
            };
            let size = ((self.point_size as f64 * pixel_scale / depth) as f32).clamp(MIN_POINT_PX, MAX_POINT_PX);
            // Small far points fade instead of vanishing
            let alpha = (size / 4.0).clamp(0.25, 1.0);
            let rgb = if show_colors {
                g.category.color()
            } else {
                [1.0, 1.0, 1.0]
            };
            let color = Color32::from_rgba_unmultiplied(
                (rgb[0] * 255.0) as u8,
                (rgb[1] * 255.0) as u8,
                (rgb[2] * 255.0) as u8,
                (alpha * 255.0) as u8,
            )
            .additive();

            add_soft_disc(&mut mesh, ndc_to_screen(ndc, viewport), size / 2.0, color);
        }

        painter.add(egui::Shape::mesh(mesh));
    }
}
