//! Camera pose - the single source of truth for navigation
//!
//! Position in scene units, orientation as a unit quaternion.
//! The camera looks down its local -Z axis with +Y up.

/// 3D vector [x, y, z]
pub type Vec3 = [f64; 3];

/// Quaternion as [w, x, y, z]
pub type Quat = [f64; 4];

pub const IDENTITY: Quat = [1.0, 0.0, 0.0, 0.0];

/// Local direction the camera looks along
const LOCAL_FORWARD: Vec3 = [0.0, 0.0, -1.0];
const LOCAL_UP: Vec3 = [0.0, 1.0, 0.0];

/// Create quaternion from axis-angle
pub fn q_from_axis_angle(axis: Vec3, angle: f64) -> Quat {
    let half = angle / 2.0;
    let s = half.sin();
    [half.cos(), axis[0] * s, axis[1] * s, axis[2] * s]
}

/// Multiply two quaternions
pub fn q_mul(a: Quat, b: Quat) -> Quat {
    [
        a[0] * b[0] - a[1] * b[1] - a[2] * b[2] - a[3] * b[3],
        a[0] * b[1] + a[1] * b[0] + a[2] * b[3] - a[3] * b[2],
        a[0] * b[2] - a[1] * b[3] + a[2] * b[0] + a[3] * b[1],
        a[0] * b[3] + a[1] * b[2] - a[2] * b[1] + a[3] * b[0],
    ]
}

pub fn q_conjugate(q: Quat) -> Quat {
    [q[0], -q[1], -q[2], -q[3]]
}

pub fn q_normalize(q: Quat) -> Quat {
    let n = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if n < 1e-12 {
        return IDENTITY;
    }
    [q[0] / n, q[1] / n, q[2] / n, q[3] / n]
}

/// Rotate vector by quaternion
pub fn q_rotate_vec(q: Quat, v: Vec3) -> Vec3 {
    let qv: Quat = [0.0, v[0], v[1], v[2]];
    let r = q_mul(q_mul(q, qv), q_conjugate(q));
    [r[1], r[2], r[3]]
}

/// Quaternion from an orthonormal basis given as matrix columns
fn q_from_basis(x: Vec3, y: Vec3, z: Vec3) -> Quat {
    let (m00, m11, m22) = (x[0], y[1], z[2]);
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        [0.25 / s, (y[2] - z[1]) * s, (z[0] - x[2]) * s, (x[1] - y[0]) * s]
    } else if m00 > m11 && m00 > m22 {
        let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
        [(y[2] - z[1]) / s, 0.25 * s, (y[0] + x[1]) / s, (z[0] + x[2]) / s]
    } else if m11 > m22 {
        let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
        [(z[0] - x[2]) / s, (y[0] + x[1]) / s, 0.25 * s, (z[1] + y[2]) / s]
    } else {
        let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
        [(x[1] - y[0]) / s, (z[0] + x[2]) / s, (z[1] + y[2]) / s, 0.25 * s]
    };
    q_normalize(q)
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(v: Vec3, s: f64) -> Vec3 {
    [v[0] * s, v[1] * s, v[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Unit vector, or `None` when `v` is too short to normalize
pub fn normalize(v: Vec3) -> Option<Vec3> {
    let n = length(v);
    if n < 1e-12 || !n.is_finite() {
        None
    } else {
        Some(scale(v, 1.0 / n))
    }
}

/// Quaternion orienting the camera at `eye` to look at `target`
pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Quat {
    let Some(back) = normalize(sub(eye, target)) else {
        return IDENTITY;
    };

    // Looking straight along `up`: fall back to another reference axis
    let right = normalize(cross(up, back))
        .or_else(|| normalize(cross([0.0, 0.0, 1.0], back)))
        .unwrap_or([1.0, 0.0, 0.0]);
    let true_up = cross(back, right);

    q_from_basis(right, true_up, back)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            orientation: IDENTITY,
        }
    }
}

impl CameraState {
    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation: q_normalize(orientation),
        }
    }

    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            orientation: look_at(position, target, LOCAL_UP),
        }
    }

    /// Camera looking along -Z after applying yaw (about +Y) then pitch (about local +X), degrees
    pub fn from_yaw_pitch(position: Vec3, yaw_deg: f64, pitch_deg: f64) -> Self {
        let yaw = q_from_axis_angle([0.0, 1.0, 0.0], yaw_deg.to_radians());
        let pitch = q_from_axis_angle([1.0, 0.0, 0.0], pitch_deg.to_radians());
        Self::new(position, q_mul(yaw, pitch))
    }

    /// Unit view direction in world space
    pub fn forward(&self) -> Vec3 {
        normalize(q_rotate_vec(self.orientation, LOCAL_FORWARD)).unwrap_or(LOCAL_FORWARD)
    }

    /// Transform a world point into camera space
    pub fn to_view(&self, world: Vec3) -> Vec3 {
        q_rotate_vec(q_conjugate(self.orientation), sub(world, self.position))
    }

    /// Distance from the scene origin
    pub fn radius(&self) -> f64 {
        length(self.position)
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().all(|v| v.is_finite()) && self.orientation.iter().all(|v| v.is_finite())
    }
}
