// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod ray;
mod transform;

pub use aabb::BoundingBox;
pub use ray::Ray;
pub use transform::Mat4Ext;

/// Tolerance used by intersection routines to absorb floating-point error.
pub const EPSILON: f32 = 1e-6;

/// Component of `v` along axis `n` (0=X, 1=Y, 2=Z).
#[inline]
pub fn axis(v: Vec3, n: usize) -> f32 {
    match n {
        0 => v.x,
        1 => v.y,
        _ => v.z,
    }
}
