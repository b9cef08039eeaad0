use crate::Vec3;

/// A ray in 3D space.
///
/// `is_shadow` marks rays cast toward a light. Shadow rays are tested against
/// both faces of a triangle so that single-sided geometry still occludes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub is_shadow: bool,
}

impl Ray {
    /// Create a new camera or reflection ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            is_shadow: false,
        }
    }

    /// Create a shadow ray.
    pub fn shadow(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction,
            is_shadow: true,
        }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}
