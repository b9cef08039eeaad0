//! Sphere primitive for ray tracing.
//!
//! A sphere may carry an object transform. Rays are carried into object
//! space without renormalizing the direction, so the parameter `t` of a hit
//! is the same in both spaces.

use std::f32::consts::PI;

use lumen_math::{BoundingBox, Mat3, Mat4, Mat4Ext, Ray, Vec2, Vec3, EPSILON};

use crate::{HitRecord, PrimitiveId};

/// World-to-object data for a transformed sphere.
#[derive(Debug, Clone, Copy)]
struct ObjectTransform {
    inverse: Mat4,
    normal_matrix: Mat3,
}

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material_id: usize,
    texture_id: Option<usize>,
    transform: Option<ObjectTransform>,
    bbox: BoundingBox,
}

impl Sphere {
    /// Create a new untransformed sphere.
    pub fn new(center: Vec3, radius: f32, material_id: usize, texture_id: Option<usize>) -> Self {
        let radius = radius.max(0.0);
        let rvec = Vec3::splat(radius);
        let bbox = BoundingBox::new(center - rvec, center + rvec);

        Self {
            center,
            radius,
            material_id,
            texture_id,
            transform: None,
            bbox,
        }
    }

    /// Create a sphere placed in the world by `transform`.
    ///
    /// The caller guarantees `transform` is invertible.
    pub fn with_transform(
        center: Vec3,
        radius: f32,
        material_id: usize,
        texture_id: Option<usize>,
        transform: Mat4,
    ) -> Self {
        let mut sphere = Self::new(center, radius, material_id, texture_id);
        if transform != Mat4::IDENTITY {
            sphere.bbox = transform.transform_box(&sphere.bbox);
            sphere.transform = Some(ObjectTransform {
                inverse: transform.inverse(),
                normal_matrix: transform.normal_matrix(),
            });
        }
        sphere
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Texture coordinates for a unit object-space normal.
    fn sphere_uv(n: Vec3) -> Vec2 {
        let u = (PI - n.z.atan2(n.x)) / (2.0 * PI);
        let v = n.y.clamp(-1.0, 1.0).acos() / PI;
        Vec2::new(u, v)
    }

    /// Ray-sphere intersection.
    ///
    /// Returns the nearest root in front of the origin, or the far root when
    /// the near one is behind it.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let (origin, direction) = match &self.transform {
            Some(xf) => (
                xf.inverse.transform_point3(ray.origin),
                xf.inverse.transform_vector3(ray.direction),
            ),
            None => (ray.origin, ray.direction),
        };

        let oc = origin - self.center;
        let a = direction.length_squared();
        if a == 0.0 {
            return None;
        }
        let b = direction.dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = b * b - a * c;
        if discriminant < -EPSILON {
            return None;
        }

        let sqrtd = discriminant.max(0.0).sqrt();
        let near = (-b - sqrtd) / a;
        let t = if near < 0.0 { (-b + sqrtd) / a } else { near };

        let local_normal = (origin + direction * t - self.center).normalize_or_zero();
        let normal = match &self.transform {
            Some(xf) => (xf.normal_matrix * local_normal).normalize_or_zero(),
            None => local_normal,
        };

        Some(HitRecord {
            material_id: self.material_id,
            texture_id: self.texture_id,
            t,
            normal,
            uv: Self::sphere_uv(local_normal),
            primitive: PrimitiveId(0),
        })
    }
}
