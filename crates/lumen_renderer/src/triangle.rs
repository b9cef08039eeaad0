//! Triangle primitive for ray tracing.
//!
//! Intersection solves the barycentric system with Cramer's rule. Front faces
//! are those whose normal `(v0 - v1) x (v0 - v2)` points toward the viewer;
//! camera and reflection rays ignore back faces, shadow rays see both sides.

use lumen_math::{BoundingBox, Ray, Vec2, Vec3, EPSILON};

use crate::{HitRecord, PrimitiveId};

/// A world-space triangle with per-vertex texture coordinates.
#[derive(Debug, Clone)]
pub struct Face {
    /// Vertices
    vertices: [Vec3; 3],
    /// Texture coordinates of each vertex
    uvs: [Vec2; 3],
    material_id: usize,
    texture_id: Option<usize>,
    /// Pre-computed face normal (unit length, zero for degenerate faces)
    normal: Vec3,
    /// Edge vectors v0 - v1 and v0 - v2
    ba: Vec3,
    ca: Vec3,
    /// Bounding box
    bbox: BoundingBox,
}

/// Determinant of the 3x3 matrix with columns `a`, `b`, `c`.
#[inline]
fn det(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    a.dot(b.cross(c))
}

impl Face {
    /// Create a new triangle from three world-space vertices.
    pub fn new(
        vertices: [Vec3; 3],
        uvs: [Vec2; 3],
        material_id: usize,
        texture_id: Option<usize>,
    ) -> Self {
        let [v0, v1, v2] = vertices;
        let ba = v0 - v1;
        let ca = v0 - v2;
        let normal = ba.cross(ca).normalize_or_zero();

        let mut bbox = BoundingBox::from_points(v0, v1);
        bbox.expand_point(v2);

        Self {
            vertices,
            uvs,
            material_id,
            texture_id,
            normal,
            ba,
            ca,
            bbox,
        }
    }

    pub fn vertices(&self) -> [Vec3; 3] {
        self.vertices
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }

    /// Ray-triangle intersection.
    ///
    /// Barycentric bounds are relaxed by `EPSILON` so that rays through a
    /// shared edge hit at least one of the adjacent faces.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let d = ray.direction;
        if !ray.is_shadow && d.dot(self.normal) > 0.0 {
            return None;
        }

        let det_a = det(self.ba, self.ca, d);
        if det_a == 0.0 || !det_a.is_finite() {
            return None;
        }

        let oa = (self.vertices[0] - ray.origin) / det_a;
        let beta = det(oa, self.ca, d);
        if beta < -EPSILON {
            return None;
        }
        let gamma = det(self.ba, oa, d);
        if gamma < -EPSILON || beta + gamma > 1.0 + EPSILON {
            return None;
        }

        let t = det(self.ba, self.ca, oa);
        if t.is_nan() || t <= -EPSILON {
            return None;
        }

        let [ua, ub, uc] = self.uvs;
        Some(HitRecord {
            material_id: self.material_id,
            texture_id: self.texture_id,
            t,
            normal: self.normal,
            uv: ua + beta * (ub - ua) + gamma * (uc - ua),
            primitive: PrimitiveId(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counter-clockwise seen from +Z, so the normal is +Z.
    fn facing_z() -> Face {
        Face::new(
            [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)],
            3,
            Some(1),
        )
    }

    #[test]
    fn test_normal_and_bbox() {
        let face = facing_z();
        assert_eq!(face.normal(), Vec3::Z);

        let bbox = face.bounding_box();
        assert_eq!(bbox.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_front_face_hit() {
        let face = facing_z();
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let hit = face.intersect(&ray).unwrap();

        assert!((hit.t - 5.0).abs() < 1e-5);
        assert_eq!(hit.normal, Vec3::Z);
        assert_eq!(hit.material_id, 3);
        assert_eq!(hit.texture_id, Some(1));
    }

    #[test]
    fn test_back_face_culled_for_camera_rays() {
        let face = facing_z();
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(face.intersect(&ray).is_none());
    }

    #[test]
    fn test_back_face_visible_to_shadow_rays() {
        let face = facing_z();
        let ray = Ray::shadow(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let hit = face.intersect(&ray).unwrap();
        assert!((hit.t - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss_outside() {
        let face = facing_z();
        let ray = Ray::new(Vec3::new(2.0, 2.0, 5.0), -Vec3::Z);
        assert!(face.intersect(&ray).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let face = facing_z();
        let ray = Ray::shadow(Vec3::new(-5.0, 0.0, 0.0), Vec3::X);
        assert!(face.intersect(&ray).is_none());
    }

    #[test]
    fn test_behind_origin_misses() {
        let face = facing_z();
        let ray = Ray::shadow(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(face.intersect(&ray).is_none());
    }

    #[test]
    fn test_edge_hit_within_tolerance() {
        let face = facing_z();
        // Exactly on the v0-v1 edge.
        let ray = Ray::new(Vec3::new(0.0, -1.0, 1.0), -Vec3::Z);
        assert!(face.intersect(&ray).is_some());
    }

    #[test]
    fn test_uv_interpolation() {
        let face = facing_z();

        let at_v1 = face.intersect(&Ray::new(Vec3::new(1.0, -1.0, 1.0), -Vec3::Z)).unwrap();
        assert!((at_v1.uv - Vec2::new(1.0, 0.0)).length() < 1e-5);

        // Midpoint of v0 and v2.
        let mid = face.intersect(&Ray::new(Vec3::new(-0.5, 0.0, 1.0), -Vec3::Z)).unwrap();
        assert!((mid.uv - Vec2::new(0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_degenerate_face_never_hits() {
        let face = Face::new([Vec3::ZERO, Vec3::X, Vec3::X * 2.0], [Vec2::ZERO; 3], 0, None);
        assert_eq!(face.normal(), Vec3::ZERO);
        let ray = Ray::shadow(Vec3::new(0.5, 0.0, 1.0), -Vec3::Z);
        assert!(face.intersect(&ray).is_none());
    }
}
