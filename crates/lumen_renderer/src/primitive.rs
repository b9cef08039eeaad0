//! Renderable primitives and the hit record they produce.

use lumen_math::{BoundingBox, Ray, Vec2, Vec3};

use crate::{Face, Sphere};

/// Index of a primitive in `World::primitives`.
///
/// Used to keep shadow and reflection rays from re-hitting the surface they
/// start on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub usize);

/// Record of a ray-primitive intersection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Material index into `Scene::materials`
    pub material_id: usize,
    /// Texture index into `Scene::textures`
    pub texture_id: Option<usize>,
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Unit surface normal (geometric, not flipped toward the ray)
    pub normal: Vec3,
    /// Texture coordinates at the hit point
    pub uv: Vec2,
    /// The primitive that was hit
    pub primitive: PrimitiveId,
}

/// Geometry the BVH can hold.
#[derive(Debug, Clone)]
pub enum Primitive {
    Triangle(Face),
    Sphere(Sphere),
}

impl Primitive {
    /// Intersect the ray with this primitive.
    ///
    /// The returned `t` is not range-checked; callers filter hits behind the
    /// origin. `primitive` in the record is left at `PrimitiveId(0)` and is
    /// filled in by the BVH, which knows the primitive's index.
    pub fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        match self {
            Primitive::Triangle(face) => face.intersect(ray),
            Primitive::Sphere(sphere) => sphere.intersect(ray),
        }
    }

    /// World-space bounding box, computed once at construction.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Primitive::Triangle(face) => face.bounding_box(),
            Primitive::Sphere(sphere) => sphere.bounding_box(),
        }
    }
}

impl From<Face> for Primitive {
    fn from(face: Face) -> Self {
        Primitive::Triangle(face)
    }
}

impl From<Sphere> for Primitive {
    fn from(sphere: Sphere) -> Self {
        Primitive::Sphere(sphere)
    }
}
