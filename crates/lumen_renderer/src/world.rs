//! Flattened renderable geometry for a scene.
//!
//! Meshes, mesh instances and loose triangles are baked to world-space
//! faces; spheres keep their object transform. The BVH is built once over
//! the resulting primitive array.

use std::time::Instant;

use lumen_core::Scene;
use lumen_math::{Mat4, Ray, Vec2, Vec3};

use crate::{Bvh, Face, HitRecord, Primitive, PrimitiveId, SplitPlacement, Sphere};

/// All primitives of a scene plus the BVH built over them.
///
/// Read-only once built; shared by reference across render workers.
#[derive(Debug, Default)]
pub struct World {
    primitives: Vec<Primitive>,
    bvh: Bvh,
}

impl World {
    /// Build a world from an explicit primitive list.
    pub fn new(primitives: Vec<Primitive>, split: SplitPlacement) -> Self {
        let bvh = Bvh::build(&primitives, split);
        Self { primitives, bvh }
    }

    /// Flatten a loaded scene and build its BVH.
    pub fn from_scene(scene: &Scene, split: SplitPlacement) -> Self {
        let start = Instant::now();
        let mut primitives = Vec::with_capacity(scene.primitive_count());

        for mesh in &scene.meshes {
            push_faces(
                &mut primitives,
                scene,
                &mesh.faces,
                mesh.transform,
                mesh.material_id,
                mesh.texture_id,
            );
        }

        for instance in &scene.mesh_instances {
            let Some(base) = scene.meshes.get(instance.base_mesh_id) else {
                log::warn!("Mesh instance references missing mesh {}", instance.base_mesh_id);
                continue;
            };
            push_faces(
                &mut primitives,
                scene,
                &base.faces,
                instance.model_matrix(base),
                instance.material_id,
                instance.texture_id,
            );
        }

        for triangle in &scene.triangles {
            push_faces(
                &mut primitives,
                scene,
                std::slice::from_ref(&triangle.indices),
                triangle.transform,
                triangle.material_id,
                triangle.texture_id,
            );
        }

        for sphere in &scene.spheres {
            let Some(&center) = scene.vertex_data.get(sphere.center) else {
                log::warn!("Sphere center references missing vertex {}", sphere.center);
                continue;
            };
            let det = sphere.transform.determinant();
            if det == 0.0 || !det.is_finite() {
                log::warn!("Skipping sphere with singular transform (center vertex {})", sphere.center);
                continue;
            }
            primitives.push(
                Sphere::with_transform(
                    center,
                    sphere.radius,
                    sphere.material_id,
                    sphere.texture_id,
                    sphere.transform,
                )
                .into(),
            );
        }

        let flatten_time = start.elapsed();
        let start = Instant::now();
        let world = Self::new(primitives, split);

        log::info!(
            "Built world: {} primitives (flatten {:?}, BVH {:?}, {} nodes, depth {})",
            world.primitives.len(),
            flatten_time,
            start.elapsed(),
            world.bvh.node_count(),
            world.bvh.depth()
        );

        world
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Nearest hit in front of the ray origin, skipping `exclude`.
    pub fn closest_hit(&self, ray: &Ray, exclude: Option<PrimitiveId>) -> Option<HitRecord> {
        self.bvh.closest_hit(&self.primitives, ray, exclude)
    }

    /// Whether anything other than `exclude` blocks the ray before `tmax`.
    pub fn any_hit(&self, ray: &Ray, tmax: f32, exclude: Option<PrimitiveId>) -> bool {
        self.bvh.any_hit(&self.primitives, ray, tmax, exclude)
    }
}

/// Bake indexed faces to world space and append them as primitives.
fn push_faces(
    primitives: &mut Vec<Primitive>,
    scene: &Scene,
    faces: &[[usize; 3]],
    transform: Mat4,
    material_id: usize,
    texture_id: Option<usize>,
) {
    for &indices in faces {
        let vertices: Option<Vec<Vec3>> = indices
            .iter()
            .map(|&i| scene.vertex_data.get(i).copied())
            .collect();
        let Some(vertices) = vertices else {
            log::warn!(
                "Skipping face {:?}: vertex count is {}",
                indices,
                scene.vertex_data.len()
            );
            continue;
        };

        let world = [
            transform.transform_point3(vertices[0]),
            transform.transform_point3(vertices[1]),
            transform.transform_point3(vertices[2]),
        ];
        let uvs: [Vec2; 3] = indices.map(|i| scene.tex_coord(i));

        primitives.push(Face::new(world, uvs, material_id, texture_id).into());
    }
}
