//! Whitted-style ray tracing with Blinn-Phong shading.
//!
//! Colors are accumulated in the 0..255 range used by the scene file; the
//! renderer clamps them when writing pixels.

use lumen_core::{DecalMode, Material, Scene};
use lumen_math::{Ray, Vec3};

use crate::{HitRecord, PrimitiveId, World};

/// Traces rays through a world, reading lights and materials from its scene.
#[derive(Clone, Copy)]
pub struct Tracer<'a> {
    scene: &'a Scene,
    world: &'a World,
}

impl<'a> Tracer<'a> {
    pub fn new(scene: &'a Scene, world: &'a World) -> Self {
        Self { scene, world }
    }

    /// Color seen along `ray`.
    ///
    /// `depth` is the number of mirror bounces still allowed. `exclude` is
    /// the primitive the ray starts on, if any.
    pub fn trace_ray(&self, ray: &Ray, depth: u32, exclude: Option<PrimitiveId>) -> Vec3 {
        match self.world.closest_hit(ray, exclude) {
            Some(hit) => self.shade(ray, &hit, depth),
            None => self.scene.background_color,
        }
    }

    fn shade(&self, ray: &Ray, hit: &HitRecord, depth: u32) -> Vec3 {
        let scene = self.scene;
        let Some(material) = scene.materials.get(hit.material_id) else {
            log::warn!("Hit references missing material {}", hit.material_id);
            return scene.background_color;
        };
        let texture = hit.texture_id.and_then(|id| scene.textures.get(id));

        let p = ray.at(hit.t);
        let n = hit.normal;
        let d = ray.direction;
        let eps = scene.shadow_ray_epsilon;

        let kd = match texture {
            Some(tex) => tex.shading_constant(hit.uv, material.diffuse),
            None => material.diffuse,
        };
        let replace_all = texture.is_some_and(|tex| tex.decal_mode == DecalMode::ReplaceAll);

        let mut color = scene.ambient_light * material.ambient;

        for light in &scene.point_lights {
            let wi = light.position - p;
            let distance = wi.length();
            if distance == 0.0 {
                continue;
            }
            let wi_dir = wi / distance;

            let shadow_ray = Ray::shadow(p + wi_dir * eps, wi_dir);
            if self.world.any_hit(&shadow_ray, distance - eps, Some(hit.primitive)) {
                continue;
            }

            if replace_all {
                color += kd;
                continue;
            }

            let irradiance = light.intensity / (distance * distance);
            color += kd * n.dot(wi_dir).max(0.0) * irradiance;
            color += specular(material, n, wi_dir, d) * irradiance;
        }

        if depth > 0 && material.is_mirror() {
            let reflected = (d - 2.0 * d.dot(n) * n).normalize();
            let mirror_ray = Ray::new(p + reflected * eps, reflected);
            color += self.trace_ray(&mirror_ray, depth - 1, Some(hit.primitive)) * material.mirror;
        }

        color
    }
}

/// Blinn-Phong specular coefficient for light direction `wi` and view ray
/// direction `d`.
fn specular(material: &Material, n: Vec3, wi: Vec3, d: Vec3) -> Vec3 {
    let h = (wi - d).normalize_or_zero();
    material.specular * n.dot(h).max(0.0).powf(material.phong_exponent)
}
