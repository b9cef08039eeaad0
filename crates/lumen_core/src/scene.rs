//! Scene description types for Lumen.
//!
//! A `Scene` is the immutable, renderer-agnostic result of loading a scene
//! file. All ids stored here are 0-based indices into the scene's own
//! vectors and have been validated by the loader.

use lumen_math::{Mat4, Vec2, Vec3, Vec4};

use crate::mesh::{Mesh, MeshInstance};
use crate::texture::Texture;

/// A pinhole camera with an explicit image plane.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Vec3,

    /// Viewing direction (not necessarily normalized)
    pub gaze: Vec3,

    pub up: Vec3,

    /// Image plane extents as (left, right, bottom, top)
    pub near_plane: Vec4,

    /// Distance from the position to the image plane along the gaze
    pub near_distance: f32,

    pub image_width: u32,
    pub image_height: u32,

    /// Output file name for this camera's image
    pub image_name: String,
}

impl Camera {
    pub fn left(&self) -> f32 {
        self.near_plane.x
    }

    pub fn right(&self) -> f32 {
        self.near_plane.y
    }

    pub fn bottom(&self) -> f32 {
        self.near_plane.z
    }

    pub fn top(&self) -> f32 {
        self.near_plane.w
    }
}

/// An isotropic point light. Intensity falls off with the squared distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: Vec3,
}

/// Phong material coefficients.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,

    /// Mirror reflectance; zero disables reflection rays
    pub mirror: Vec3,

    pub phong_exponent: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: Vec3::ZERO,
            diffuse: Vec3::splat(0.5),
            specular: Vec3::ZERO,
            mirror: Vec3::ZERO,
            phong_exponent: 1.0,
        }
    }
}

impl Material {
    pub fn is_mirror(&self) -> bool {
        self.mirror != Vec3::ZERO
    }
}

/// One entry of the scene's transformation library.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Transformation {
    Scaling(Vec3),
    Translation(Vec3),
    /// Right-handed rotation about `axis` by `angle_degrees`
    Rotation { angle_degrees: f32, axis: Vec3 },
}

impl Transformation {
    pub fn to_matrix(&self) -> Mat4 {
        match *self {
            Transformation::Scaling(s) => Mat4::from_scale(s),
            Transformation::Translation(t) => Mat4::from_translation(t),
            Transformation::Rotation {
                angle_degrees,
                axis,
            } => Mat4::from_axis_angle(axis.normalize(), angle_degrees.to_radians()),
        }
    }

    /// Compose a sequence of transformations. Each one is applied after the
    /// previous, so the first listed transformation acts on the object first.
    pub fn compose<'a>(transforms: impl IntoIterator<Item = &'a Transformation>) -> Mat4 {
        transforms
            .into_iter()
            .fold(Mat4::IDENTITY, |acc, t| t.to_matrix() * acc)
    }
}

/// A single triangle referencing three entries of `Scene::vertex_data`.
#[derive(Clone, Debug)]
pub struct Triangle {
    pub material_id: usize,
    pub texture_id: Option<usize>,
    pub indices: [usize; 3],
    pub transform: Mat4,
}

/// A sphere whose center is an entry of `Scene::vertex_data`.
///
/// `transform` is applied to the sphere as a whole, so non-uniform scaling
/// produces an ellipsoid.
#[derive(Clone, Debug)]
pub struct Sphere {
    pub material_id: usize,
    pub texture_id: Option<usize>,
    pub center: usize,
    pub radius: f32,
    pub transform: Mat4,
}

/// A complete loaded scene.
#[derive(Clone, Debug)]
pub struct Scene {
    pub background_color: Vec3,
    pub shadow_ray_epsilon: f32,
    pub max_recursion_depth: u32,
    pub cameras: Vec<Camera>,
    pub ambient_light: Vec3,
    pub point_lights: Vec<PointLight>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    pub vertex_data: Vec<Vec3>,

    /// Per-vertex texture coordinates, indexed like `vertex_data`
    pub tex_coord_data: Vec<Vec2>,

    pub meshes: Vec<Mesh>,
    pub mesh_instances: Vec<MeshInstance>,
    pub triangles: Vec<Triangle>,
    pub spheres: Vec<Sphere>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background_color: Vec3::ZERO,
            shadow_ray_epsilon: 1e-3,
            max_recursion_depth: 0,
            cameras: Vec::new(),
            ambient_light: Vec3::ZERO,
            point_lights: Vec::new(),
            materials: Vec::new(),
            textures: Vec::new(),
            vertex_data: Vec::new(),
            tex_coord_data: Vec::new(),
            meshes: Vec::new(),
            mesh_instances: Vec::new(),
            triangles: Vec::new(),
            spheres: Vec::new(),
        }
    }
}

impl Scene {
    /// Texture coordinate of a vertex; vertices without one map to (0, 0).
    pub fn tex_coord(&self, vertex: usize) -> Vec2 {
        self.tex_coord_data.get(vertex).copied().unwrap_or(Vec2::ZERO)
    }

    /// Total number of triangles once meshes and instances are expanded.
    pub fn total_triangle_count(&self) -> usize {
        let instanced: usize = self
            .mesh_instances
            .iter()
            .filter_map(|inst| self.meshes.get(inst.base_mesh_id))
            .map(Mesh::triangle_count)
            .sum();
        let meshes: usize = self.meshes.iter().map(Mesh::triangle_count).sum();
        meshes + instanced + self.triangles.len()
    }

    /// Total number of primitives the renderer will build from this scene.
    pub fn primitive_count(&self) -> usize {
        self.total_triangle_count() + self.spheres.len()
    }
}
