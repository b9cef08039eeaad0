//! Indexed triangle meshes and their instances.
//!
//! Faces index into the scene-wide `vertex_data` array rather than owning
//! their positions, so a mesh and all of its instances share one vertex pool.

use lumen_math::Mat4;

/// A triangle mesh with a shared material and optional texture.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub material_id: usize,
    pub texture_id: Option<usize>,

    /// Vertex indices of each face (0-based into `Scene::vertex_data`)
    pub faces: Vec<[usize; 3]>,

    /// Object-to-world transform applied to every face
    pub transform: Mat4,
}

impl Mesh {
    pub fn new(
        material_id: usize,
        texture_id: Option<usize>,
        faces: Vec<[usize; 3]>,
        transform: Mat4,
    ) -> Self {
        Self {
            material_id,
            texture_id,
            faces,
            transform,
        }
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }
}

/// A placed copy of a base mesh.
///
/// The instance's transform is applied on top of the base mesh's own
/// transform, and its material/texture replace the base mesh's.
#[derive(Clone, Debug)]
pub struct MeshInstance {
    pub base_mesh_id: usize,
    pub material_id: usize,
    pub texture_id: Option<usize>,
    pub transform: Mat4,
}

impl MeshInstance {
    pub fn new(
        base_mesh_id: usize,
        material_id: usize,
        texture_id: Option<usize>,
        transform: Mat4,
    ) -> Self {
        Self {
            base_mesh_id,
            material_id,
            texture_id,
            transform,
        }
    }

    /// Full object-to-world matrix for faces of `base`.
    pub fn model_matrix(&self, base: &Mesh) -> Mat4 {
        self.transform * base.transform
    }
}
