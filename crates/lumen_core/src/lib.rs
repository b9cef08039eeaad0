//! Lumen Core - scene description and loading for the Lumen ray tracer.
//!
//! This crate provides:
//!
//! - **Scene types**: `Scene`, `Camera`, `Material`, `PointLight`, `Mesh`,
//!   `MeshInstance`, `Triangle`, `Sphere`, `Transformation`
//! - **Textures**: image decoding, caching and sampling
//! - **XML support**: scene file parsing and validation
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::load_scene;
//!
//! let scene = load_scene("scene.xml")?;
//! println!("Loaded {} cameras, {} primitives",
//!     scene.cameras.len(),
//!     scene.primitive_count());
//! ```

pub mod mesh;
pub mod scene;
pub mod texture;
pub mod xml;

// Re-export commonly used types
pub use mesh::{Mesh, MeshInstance};
pub use scene::{Camera, Material, PointLight, Scene, Sphere, Transformation, Triangle};
pub use texture::{Appearance, DecalMode, Interpolation, Texture, TextureCache, TextureImage};
pub use xml::{load_scene, load_scene_from_str, LoadError};
