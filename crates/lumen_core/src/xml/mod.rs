//! XML scene file support for Lumen.
//!
//! ## Supported elements
//!
//! - Scene settings: `BackgroundColor`, `ShadowRayEpsilon`, `MaxRecursionDepth`
//! - `Cameras`, `Lights` (ambient and point lights), `Materials`, `Textures`
//! - `Transformations`: `Scaling`, `Translation`, `Rotation` (degrees)
//! - `VertexData`, `TexCoordData`
//! - `Objects`: `Mesh`, `MeshInstance`, `Triangle`, `Sphere`
//!
//! Faces stored in external PLY files are not supported.
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::xml::load_scene;
//!
//! let scene = load_scene("path/to/scene.xml")?;
//! println!("Loaded {} meshes, {} spheres", scene.meshes.len(), scene.spheres.len());
//! ```

mod loader;
mod parser;

pub use loader::*;
pub use parser::{ParseError, ParseResult};
