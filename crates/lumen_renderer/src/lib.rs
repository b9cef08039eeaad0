//! Lumen Renderer - CPU Whitted-style ray tracing
//!
//! Intersects rays with triangles and spheres through a BVH and shades hits
//! with Blinn-Phong lighting, hard shadows and mirror reflection. Each camera
//! is rendered in parallel row bands.

mod band;
mod bvh;
mod camera;
mod primitive;
mod renderer;
mod sphere;
mod tracer;
mod triangle;
mod world;

pub use band::{generate_bands, RowBand};
pub use bvh::{Bvh, BvhNode, SplitPlacement};
pub use camera::ImagePlane;
pub use primitive::{HitRecord, Primitive, PrimitiveId};
pub use renderer::{color_to_rgb, render_band, render_camera, render_scene, RenderConfig, RenderedImage};
pub use sphere::Sphere;
pub use tracer::Tracer;
pub use triangle::Face;
pub use world::World;

/// Re-export common math types from lumen_math
pub use lumen_math::{BoundingBox, Ray, Vec3};
