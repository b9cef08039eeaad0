//! Per-camera render driver.
//!
//! Implements Whitted-style rendering with:
//! - One primary ray per pixel through the pixel center
//! - Row bands rendered in parallel on a fixed-size rayon pool
//! - 8-bit RGB output with clamping

use std::path::Path;
use std::thread;
use std::time::Instant;

use lumen_core::{Camera, Scene};
use lumen_math::Vec3;
use rayon::prelude::*;

use crate::{generate_bands, ImagePlane, RowBand, SplitPlacement, Tracer, World};

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Worker threads; also the number of row bands
    pub threads: usize,
    /// BVH split placement
    pub split: SplitPlacement,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            threads: thread::available_parallelism().map_or(1, |n| n.get()),
            split: SplitPlacement::default(),
        }
    }
}

/// A rendered camera image: row-major RGB, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RenderedImage {
    /// Create a black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }

    /// Write the image; the format follows the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        image::save_buffer(
            path.as_ref(),
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgb8,
        )
    }
}

/// Convert a 0..255 color to 8-bit RGB, clamping and rounding half away
/// from zero.
pub fn color_to_rgb(color: Vec3) -> [u8; 3] {
    let c = color.clamp(Vec3::ZERO, Vec3::splat(255.0)).round();
    [c.x as u8, c.y as u8, c.z as u8]
}

/// Render every row of `band` into `pixels` (that band's slice of the image).
pub fn render_band(plane: &ImagePlane, tracer: &Tracer, max_depth: u32, band: RowBand, pixels: &mut [u8]) {
    for (row, line) in (band.min_row..band.max_row).zip(pixels.chunks_mut(plane.width as usize * 3)) {
        for (col, pixel) in (0..plane.width).zip(line.chunks_mut(3)) {
            let ray = plane.primary_ray(col, row);
            let color = tracer.trace_ray(&ray, max_depth, None);
            pixel.copy_from_slice(&color_to_rgb(color));
        }
    }
}

/// Render one camera of `scene` against a pre-built `world`.
pub fn render_camera(
    scene: &Scene,
    world: &World,
    camera: &Camera,
    config: &RenderConfig,
) -> Result<RenderedImage, rayon::ThreadPoolBuildError> {
    let start = Instant::now();
    let plane = ImagePlane::new(camera);
    let tracer = Tracer::new(scene, world);
    let mut image = RenderedImage::new(camera.image_width, camera.image_height);

    // A zero-width image has no pixels to split into rows.
    let bands = if camera.image_width == 0 {
        Vec::new()
    } else {
        generate_bands(camera.image_height, config.threads)
    };
    log::debug!(
        "Rendering {} ({}x{}) in {} bands",
        camera.image_name,
        camera.image_width,
        camera.image_height,
        bands.len()
    );

    if !bands.is_empty() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(bands.len())
            .build()?;

        // Split the buffer into one disjoint slice per band.
        let mut slices = Vec::with_capacity(bands.len());
        let mut rest = image.data.as_mut_slice();
        for band in &bands {
            let (head, tail) = rest.split_at_mut(band.pixel_count(camera.image_width) * 3);
            slices.push((*band, head));
            rest = tail;
        }

        pool.install(|| {
            slices.into_par_iter().for_each(|(band, pixels)| {
                render_band(&plane, &tracer, scene.max_recursion_depth, band, pixels);
            });
        });
    }

    log::info!(
        "Rendered {} ({}x{}) in {:?}",
        camera.image_name,
        camera.image_width,
        camera.image_height,
        start.elapsed()
    );

    Ok(image)
}

/// Build the world for `scene` and render each of its cameras in order.
pub fn render_scene(
    scene: &Scene,
    config: &RenderConfig,
) -> Result<Vec<RenderedImage>, rayon::ThreadPoolBuildError> {
    let world = World::from_scene(scene, config.split);
    scene
        .cameras
        .iter()
        .map(|camera| render_camera(scene, &world, camera, config))
        .collect()
}
