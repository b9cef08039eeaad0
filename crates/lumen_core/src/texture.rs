//! Texture loading, caching and sampling.
//!
//! Image files are decoded once by the `TextureCache` and shared between all
//! scene textures that reference them. Samples are returned in the 0..255
//! range the shader works in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lumen_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture {0} has no pixels")]
    Empty(PathBuf),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Pixel lookup mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// How a texture sample combines with the material's diffuse coefficient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DecalMode {
    /// Sample (scaled to 0..1) replaces the diffuse coefficient
    ReplaceKd,
    /// Average of the scaled sample and the diffuse coefficient
    BlendKd,
    /// Raw sample is the surface color; lighting only gates it
    #[default]
    ReplaceAll,
}

/// Wrapping of texture coordinates outside [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Appearance {
    Repeat,
    #[default]
    Clamp,
}

impl Interpolation {
    /// Parse a scene file keyword. Anything other than `nearest` is bilinear.
    pub fn from_keyword(s: &str) -> Self {
        if s.trim() == "nearest" {
            Interpolation::Nearest
        } else {
            Interpolation::Bilinear
        }
    }
}

impl DecalMode {
    /// Parse a scene file keyword. Unknown keywords fall back to replace-all.
    pub fn from_keyword(s: &str) -> Self {
        match s.trim() {
            "replace_kd" => DecalMode::ReplaceKd,
            "blend_kd" => DecalMode::BlendKd,
            _ => DecalMode::ReplaceAll,
        }
    }
}

impl Appearance {
    /// Parse a scene file keyword. Anything other than `repeat` clamps.
    pub fn from_keyword(s: &str) -> Self {
        if s.trim() == "repeat" {
            Appearance::Repeat
        } else {
            Appearance::Clamp
        }
    }
}

/// Decoded RGB pixels of one image file.
#[derive(Clone, Debug)]
pub struct TextureImage {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Row-major RGB pixels; row 0 is the top of the image
    pub pixels: Vec<[u8; 3]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>, path: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            path: path.into(),
        }
    }

    /// Get pixel at integer coordinates as a 0..255 color.
    fn get_pixel(&self, x: u32, y: u32) -> Vec3 {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32))
            .unwrap_or(Vec3::ZERO)
    }

    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * 3
    }
}

/// A scene texture: shared image data plus sampling parameters.
#[derive(Clone, Debug)]
pub struct Texture {
    pub image: Arc<TextureImage>,
    pub interpolation: Interpolation,
    pub decal_mode: DecalMode,
    pub appearance: Appearance,
}

impl Texture {
    pub fn new(
        image: Arc<TextureImage>,
        interpolation: Interpolation,
        decal_mode: DecalMode,
        appearance: Appearance,
    ) -> Self {
        Self {
            image,
            interpolation,
            decal_mode,
            appearance,
        }
    }

    /// Sample the texture at `uv`, returning a color in 0..255.
    ///
    /// `v = 0` is the top row of the image.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let (u, v) = match self.appearance {
            Appearance::Clamp => (uv.x.clamp(0.0, 1.0), uv.y.clamp(0.0, 1.0)),
            Appearance::Repeat => (uv.x - uv.x.floor(), uv.y - uv.y.floor()),
        };

        let width = self.image.width as f32;
        let height = self.image.height as f32;

        // Step back one pixel when the coordinate lands on the far edge.
        let mut x = u * width;
        if x >= width {
            x -= 1.0;
        }
        let mut y = v * height;
        if y >= height {
            y -= 1.0;
        }
        let (x, y) = (x.max(0.0), y.max(0.0));

        match self.interpolation {
            Interpolation::Nearest => self.image.get_pixel(x as u32, y as u32),
            Interpolation::Bilinear => {
                let p = x.floor() as u32;
                let q = y.floor() as u32;
                let dx = x - p as f32;
                let dy = y - q as f32;

                self.image.get_pixel(p, q) * (1.0 - dx) * (1.0 - dy)
                    + self.image.get_pixel(p + 1, q) * dx * (1.0 - dy)
                    + self.image.get_pixel(p + 1, q + 1) * dx * dy
                    + self.image.get_pixel(p, q + 1) * (1.0 - dx) * dy
            }
        }
    }

    /// The color the shader uses in place of the diffuse coefficient `kd`.
    pub fn shading_constant(&self, uv: Vec2, kd: Vec3) -> Vec3 {
        let sample = self.sample(uv);
        match self.decal_mode {
            DecalMode::ReplaceKd => sample / 255.0,
            DecalMode::BlendKd => (sample / 255.0 + kd) / 2.0,
            DecalMode::ReplaceAll => sample,
        }
    }
}

/// Cache for decoded texture images.
///
/// Images are loaded on-demand and cached by their path as written in the
/// scene file.
pub struct TextureCache {
    /// Cached images by file path
    images: HashMap<String, Arc<TextureImage>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl TextureCache {
    /// Create a new empty texture cache.
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a texture cache with a base directory for relative paths.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using cache if available.
    pub fn load(&mut self, path: &str) -> TextureResult<Arc<TextureImage>> {
        if let Some(image) = self.images.get(path) {
            return Ok(image.clone());
        }

        let full_path = self.resolve_path(path);
        let image = Arc::new(load_texture_file(&full_path)?);
        self.images.insert(path.to_string(), image.clone());

        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            path,
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        Ok(image)
    }

    /// Number of distinct image files decoded so far.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Resolve a path relative to the base directory.
    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for TextureCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Load an image file as 8-bit RGB.
fn load_texture_file(path: &Path) -> TextureResult<TextureImage> {
    let img = image::open(path).map_err(|source| TextureError::Load {
        path: path.to_path_buf(),
        source,
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty(path.to_path_buf()));
    }

    let pixels = rgb.pixels().map(|p| p.0).collect();

    Ok(TextureImage::new(
        width,
        height,
        pixels,
        path.to_string_lossy().to_string(),
    ))
}
