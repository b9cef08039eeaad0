//! Lumen command line renderer.
//!
//! Loads an XML scene, renders every camera and writes each image next to
//! the others in the output directory under the camera's image name.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use lumen_renderer::{render_camera, RenderConfig, SplitPlacement, World};

/// BVH split plane placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Split {
    /// Center of the node's bounding box
    Center,
    /// Half the node's extent, measured from the axis origin
    Verbatim,
}

impl From<Split> for SplitPlacement {
    fn from(split: Split) -> Self {
        match split {
            Split::Center => SplitPlacement::Center,
            Split::Verbatim => SplitPlacement::Verbatim,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lumen", version, about = "Render an XML scene with a Whitted ray tracer")]
struct Args {
    /// Scene file to render
    scene: PathBuf,

    /// Worker threads (defaults to available parallelism)
    #[arg(short = 't', long = "threads")]
    threads: Option<usize>,

    /// Directory the camera images are written to
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    output_dir: PathBuf,

    /// BVH split placement
    #[arg(long = "split", value_enum, default_value_t = Split::Center)]
    split: Split,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        let defaults = RenderConfig::default();
        RenderConfig {
            threads: self.threads.unwrap_or(defaults.threads).max(1),
            split: self.split.into(),
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.render_config();

    let start = Instant::now();
    let scene = lumen_core::load_scene(&args.scene)
        .with_context(|| format!("Failed to load scene {}", args.scene.display()))?;
    log::info!("Loaded {} in {:?}", args.scene.display(), start.elapsed());

    let world = World::from_scene(&scene, config.split);

    if !scene.cameras.is_empty() {
        std::fs::create_dir_all(&args.output_dir)
            .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    }

    for camera in &scene.cameras {
        let image = render_camera(&scene, &world, camera, &config)
            .context("Failed to start render workers")?;

        let path = args.output_dir.join(&camera.image_name);
        image
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Saved {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting Lumen with {} threads", args.render_config().threads);

    run(&args)
}
