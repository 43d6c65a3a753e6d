use anyhow::Context;
use clap::Parser;
use fountain::demo::cornell_box;
use fountain::film::Film;
use fountain::integrator::PathIntegrator;
use fountain::progress::ProgressBarReporter;
use fountain::renderer::{RenderOutcome, Renderer};
use fountain::sampler::RandomSampler;
use fountain::settings::{PathSettings, RenderSettings};
use fountain::Point2i;
use image::codecs::hdr::HdrEncoder;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};
use tracing_tree::HierarchicalLayer;

/// Render the built-in Cornell box to a Radiance HDR image.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Samples per pixel
    #[arg(long, default_value_t = 64)]
    spp: u32,

    /// Worker threads, defaults to all hardware threads
    #[arg(long)]
    workers: Option<usize>,

    #[arg(long, default_value_t = 16)]
    tile_size: u32,

    #[arg(long, default_value_t = 512)]
    width: i32,

    #[arg(long, default_value_t = 512)]
    height: i32,

    #[arg(long, default_value_t = 3)]
    min_depth: u32,

    #[arg(long, default_value_t = 8)]
    max_depth: u32,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(short, long, default_value = "cornell.hdr")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(HierarchicalLayer::new(2))
        .init();

    let args = Args::parse();
    let resolution = Point2i::new(args.width, args.height);

    let render_settings = RenderSettings {
        tile_size: args.tile_size,
        samples_per_pixel: args.spp,
        worker_count: args.workers,
        seed: args.seed,
    };
    let path_settings = PathSettings {
        min_depth: args.min_depth,
        max_depth: args.max_depth,
        ..Default::default()
    };

    let scene = cornell_box(resolution)?;
    let film = Film::new(resolution)?;
    let sampler = RandomSampler::new_with_seed(args.spp as usize, args.seed);
    let renderer = Renderer::new(render_settings, PathIntegrator::new(path_settings)?)?;

    let outcome = renderer.render(&scene, &sampler, &film, &ProgressBarReporter::new())?;
    if let RenderOutcome::Cancelled { completed_tiles, total_tiles } = outcome {
        tracing::warn!(completed_tiles, total_tiles, "render stopped early");
    }

    let image = film.resolve();
    let (width, height) = image.dimensions();
    let pixels: Vec<_> = image.pixels().copied().collect();
    let file = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    HdrEncoder::new(BufWriter::new(file)).encode(&pixels, width as usize, height as usize)?;
    tracing::info!(output = %args.output.display(), "image written");
    Ok(())
}
