//! `pointfeat`: compute per-point feature tables for a directory of tiles

use anyhow::{bail, Context, Result};
use clap::Parser;
use pointfeat_cli::process_directory;
use pointfeat_core::{Channel, ChannelSet, SurfaceStrategy};
use pointfeat_io::{load_config, RunConfig};
use std::path::PathBuf;

/// Per-point geometric and statistical descriptors for point cloud tiles
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON run configuration; command-line options override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory containing tile files (.csv, .txt, .xyz)
    #[arg(short, long)]
    input_dir: Option<PathBuf>,

    /// Directory feature tables are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of neighbors per point
    #[arg(short, long)]
    k_neighbors: Option<usize>,

    /// Surface strategy: covariance_eigen or quadratic_fit
    #[arg(short, long)]
    strategy: Option<String>,

    /// Channels for moment statistics, comma separated (e.g. "x,y,z")
    #[arg(long, value_delimiter = ',')]
    channels: Option<Vec<String>>,

    /// Number of worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Append the class label as the last column
    #[arg(long)]
    include_class: bool,

    /// Required number of points per tile
    #[arg(long)]
    expected_points: Option<usize>,
}

fn run_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(dir) = &args.input_dir {
        config.input_directory = Some(dir.clone());
    }
    if let Some(dir) = &args.output_dir {
        config.output_directory = Some(dir.clone());
    }

    let features = &mut config.features;
    if let Some(k) = args.k_neighbors {
        features.k_neighbors = k;
    }
    if let Some(strategy) = &args.strategy {
        features.strategy = strategy.parse::<SurfaceStrategy>()?;
    }
    if let Some(channels) = &args.channels {
        features.channel_subset = channels
            .iter()
            .map(|c| c.parse::<Channel>())
            .collect::<pointfeat_core::Result<ChannelSet>>()?;
    }
    if let Some(workers) = args.workers {
        features.num_workers = workers;
    }
    if args.include_class {
        features.include_class = true;
    }
    if args.expected_points.is_some() {
        features.expected_points = args.expected_points;
    }
    features.validate()?;

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = run_config(&args)?;

    let input_dir = config
        .input_directory
        .clone()
        .context("No input directory given (--input-dir or input_directory in config)")?;
    let output_dir = config
        .output_directory
        .clone()
        .context("No output directory given (--output-dir or output_directory in config)")?;

    let summary = process_directory(&input_dir, &output_dir, &config.features)
        .with_context(|| format!("Batch over {} failed", input_dir.display()))?;

    if !summary.is_success() {
        bail!(
            "{} of {} tiles failed",
            summary.failed(),
            summary.total()
        );
    }
    Ok(())
}
