#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI tool for generating campus safety charts, maps and the model report.
//!
//! Loads the incident table named in the config, runs the requested steps
//! and writes the resulting artifacts into the configured generated
//! directory, where the API server picks them up on start.

use std::path::PathBuf;

use campus_safety_cache::ArtifactCache;
use campus_safety_generate::{AnalysisConfig, GenerateError, Step, run_steps};
use campus_safety_render::{LeafletMapRenderer, RasterChartRenderer};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "campus_safety_generate", about = "Artifact generation tool")]
struct Cli {
    /// Path to the analysis config (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every step
    All,
    /// Monthly incident trends chart
    Trends,
    /// Mean severity heatmap
    Heatmap,
    /// Train the severity model and chart its feature importances
    Predict,
    /// Interactive incident map
    Map,
}

impl Commands {
    fn steps(&self) -> Vec<Step> {
        match self {
            Self::All => Step::ALL.to_vec(),
            Self::Trends => vec![Step::Trends],
            Self::Heatmap => vec![Step::Heatmap],
            Self::Predict => vec![Step::Predict],
            Self::Map => vec![Step::Map],
        }
    }
}

fn main() -> Result<(), GenerateError> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let config = AnalysisConfig::resolve(cli.config.as_deref())?;
    let table = campus_safety_datastore::load(&config.data.incidents_path, &config.vocabulary)?;

    let cache = ArtifactCache::new();
    let charts = RasterChartRenderer::default();
    let geo = LeafletMapRenderer::new(config.map.clone());

    let result = run_steps(
        &table,
        &config,
        &charts,
        &geo,
        &cache,
        &cli.command.steps(),
    );

    // whatever was produced before a failure is still written out
    let written = cache.persist(&config.data.generated_dir)?;
    log::info!(
        "Wrote {written} artifact(s) to {}",
        config.data.generated_dir.display()
    );

    result.map(|_| ())
}
