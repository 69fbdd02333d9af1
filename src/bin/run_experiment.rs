//! Sample a railway conflict-management QUBO over a parameter sweep
//!
//! ```text
//! run-experiment experiment.yaml [--mock]
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rcm_anneal::{run_experiment, ExperimentConfig};

#[derive(Parser)]
#[command(name = "run-experiment")]
#[command(
    about = "Sample railway conflict management QUBO, optionally using mock simulator",
    long_about = None
)]
struct Args {
    /// Configuration file (YAML)
    config: PathBuf,

    /// Use mock simulator instead of the real solver. Warning: this returns
    /// random results
    #[arg(long)]
    mock: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ExperimentConfig::from_file(&args.config)
        .with_context(|| format!("Invalid configuration {}", args.config.display()))?;
    let output_dir = config.output_dir.clone();

    let summary = run_experiment(config, args.mock)
        .with_context(|| format!("Experiment into {} failed", output_dir.display()))?;

    log::info!(
        "{} result files written to {}",
        summary.outputs.len(),
        output_dir.join("outputs").display()
    );
    Ok(())
}
