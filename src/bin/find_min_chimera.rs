//! Smallest square Chimera lattice that embeds a problem instance
//!
//! ```text
//! find-min-chimera problem.coo --min-size 8 --max-size 16 --threads 4
//! ```
//!
//! Prints the winning lattice size on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rcm_anneal::{find_min_chimera, SearchParams, SizeRange};

#[derive(Parser)]
#[command(name = "find-min-chimera")]
#[command(
    about = "Find the smallest square Chimera lattice (rows = columns) that embeds a problem",
    long_about = None
)]
struct Args {
    /// Problem instance in COO format
    instance: PathBuf,

    /// Number of tries per lattice size
    #[arg(long, default_value_t = 10)]
    num_tries: usize,

    /// Smallest square Chimera size to try
    #[arg(long, default_value_t = 16)]
    min_size: usize,

    /// Largest square Chimera size to try; unbounded when omitted
    #[arg(long)]
    max_size: Option<usize>,

    /// Number of worker threads for the embedding heuristic
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// Random seed for the embedding heuristic
    #[arg(long)]
    seed: Option<u64>,

    /// Write the embedding found to this JSON file
    #[arg(long)]
    embedding_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let range = SizeRange {
        min_size: args.min_size,
        max_size: args.max_size,
    };
    let params = SearchParams {
        tries: args.num_tries,
        threads: args.threads,
        seed: args.seed,
    };

    let outcome = find_min_chimera(&args.instance, range, &params)
        .with_context(|| format!("Embedding search failed for {}", args.instance.display()))?;

    if let Some(path) = &args.embedding_out {
        outcome
            .embedding
            .to_file(path)
            .with_context(|| format!("Failed to write embedding to {}", path.display()))?;
        log::info!("Embedding written to {}", path.display());
    }

    println!("{}", outcome.size);
    Ok(())
}
