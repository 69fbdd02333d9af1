//! # Railway conflict-management annealing toolkit
//!
//! Tools for running QUBO instances on Chimera-structured annealers.
//! Provides the smallest-lattice embedding search and batched, resumable
//! parameter sweeps with on-disk result caching.

// Core modules
pub mod error;
pub mod qubo;
pub mod topology;
pub mod embedding;
pub mod sampler;

// Tool modules
pub mod search;
pub mod sweep;

// Re-exports for convenience
pub use error::{RcmError, Result};
pub use qubo::{BinaryQuadraticModel, Variable, Vartype};
pub use topology::{chimera, ChimeraShape, Qubit, SolverProfile, Topology};
pub use embedding::{embed_bqm, unembed_sampleset, ChainBreakMethod, Embedding};
pub use sampler::{AnnealingSampler, AnswerMode, SampleSet, Sampler, StructuredMock};
pub use search::{
    find_min_size, EmbeddingOracle, GreedyChainOracle, SearchOutcome, SearchParams, SizeRange,
};
pub use sweep::{run_experiment, ExperimentConfig, ExperimentRunner, SweepSummary};

use std::path::Path;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Find the smallest square Chimera lattice that embeds a COO instance
///
/// The instance is read as a binary model and searched with the
/// [`GreedyChainOracle`].
pub fn find_min_chimera<P: AsRef<Path>>(
    instance: P,
    range: SizeRange,
    params: &SearchParams,
) -> Result<SearchOutcome> {
    search::validate(&range, params)?;
    let bqm = qubo::load_coo(instance, Vartype::Binary)?;
    find_min_size(&bqm.interaction_graph(), range, params, &GreedyChainOracle::new())
}
