//! Embedding-size search
//!
//! Finds the smallest square Chimera lattice into which a problem graph can
//! be minor-embedded, by asking an [`EmbeddingOracle`] for an embedding at
//! increasing lattice sizes.

pub mod greedy;

pub use greedy::*;

use crate::embedding::Embedding;
use crate::qubo::Variable;
use crate::topology::{ChimeraShape, Topology};
use crate::{RcmError, Result};
use log::info;
use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};

/// Problem connectivity handed to the oracle
pub type SourceGraph = UnGraph<Variable, f64>;

/// Tuning parameters forwarded to the oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Independent embedding attempts per lattice size
    pub tries: usize,
    /// Worker threads available to the oracle
    pub threads: usize,
    /// Random seed, or system entropy when absent
    pub seed: Option<u64>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            tries: 10,
            threads: 1,
            seed: None,
        }
    }
}

/// Lattice sizes to examine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    /// First size tried
    pub min_size: usize,
    /// Last size tried, unbounded when absent
    pub max_size: Option<usize>,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min_size: 16,
            max_size: None,
        }
    }
}

/// Successful search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Smallest size that admitted an embedding
    pub size: usize,
    /// Embedding found at that size
    pub embedding: Embedding,
    /// Every size examined, in order
    pub sizes_tried: Vec<usize>,
}

/// Minor-embedding search over a fixed target graph
///
/// Returning an empty embedding means "nothing found"; the caller cannot
/// tell whether no embedding exists or the heuristic missed it.
pub trait EmbeddingOracle {
    fn find_embedding(
        &self,
        source: &SourceGraph,
        target: &Topology,
        params: &SearchParams,
    ) -> Result<Embedding>;
}

impl<O: EmbeddingOracle + ?Sized> EmbeddingOracle for &O {
    fn find_embedding(
        &self,
        source: &SourceGraph,
        target: &Topology,
        params: &SearchParams,
    ) -> Result<Embedding> {
        (**self).find_embedding(source, target, params)
    }
}

/// Check a size range and oracle parameters before any search
pub fn validate(range: &SizeRange, params: &SearchParams) -> Result<()> {
    if range.min_size == 0 {
        return Err(RcmError::config_error("min-size must be positive"));
    }
    if let Some(max_size) = range.max_size {
        if max_size < range.min_size {
            return Err(RcmError::config_error(format!(
                "Invalid arguments (min-size {} > max-size {})",
                range.min_size, max_size
            )));
        }
    }
    if params.tries == 0 {
        return Err(RcmError::config_error("num-tries must be positive"));
    }
    if params.threads == 0 {
        return Err(RcmError::config_error("threads must be positive"));
    }
    Ok(())
}

/// Find the smallest square Chimera size admitting an embedding of `source`
///
/// Sizes are tried in increasing order starting at `min_size`. With a
/// finite `max_size`, the search fails with [`RcmError::SearchExhausted`]
/// once it would go past that size; without one it runs until the oracle
/// succeeds.
pub fn find_min_size<O: EmbeddingOracle + ?Sized>(
    source: &SourceGraph,
    range: SizeRange,
    params: &SearchParams,
    oracle: &O,
) -> Result<SearchOutcome> {
    validate(&range, params)?;

    if source.node_count() == 0 {
        return Err(RcmError::degenerate_model("problem graph has no variables"));
    }

    let mut sizes_tried = Vec::new();
    let mut size = range.min_size;

    while range.max_size.map_or(true, |max_size| size <= max_size) {
        info!("Trying Chimera size: {}", size);
        sizes_tried.push(size);

        let target = ChimeraShape::square(size)?.build()?;
        let embedding = oracle.find_embedding(source, &target, params)?;

        if !embedding.is_empty() {
            return Ok(SearchOutcome {
                size,
                embedding,
                sizes_tried,
            });
        }

        size += 1;
    }

    Err(RcmError::SearchExhausted {
        min_size: range.min_size,
        max_size: range.max_size.unwrap_or(size - 1),
    })
}
