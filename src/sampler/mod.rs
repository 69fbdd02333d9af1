//! Structured samplers
//!
//! A structured sampler exposes the hardware graph it accepts and samples
//! models defined over that graph. The experiment runner only talks to the
//! [`Sampler`] trait, so the local annealer and the structured mock are
//! interchangeable.

pub mod annealing;
pub mod mock;
pub mod sampleset;

pub use annealing::*;
pub use mock::*;
pub use sampleset::*;

use crate::qubo::BinaryQuadraticModel;
use crate::topology::{Qubit, Topology};
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};

/// Shape of the returned answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// One record per read, in read order
    #[default]
    Raw,
    /// Identical reads merged, with occurrence counts
    Histogram,
}

/// Sampler over a fixed hardware graph
pub trait Sampler {
    /// Solver name
    fn name(&self) -> &str;

    /// Hardware graph accepted by this sampler
    fn adjacency(&self) -> &Topology;

    /// Sample `bqm` with `num_reads` anneals of `annealing_time` microseconds
    fn sample(
        &mut self,
        bqm: &BinaryQuadraticModel<Qubit>,
        annealing_time: u64,
        num_reads: usize,
        answer_mode: AnswerMode,
    ) -> Result<SampleSet<Qubit>>;
}

/// Check that every variable and interaction of `bqm` exists in `topology`
pub fn check_structure(bqm: &BinaryQuadraticModel<Qubit>, topology: &Topology) -> Result<()> {
    if let Some(q) = bqm.variables().find(|&q| !topology.contains(q)) {
        return Err(RcmError::sampler_error(format!(
            "qubit {} is not part of the solver graph",
            q
        )));
    }
    if let Some((p, q, _)) = bqm.iter_quadratic().find(|&(p, q, _)| !topology.are_connected(p, q)) {
        return Err(RcmError::sampler_error(format!(
            "coupler ({}, {}) is not part of the solver graph",
            p, q
        )));
    }
    Ok(())
}

/// Apply the requested answer mode to a raw sample set
pub(crate) fn finish(raw: SampleSet<Qubit>, answer_mode: AnswerMode) -> SampleSet<Qubit> {
    match answer_mode {
        AnswerMode::Raw => raw,
        AnswerMode::Histogram => raw.aggregate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::Vartype;
    use crate::topology::chimera;

    #[test]
    fn test_structure_check() {
        let topology = chimera(1, 1, 4).unwrap();
        let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
        bqm.add_interaction(Qubit(0), Qubit(4), 1.0);
        assert!(check_structure(&bqm, &topology).is_ok());

        bqm.add_interaction(Qubit(0), Qubit(1), 1.0);
        assert!(check_structure(&bqm, &topology).is_err());
    }

    #[test]
    fn test_unknown_qubit() {
        let topology = chimera(1, 1, 4).unwrap();
        let mut bqm = BinaryQuadraticModel::new(Vartype::Spin);
        bqm.add_variable(Qubit(8), 1.0);
        assert!(check_structure(&bqm, &topology).is_err());
    }
}
