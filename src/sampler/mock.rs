//! Structured mock sampler
//!
//! Mimics another sampler's name, hardware graph and answer format, but
//! returns uniformly random assignments without running any anneal. Used to
//! exercise a full sweep pipeline cheaply.

use crate::qubo::BinaryQuadraticModel;
use crate::sampler::{check_structure, finish, AnswerMode, SampleSet, Sampler};
use crate::topology::{Qubit, Topology};
use crate::{RcmError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random sampler over a copied hardware graph
#[derive(Debug, Clone)]
pub struct StructuredMock {
    name: String,
    topology: Topology,
    rng: StdRng,
    calls: usize,
}

impl StructuredMock {
    /// Create a mock over an explicit graph
    pub fn new(name: impl Into<String>, topology: Topology) -> Self {
        Self {
            name: name.into(),
            topology,
            rng: StdRng::from_entropy(),
            calls: 0,
        }
    }

    /// Mimic the structure of an existing sampler
    pub fn from_sampler<S: Sampler + ?Sized>(sampler: &S) -> Self {
        Self::new(sampler.name(), sampler.adjacency().clone())
    }

    /// Make the returned samples deterministic
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Number of sampling calls served so far
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Sampler for StructuredMock {
    fn name(&self) -> &str {
        &self.name
    }

    fn adjacency(&self) -> &Topology {
        &self.topology
    }

    fn sample(
        &mut self,
        bqm: &BinaryQuadraticModel<Qubit>,
        _annealing_time: u64,
        num_reads: usize,
        answer_mode: AnswerMode,
    ) -> Result<SampleSet<Qubit>> {
        if num_reads == 0 {
            return Err(RcmError::sampler_error("num_reads must be positive"));
        }
        check_structure(bqm, &self.topology)?;
        self.calls += 1;

        let qubits: Vec<Qubit> = bqm.variables().collect();
        let [low, high] = bqm.vartype().values();
        let samples: Vec<Vec<i8>> = (0..num_reads)
            .map(|_| {
                qubits
                    .iter()
                    .map(|_| if self.rng.gen::<bool>() { high } else { low })
                    .collect()
            })
            .collect();

        let mut raw = SampleSet::from_samples(bqm, qubits, samples)?;
        raw.set_info("mock", serde_json::json!(true));
        Ok(finish(raw, answer_mode))
    }
}
