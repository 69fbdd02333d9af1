//! Local simulated-annealing sampler
//!
//! Stands in for annealing hardware: it accepts exactly the couplers of a
//! solver profile's lattice, enforces the profile's parameter limits and
//! runs single-spin Metropolis sweeps over a geometric inverse-temperature
//! schedule. The annealing time selects the number of sweeps.

use crate::qubo::{BinaryQuadraticModel, Vartype};
use crate::sampler::{check_structure, finish, AnswerMode, SampleSet, Sampler};
use crate::topology::{Qubit, SolverProfile, Topology};
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Fewest sweeps per read, regardless of annealing time
pub const MIN_SWEEPS: usize = 10;

/// Most sweeps per read, regardless of annealing time
pub const MAX_SWEEPS: usize = 1000;

/// Simulated annealing over a solver profile's hardware graph
#[derive(Debug, Clone)]
pub struct AnnealingSampler {
    profile: SolverProfile,
    topology: Topology,
    rng: StdRng,
}

impl AnnealingSampler {
    /// Create a sampler seeded from system entropy
    pub fn new(profile: SolverProfile) -> Result<Self> {
        let topology = profile.topology()?;
        Ok(Self {
            profile,
            topology,
            rng: StdRng::from_entropy(),
        })
    }

    /// Create a deterministic sampler
    pub fn with_seed(profile: SolverProfile, seed: u64) -> Result<Self> {
        let topology = profile.topology()?;
        Ok(Self {
            profile,
            topology,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Resolve a solver name and create a sampler for it
    pub fn connect(solver_name: &str) -> Result<Self> {
        Self::new(SolverProfile::resolve(solver_name)?)
    }

    /// Solver profile
    pub fn profile(&self) -> &SolverProfile {
        &self.profile
    }

    /// Number of sweeps used for an annealing time in microseconds
    pub fn sweeps_for(annealing_time: u64) -> usize {
        usize::try_from(annealing_time)
            .unwrap_or(MAX_SWEEPS)
            .clamp(MIN_SWEEPS, MAX_SWEEPS)
    }
}

/// Spin model flattened into index form
struct IsingProblem {
    h: Vec<f64>,
    neighbors: Vec<Vec<(usize, f64)>>,
}

impl IsingProblem {
    fn new(spin: &BinaryQuadraticModel<Qubit>, qubits: &[Qubit]) -> Self {
        let index: HashMap<Qubit, usize> =
            qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();
        let h = qubits.iter().map(|&q| spin.linear(q).unwrap_or(0.0)).collect();
        let mut neighbors = vec![Vec::new(); qubits.len()];

        for (p, q, bias) in spin.iter_quadratic() {
            let (i, j) = (index[&p], index[&q]);
            neighbors[i].push((j, bias));
            neighbors[j].push((i, bias));
        }

        Self { h, neighbors }
    }

    /// Hot and cold inverse temperatures
    ///
    /// The hottest point flips the most constrained spin half of the time and
    /// the coldest flips the least constrained one 1% of the time.
    fn beta_range(&self) -> (f64, f64) {
        let max_field = self
            .h
            .iter()
            .zip(&self.neighbors)
            .map(|(h, row)| h.abs() + row.iter().map(|(_, j)| j.abs()).sum::<f64>())
            .fold(0.0, f64::max);
        let min_coefficient = self
            .h
            .iter()
            .copied()
            .chain(self.neighbors.iter().flatten().map(|&(_, j)| j))
            .map(f64::abs)
            .filter(|&x| x > 0.0)
            .fold(f64::INFINITY, f64::min);

        if max_field == 0.0 || !min_coefficient.is_finite() {
            return (1.0, 1.0);
        }

        let hot = 2f64.ln() / (2.0 * max_field);
        let cold = 100f64.ln() / (2.0 * min_coefficient);
        (hot, cold.max(hot))
    }

    fn anneal<R: Rng>(&self, rng: &mut R, schedule: &[f64]) -> Vec<i8> {
        let mut spins: Vec<i8> = (0..self.h.len())
            .map(|_| if rng.gen::<bool>() { 1 } else { -1 })
            .collect();

        for &beta in schedule {
            for i in 0..spins.len() {
                let field = self.h[i]
                    + self.neighbors[i]
                        .iter()
                        .map(|&(j, bias)| bias * spins[j] as f64)
                        .sum::<f64>();
                let delta = -2.0 * spins[i] as f64 * field;

                if delta <= 0.0 || rng.gen::<f64>() < (-beta * delta).exp() {
                    spins[i] = -spins[i];
                }
            }
        }

        spins
    }
}

fn geometric_schedule(hot: f64, cold: f64, sweeps: usize) -> Vec<f64> {
    if sweeps <= 1 {
        return vec![cold; sweeps];
    }
    let ratio = (cold / hot).powf(1.0 / (sweeps - 1) as f64);
    (0..sweeps).map(|s| hot * ratio.powi(s as i32)).collect()
}

impl Sampler for AnnealingSampler {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn adjacency(&self) -> &Topology {
        &self.topology
    }

    fn sample(
        &mut self,
        bqm: &BinaryQuadraticModel<Qubit>,
        annealing_time: u64,
        num_reads: usize,
        answer_mode: AnswerMode,
    ) -> Result<SampleSet<Qubit>> {
        self.profile.check_parameters(annealing_time, num_reads)?;
        check_structure(bqm, &self.topology)?;

        let qubits: Vec<Qubit> = bqm.variables().collect();
        let problem = IsingProblem::new(&bqm.to_spin(), &qubits);
        let (hot, cold) = problem.beta_range();
        let sweeps = Self::sweeps_for(annealing_time);
        let schedule = geometric_schedule(hot, cold, sweeps);

        let samples: Vec<Vec<i8>> = (0..num_reads)
            .map(|_| {
                let spins = problem.anneal(&mut self.rng, &schedule);
                match bqm.vartype() {
                    Vartype::Spin => spins,
                    Vartype::Binary => spins.into_iter().map(|s| (s + 1) / 2).collect(),
                }
            })
            .collect();

        let mut raw = SampleSet::from_samples(bqm, qubits, samples)?;
        raw.set_info("num_sweeps", serde_json::json!(sweeps));
        raw.set_info("beta_range", serde_json::json!([hot, cold]));
        Ok(finish(raw, answer_mode))
    }
}
