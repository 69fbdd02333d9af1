//! Solver profiles
//!
//! Maps a configured `solver_name` to the hardware graph and sampling limits
//! of that solver.

use crate::topology::{ChimeraShape, Topology, DEFAULT_TILE};
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};

/// Shape of the 2000Q-generation processors
const DW_2000Q_SIZE: usize = 16;

/// Hardware description of a named solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverProfile {
    /// Solver name as configured
    pub name: String,
    /// Lattice shape
    pub shape: ChimeraShape,
    /// Inclusive annealing time range in microseconds
    pub annealing_time_range: (u64, u64),
    /// Maximum reads per sampling call
    pub max_num_reads: usize,
}

impl SolverProfile {
    /// Resolve a solver name
    ///
    /// Accepts `DW_2000Q_*` (a C16 lattice) and `chimera_<m>[x<n>[x<t>]]`.
    pub fn resolve(name: &str) -> Result<Self> {
        let shape = if name.starts_with("DW_2000Q") {
            ChimeraShape::square(DW_2000Q_SIZE)?
        } else if let Some(dims) = name.strip_prefix("chimera_") {
            parse_dims(dims).ok_or_else(|| {
                RcmError::config_error(format!("Malformed Chimera solver name '{}'", name))
            })??
        } else {
            return Err(RcmError::config_error(format!("Unknown solver '{}'", name)));
        };

        Ok(Self {
            name: name.to_string(),
            shape,
            annealing_time_range: (1, 2000),
            max_num_reads: 10_000,
        })
    }

    /// Hardware graph of this solver
    pub fn topology(&self) -> Result<Topology> {
        self.shape.build()
    }

    /// Check sampling parameters against the solver limits
    pub fn check_parameters(&self, annealing_time: u64, num_reads: usize) -> Result<()> {
        let (low, high) = self.annealing_time_range;
        if annealing_time < low || annealing_time > high {
            return Err(RcmError::sampler_error(format!(
                "annealing_time {} outside solver range [{}, {}]",
                annealing_time, low, high
            )));
        }
        if num_reads == 0 || num_reads > self.max_num_reads {
            return Err(RcmError::sampler_error(format!(
                "num_reads {} outside solver range [1, {}]",
                num_reads, self.max_num_reads
            )));
        }
        Ok(())
    }
}

fn parse_dims(dims: &str) -> Option<Result<ChimeraShape>> {
    let parts: Vec<usize> = dims
        .split('x')
        .map(|part| part.parse().ok())
        .collect::<Option<_>>()?;

    match parts.as_slice() {
        [m] => Some(ChimeraShape::new(*m, *m, DEFAULT_TILE)),
        [m, n] => Some(ChimeraShape::new(*m, *n, DEFAULT_TILE)),
        [m, n, t] => Some(ChimeraShape::new(*m, *n, *t)),
        _ => None,
    }
}
