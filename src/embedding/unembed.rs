//! Unembedding sample sets back to problem variables

use crate::embedding::Embedding;
use crate::qubo::{BinaryQuadraticModel, Variable};
use crate::sampler::{SampleRecord, SampleSet};
use crate::topology::Qubit;
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How to resolve a chain whose qubits disagree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChainBreakMethod {
    /// Take the majority value, ties resolved to the high value
    #[default]
    MajorityVote,
    /// Drop any record with a broken chain
    Discard,
}

/// Map a sample set over qubits back onto the source model's variables
///
/// Energies are recomputed against `source`, occurrences are carried over
/// and every record gains its chain-break fraction. Variables appear in
/// ascending order.
pub fn unembed_sampleset(
    target: &SampleSet<Qubit>,
    embedding: &Embedding,
    source: &BinaryQuadraticModel<Variable>,
    method: ChainBreakMethod,
) -> Result<SampleSet<Variable>> {
    if target.vartype() != source.vartype() {
        return Err(RcmError::embedding_error(format!(
            "sample vartype {} does not match model vartype {}",
            target.vartype(),
            source.vartype()
        )));
    }

    let column: HashMap<Qubit, usize> = target
        .variables()
        .iter()
        .enumerate()
        .map(|(i, &q)| (q, i))
        .collect();

    let variables: Vec<Variable> = source.variables().collect();
    let mut chains: Vec<Vec<usize>> = Vec::with_capacity(variables.len());
    for &v in &variables {
        let chain = embedding
            .chain(v)
            .filter(|chain| !chain.is_empty())
            .ok_or_else(|| RcmError::embedding_error(format!("variable {} has no chain", v)))?;

        let columns = chain
            .iter()
            .map(|q| {
                column.get(q).copied().ok_or_else(|| {
                    RcmError::embedding_error(format!(
                        "qubit {} of variable {} was not sampled",
                        q, v
                    ))
                })
            })
            .collect::<Result<Vec<usize>>>()?;
        chains.push(columns);
    }

    let [low, high] = source.vartype().values();
    let position: HashMap<Variable, usize> =
        variables.iter().enumerate().map(|(i, &v)| (v, i)).collect();
    let mut unembedded = SampleSet::new(variables, source.vartype());

    for record in target.records() {
        let mut sample = Vec::with_capacity(chains.len());
        let mut broken = 0usize;

        for chain in &chains {
            let highs = chain.iter().filter(|&&c| record.sample[c] == high).count();
            if highs != 0 && highs != chain.len() {
                broken += 1;
            }
            sample.push(if 2 * highs >= chain.len() { high } else { low });
        }

        if broken > 0 && method == ChainBreakMethod::Discard {
            continue;
        }

        let energy = source.energy(|v| sample[position[&v]]);
        let chain_break_fraction = if chains.is_empty() {
            0.0
        } else {
            broken as f64 / chains.len() as f64
        };

        unembedded.push(SampleRecord {
            sample,
            energy,
            num_occurrences: record.num_occurrences,
            chain_break_fraction: Some(chain_break_fraction),
        })?;
    }

    Ok(unembedded)
}
