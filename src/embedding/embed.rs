//! Embedding a source model onto a target graph

use crate::embedding::{coupling_edges, Embedding};
use crate::qubo::{BinaryQuadraticModel, Variable, Vartype};
use crate::topology::{Qubit, Topology};
use crate::{RcmError, Result};

/// Embed a source model onto the target topology
///
/// Linear biases are spread evenly over each chain and quadratic biases
/// evenly over the couplers joining two chains. Every coupler inside a
/// chain receives `-chain_strength` in spin space, with the offset adjusted
/// so that intact chains contribute no energy. Binary models are embedded
/// through their spin form and converted back.
pub fn embed_bqm(
    source: &BinaryQuadraticModel<Variable>,
    embedding: &Embedding,
    target: &Topology,
    chain_strength: f64,
) -> Result<BinaryQuadraticModel<Qubit>> {
    if !chain_strength.is_finite() || chain_strength < 0.0 {
        return Err(RcmError::embedding_error(format!(
            "chain strength must be finite and non-negative, got {}",
            chain_strength
        )));
    }

    let spin = source.to_spin();
    let mut embedded = BinaryQuadraticModel::new(Vartype::Spin);
    embedded.add_offset(spin.offset());

    for (v, bias) in spin.iter_linear() {
        let chain = embedding
            .chain(v)
            .filter(|chain| !chain.is_empty())
            .ok_or_else(|| RcmError::embedding_error(format!("variable {} has no chain", v)))?;

        if let Some(&q) = chain.iter().find(|&&q| !target.contains(q)) {
            return Err(RcmError::embedding_error(format!(
                "qubit {} of variable {} is not in the target graph",
                q, v
            )));
        }

        let share = bias / chain.len() as f64;
        for &q in chain {
            embedded.add_variable(q, share);
        }

        for (i, &p) in chain.iter().enumerate() {
            for &q in &chain[i + 1..] {
                if target.are_connected(p, q) {
                    embedded.add_interaction(p, q, -chain_strength);
                    embedded.add_offset(chain_strength);
                }
            }
        }
    }

    for (u, v, bias) in spin.iter_quadratic() {
        let couplers = coupling_edges(embedding, target, u, v)?;
        if couplers.is_empty() {
            return Err(RcmError::embedding_error(format!(
                "no coupler between the chains of {} and {}",
                u, v
            )));
        }

        let share = bias / couplers.len() as f64;
        for (p, q) in couplers {
            embedded.add_interaction(p, q, share);
        }
    }

    Ok(embedded.change_vartype(source.vartype()))
}
