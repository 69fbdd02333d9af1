//! Minor embeddings of problem variables onto hardware qubits
//!
//! An embedding maps every problem variable to a chain of physical qubits.
//! Embeddings are produced by the size search (or externally), persisted as
//! JSON objects `{"<variable>": [<qubit>, ...]}`, and loaded read-only by the
//! experiment runner.
//!
//! [`embed_bqm`] and [`unembed_sampleset`] stand in for the embedding
//! utilities of an annealing client library and cover only what the sweep
//! needs.

pub mod embed;
pub mod unembed;

pub use embed::*;
pub use unembed::*;

use crate::qubo::{BinaryQuadraticModel, Variable};
use crate::topology::{Qubit, Topology};
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

/// Physical qubits representing one variable
pub type Chain = SmallVec<[Qubit; 4]>;

/// Variable-to-chain mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding {
    chains: BTreeMap<Variable, Chain>,
}

impl Embedding {
    /// Create an empty embedding
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the chain of a variable, replacing any previous chain
    pub fn insert(&mut self, variable: Variable, chain: impl IntoIterator<Item = Qubit>) {
        let mut chain: Chain = chain.into_iter().collect();
        chain.sort_unstable();
        chain.dedup();
        self.chains.insert(variable, chain);
    }

    /// Chain of a variable
    pub fn chain(&self, variable: Variable) -> Option<&[Qubit]> {
        self.chains.get(&variable).map(|chain| chain.as_slice())
    }

    /// Number of embedded variables
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no variable is embedded
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Iterate over chains in variable order
    pub fn iter(&self) -> impl Iterator<Item = (Variable, &[Qubit])> + '_ {
        self.chains.iter().map(|(&v, chain)| (v, chain.as_slice()))
    }

    /// Total number of qubits used
    pub fn qubit_count(&self) -> usize {
        self.chains.values().map(|chain| chain.len()).sum()
    }

    /// Length of the longest chain
    pub fn max_chain_length(&self) -> usize {
        self.chains.values().map(|chain| chain.len()).max().unwrap_or(0)
    }

    /// Owning variable of every used qubit
    pub fn qubit_owners(&self) -> HashMap<Qubit, Variable> {
        self.chains
            .iter()
            .flat_map(|(&v, chain)| chain.iter().map(move |&q| (q, v)))
            .collect()
    }

    /// Check that this embedding realizes `source` on `target`
    ///
    /// Every source variable needs a non-empty chain of target qubits, chains
    /// must be disjoint and connected, and every interaction needs at least
    /// one coupler between the two chains.
    pub fn validate(
        &self,
        source: &BinaryQuadraticModel<Variable>,
        target: &Topology,
    ) -> Result<()> {
        let mut owners: HashMap<Qubit, Variable> = HashMap::new();

        for v in source.variables() {
            let chain = self
                .chain(v)
                .ok_or_else(|| RcmError::embedding_error(format!("variable {} has no chain", v)))?;

            if chain.is_empty() {
                return Err(RcmError::embedding_error(format!("variable {} has an empty chain", v)));
            }

            for &q in chain {
                if !target.contains(q) {
                    return Err(RcmError::embedding_error(format!(
                        "qubit {} of variable {} is not in the target graph",
                        q, v
                    )));
                }
                if let Some(other) = owners.insert(q, v) {
                    return Err(RcmError::embedding_error(format!(
                        "qubit {} is shared by variables {} and {}",
                        q, other, v
                    )));
                }
            }

            if !target.is_connected_subgraph(chain) {
                return Err(RcmError::embedding_error(format!(
                    "chain of variable {} is not connected",
                    v
                )));
            }
        }

        for (u, v, _) in source.iter_quadratic() {
            if coupling_edges(self, target, u, v)?.is_empty() {
                return Err(RcmError::embedding_error(format!(
                    "no coupler between the chains of {} and {}",
                    u, v
                )));
            }
        }

        Ok(())
    }

    /// Load an embedding from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let embedding: Embedding = serde_json::from_str(&content)?;
        Ok(embedding)
    }

    /// Save the embedding to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

impl FromIterator<(Variable, Vec<Qubit>)> for Embedding {
    fn from_iter<I: IntoIterator<Item = (Variable, Vec<Qubit>)>>(iter: I) -> Self {
        let mut embedding = Embedding::new();
        for (v, chain) in iter {
            embedding.insert(v, chain);
        }
        embedding
    }
}

/// Couplers joining the chains of two variables
pub(crate) fn coupling_edges(
    embedding: &Embedding,
    target: &Topology,
    u: Variable,
    v: Variable,
) -> Result<Vec<(Qubit, Qubit)>> {
    let missing = |x: Variable| RcmError::embedding_error(format!("variable {} has no chain", x));
    let chain_u = embedding.chain(u).ok_or_else(|| missing(u))?;
    let chain_v = embedding.chain(v).ok_or_else(|| missing(v))?;

    Ok(chain_u
        .iter()
        .flat_map(|&p| chain_v.iter().map(move |&q| (p, q)))
        .filter(|&(p, q)| target.are_connected(p, q))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::Vartype;
    use crate::topology::chimera;

    fn triangle() -> BinaryQuadraticModel<Variable> {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_interaction(Variable(0), Variable(1), 1.0);
        bqm.add_interaction(Variable(1), Variable(2), 1.0);
        bqm.add_interaction(Variable(0), Variable(2), 1.0);
        bqm
    }

    // In a single K(4,4) cell a triangle needs one chain of length two.
    fn triangle_embedding() -> Embedding {
        [
            (Variable(0), vec![Qubit(0), Qubit(4)]),
            (Variable(1), vec![Qubit(5)]),
            (Variable(2), vec![Qubit(1)]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_valid_embedding() {
        let target = chimera(1, 1, 4).unwrap();
        triangle_embedding().validate(&triangle(), &target).unwrap();
        assert_eq!(triangle_embedding().qubit_count(), 4);
        assert_eq!(triangle_embedding().max_chain_length(), 2);
    }

    #[test]
    fn test_missing_coupler_detected() {
        let target = chimera(1, 1, 4).unwrap();
        let embedding: Embedding = [
            (Variable(0), vec![Qubit(0)]),
            (Variable(1), vec![Qubit(4)]),
            (Variable(2), vec![Qubit(1)]),
        ]
        .into_iter()
        .collect();

        let err = embedding.validate(&triangle(), &target).unwrap_err();
        assert!(err.to_string().contains("no coupler"));
    }

    #[test]
    fn test_shared_qubit_detected() {
        let target = chimera(1, 1, 4).unwrap();
        let embedding: Embedding = [
            (Variable(0), vec![Qubit(0), Qubit(4)]),
            (Variable(1), vec![Qubit(4)]),
            (Variable(2), vec![Qubit(1)]),
        ]
        .into_iter()
        .collect();

        assert!(embedding.validate(&triangle(), &target).is_err());
    }

    #[test]
    fn test_disconnected_chain_detected() {
        let target = chimera(1, 1, 4).unwrap();
        let mut embedding = triangle_embedding();
        embedding.insert(Variable(0), [Qubit(0), Qubit(2)]);

        let err = embedding.validate(&triangle(), &target).unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[test]
    fn test_json_format() {
        let json = serde_json::to_string(&triangle_embedding()).unwrap();
        assert_eq!(json, r#"{"0":[0,4],"1":[5],"2":[1]}"#);

        let parsed: Embedding = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, triangle_embedding());
    }
}
