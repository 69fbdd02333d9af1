//! Quadratic binary optimization models
//!
//! Provides the problem representation shared by both tools: a binary
//! quadratic model over labelled variables, its energy scale, vartype
//! conversion and the interaction graph handed to the embedding oracle.

pub mod coo;

pub use coo::*;

use crate::{RcmError, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;

/// Anything usable as a model variable label
pub trait Label:
    Copy + Ord + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync
{
}

impl<T> Label for T where
    T: Copy + Ord + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync
{
}

/// Problem variable identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(pub usize);

impl Variable {
    /// Create a new variable with the given index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the variable index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for Variable {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Domain of the model variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Vartype {
    /// Values in {0, 1}
    Binary,
    /// Values in {-1, +1}
    Spin,
}

impl Vartype {
    /// The two admissible values, low first
    pub fn values(&self) -> [i8; 2] {
        match self {
            Vartype::Binary => [0, 1],
            Vartype::Spin => [-1, 1],
        }
    }

    /// Check whether a value belongs to this domain
    pub fn contains(&self, value: i8) -> bool {
        self.values().contains(&value)
    }
}

impl fmt::Display for Vartype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vartype::Binary => write!(f, "BINARY"),
            Vartype::Spin => write!(f, "SPIN"),
        }
    }
}

impl std::str::FromStr for Vartype {
    type Err = RcmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BINARY" => Ok(Vartype::Binary),
            "SPIN" => Ok(Vartype::Spin),
            other => Err(RcmError::config_error(format!("Unknown vartype '{}'", other))),
        }
    }
}

/// Binary quadratic model
///
/// Quadratic terms are keyed by the ordered pair `(min, max)` of their labels,
/// so `(u, v)` and `(v, u)` address the same interaction. Every variable that
/// takes part in an interaction also has a (possibly zero) linear bias.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryQuadraticModel<V: Label> {
    vartype: Vartype,
    linear: BTreeMap<V, f64>,
    quadratic: BTreeMap<(V, V), f64>,
    offset: f64,
}

impl<V: Label> BinaryQuadraticModel<V> {
    /// Create an empty model
    pub fn new(vartype: Vartype) -> Self {
        Self {
            vartype,
            linear: BTreeMap::new(),
            quadratic: BTreeMap::new(),
            offset: 0.0,
        }
    }

    /// Model vartype
    pub fn vartype(&self) -> Vartype {
        self.vartype
    }

    /// Constant energy offset
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Add to the constant energy offset
    pub fn add_offset(&mut self, offset: f64) {
        self.offset += offset;
    }

    /// Add a variable, accumulating onto any existing linear bias
    pub fn add_variable(&mut self, v: V, bias: f64) {
        *self.linear.entry(v).or_insert(0.0) += bias;
    }

    /// Add an interaction, accumulating onto any existing quadratic bias
    ///
    /// A self-interaction `u == v` folds into the linear term for binary
    /// models (`x * x == x`) and into the offset for spin models.
    pub fn add_interaction(&mut self, u: V, v: V, bias: f64) {
        if u == v {
            match self.vartype {
                Vartype::Binary => self.add_variable(u, bias),
                Vartype::Spin => {
                    self.add_variable(u, 0.0);
                    self.offset += bias;
                }
            }
            return;
        }

        self.add_variable(u, 0.0);
        self.add_variable(v, 0.0);
        *self.quadratic.entry(ordered(u, v)).or_insert(0.0) += bias;
    }

    /// Number of variables
    pub fn num_variables(&self) -> usize {
        self.linear.len()
    }

    /// Number of stored interactions (including zero-valued ones)
    pub fn num_interactions(&self) -> usize {
        self.quadratic.len()
    }

    /// Variables in ascending label order
    pub fn variables(&self) -> impl Iterator<Item = V> + '_ {
        self.linear.keys().copied()
    }

    /// Check whether the model has the given variable
    pub fn contains(&self, v: V) -> bool {
        self.linear.contains_key(&v)
    }

    /// Linear bias of a variable
    pub fn linear(&self, v: V) -> Option<f64> {
        self.linear.get(&v).copied()
    }

    /// Quadratic bias between two variables, in either order
    pub fn quadratic(&self, u: V, v: V) -> Option<f64> {
        self.quadratic.get(&ordered(u, v)).copied()
    }

    /// Iterate over linear biases
    pub fn iter_linear(&self) -> impl Iterator<Item = (V, f64)> + '_ {
        self.linear.iter().map(|(&v, &bias)| (v, bias))
    }

    /// Iterate over quadratic biases
    pub fn iter_quadratic(&self) -> impl Iterator<Item = (V, V, f64)> + '_ {
        self.quadratic.iter().map(|(&(u, v), &bias)| (u, v, bias))
    }

    /// Energy of an assignment given as a value lookup
    pub fn energy<F>(&self, value: F) -> f64
    where
        F: Fn(V) -> i8,
    {
        let linear: f64 = self
            .linear
            .iter()
            .map(|(&v, &bias)| bias * value(v) as f64)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .map(|(&(u, v), &bias)| bias * (value(u) as f64) * (value(v) as f64))
            .sum();

        self.offset + linear + quadratic
    }

    /// Smallest and largest absolute nonzero quadratic coefficient
    ///
    /// Fails for models without any nonzero interaction, where no chain
    /// strength can be derived.
    pub fn energy_scale(&self) -> Result<(f64, f64)> {
        let absolute: Vec<f64> = self
            .quadratic
            .values()
            .filter(|&&bias| bias != 0.0)
            .map(|bias| bias.abs())
            .collect();

        if absolute.is_empty() {
            return Err(RcmError::degenerate_model(
                "model has no nonzero quadratic interactions",
            ));
        }

        let min = absolute.iter().copied().fold(f64::INFINITY, f64::min);
        let max = absolute.iter().copied().fold(0.0, f64::max);
        Ok((min, max))
    }

    /// Copy of this model expressed over the other vartype
    pub fn change_vartype(&self, target: Vartype) -> Self {
        match (self.vartype, target) {
            (Vartype::Binary, Vartype::Spin) => self.binary_to_spin(),
            (Vartype::Spin, Vartype::Binary) => self.spin_to_binary(),
            _ => self.clone(),
        }
    }

    /// Spin-valued copy of this model
    pub fn to_spin(&self) -> Self {
        self.change_vartype(Vartype::Spin)
    }

    /// Binary-valued copy of this model
    pub fn to_binary(&self) -> Self {
        self.change_vartype(Vartype::Binary)
    }

    // x = (s + 1) / 2
    fn binary_to_spin(&self) -> Self {
        let mut spin = Self::new(Vartype::Spin);
        spin.offset = self.offset;

        for (&v, &bias) in &self.linear {
            spin.add_variable(v, bias / 2.0);
            spin.offset += bias / 2.0;
        }
        for (&(u, v), &bias) in &self.quadratic {
            spin.add_interaction(u, v, bias / 4.0);
            spin.add_variable(u, bias / 4.0);
            spin.add_variable(v, bias / 4.0);
            spin.offset += bias / 4.0;
        }

        spin
    }

    // s = 2x - 1
    fn spin_to_binary(&self) -> Self {
        let mut binary = Self::new(Vartype::Binary);
        binary.offset = self.offset;

        for (&v, &bias) in &self.linear {
            binary.add_variable(v, 2.0 * bias);
            binary.offset -= bias;
        }
        for (&(u, v), &bias) in &self.quadratic {
            binary.add_interaction(u, v, 4.0 * bias);
            binary.add_variable(u, -2.0 * bias);
            binary.add_variable(v, -2.0 * bias);
            binary.offset += bias;
        }

        binary
    }

    /// Neighbours of every variable, including isolated ones
    pub fn adjacency(&self) -> BTreeMap<V, BTreeSet<V>> {
        let mut adjacency: BTreeMap<V, BTreeSet<V>> =
            self.linear.keys().map(|&v| (v, BTreeSet::new())).collect();

        for &(u, v) in self.quadratic.keys() {
            adjacency.entry(u).or_default().insert(v);
            adjacency.entry(v).or_default().insert(u);
        }

        adjacency
    }

    /// Interaction graph with one node per variable and one edge per stored interaction
    pub fn interaction_graph(&self) -> UnGraph<V, f64> {
        let mut graph = UnGraph::new_undirected();
        let mut nodes: HashMap<V, NodeIndex> = HashMap::with_capacity(self.linear.len());

        for &v in self.linear.keys() {
            nodes.insert(v, graph.add_node(v));
        }
        for (&(u, v), &bias) in &self.quadratic {
            graph.add_edge(nodes[&u], nodes[&v], bias);
        }

        graph
    }
}

fn ordered<V: Ord>(u: V, v: V) -> (V, V) {
    if u <= v {
        (u, v)
    } else {
        (v, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_model() -> BinaryQuadraticModel<Variable> {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_variable(Variable(0), 1.5);
        bqm.add_variable(Variable(1), -2.0);
        bqm.add_interaction(Variable(0), Variable(1), 3.0);
        bqm.add_interaction(Variable(2), Variable(1), -1.0);
        bqm
    }

    #[test]
    fn test_energy_scale_excludes_zero() {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_interaction(Variable(0), Variable(1), 0.0);
        bqm.add_interaction(Variable(1), Variable(2), 2.0);
        bqm.add_interaction(Variable(2), Variable(3), -5.0);
        bqm.add_interaction(Variable(3), Variable(0), 3.0);

        assert_eq!(bqm.energy_scale().unwrap(), (2.0, 5.0));
    }

    #[test]
    fn test_energy_scale_degenerate() {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_variable(Variable(0), 1.0);
        bqm.add_interaction(Variable(0), Variable(1), 0.0);

        assert!(matches!(
            bqm.energy_scale(),
            Err(RcmError::DegenerateModel(_))
        ));
    }

    #[test]
    fn test_interactions_are_unordered() {
        let bqm = sample_model();
        assert_eq!(bqm.quadratic(Variable(1), Variable(2)), Some(-1.0));
        assert_eq!(bqm.quadratic(Variable(2), Variable(1)), Some(-1.0));
        assert_eq!(bqm.linear(Variable(2)), Some(0.0));
        assert_eq!(bqm.num_variables(), 3);
    }

    #[test]
    fn test_vartype_conversion_preserves_energy() {
        let bqm = sample_model();
        let spin = bqm.to_spin();
        let back = spin.to_binary();

        for bits in 0..8u8 {
            let x = |v: Variable| ((bits >> v.index()) & 1) as i8;
            let s = |v: Variable| 2 * x(v) - 1;
            assert_relative_eq!(bqm.energy(x), spin.energy(s), epsilon = 1e-12);
            assert_relative_eq!(bqm.energy(x), back.energy(x), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_self_interaction_folds_into_linear() {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        bqm.add_interaction(Variable(4), Variable(4), 2.5);
        assert_eq!(bqm.linear(Variable(4)), Some(2.5));
        assert_eq!(bqm.num_interactions(), 0);
    }

    #[test]
    fn test_interaction_graph() {
        let graph = sample_model().interaction_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_vartype_parsing() {
        assert_eq!("binary".parse::<Vartype>().unwrap(), Vartype::Binary);
        assert_eq!("SPIN".parse::<Vartype>().unwrap(), Vartype::Spin);
        assert!("ternary".parse::<Vartype>().is_err());
    }
}
