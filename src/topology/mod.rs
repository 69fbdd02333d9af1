//! Hardware topology abstraction
//!
//! Provides the graph representation of annealer connectivity, the Chimera
//! lattice generator used by the embedding-size search, and the solver
//! profiles the experiment runner resolves `solver_name` against.

pub mod chimera;
pub mod profile;

pub use chimera::*;
pub use profile::*;

use crate::{RcmError, Result};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

/// Physical qubit identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qubit(pub usize);

impl Qubit {
    /// Create a new qubit with the given index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the qubit index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for Qubit {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Qubit node properties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QubitNode {
    /// Qubit identifier
    pub qubit: Qubit,
    /// Lattice coordinate, when the topology is a Chimera lattice
    pub coordinate: Option<ChimeraCoordinate>,
}

/// Topology family classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TopologyFamily {
    /// Chimera lattice of bipartite unit cells
    Chimera,
    #[default]
    /// Custom/irregular topology
    Custom,
}

/// Topology metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyMetadata {
    /// Topology name
    pub name: String,
    /// Family classification
    pub family: TopologyFamily,
    /// Lattice shape for Chimera topologies
    pub shape: Option<ChimeraShape>,
}

/// Annealer connectivity graph
#[derive(Debug, Clone)]
pub struct Topology {
    /// Graph representation of qubit couplers
    graph: UnGraph<QubitNode, ()>,
    /// Mapping from qubit index to graph node
    qubit_to_node: HashMap<Qubit, NodeIndex>,
    /// Topology metadata
    metadata: TopologyMetadata,
}

impl Topology {
    /// Create a new empty topology
    pub fn new() -> Self {
        Self {
            graph: UnGraph::new_undirected(),
            qubit_to_node: HashMap::new(),
            metadata: TopologyMetadata::default(),
        }
    }

    /// Build a custom topology from a coupler list
    pub fn from_edges<I>(name: impl Into<String>, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Qubit, Qubit)>,
    {
        let mut topology = Self::new();
        topology.metadata.name = name.into();

        for (q1, q2) in edges {
            for qubit in [q1, q2] {
                if !topology.contains(qubit) {
                    topology.add_qubit(qubit, None)?;
                }
            }
            topology.add_connection(q1, q2)?;
        }

        Ok(topology)
    }

    /// Add a qubit to the topology
    pub fn add_qubit(&mut self, qubit: Qubit, coordinate: Option<ChimeraCoordinate>) -> Result<()> {
        if self.qubit_to_node.contains_key(&qubit) {
            return Err(RcmError::topology_error(format!(
                "Qubit {} already exists in topology",
                qubit
            )));
        }

        let node_idx = self.graph.add_node(QubitNode { qubit, coordinate });
        self.qubit_to_node.insert(qubit, node_idx);
        Ok(())
    }

    /// Add a coupler between two qubits
    pub fn add_connection(&mut self, qubit1: Qubit, qubit2: Qubit) -> Result<()> {
        if qubit1 == qubit2 {
            return Err(RcmError::topology_error(format!(
                "Qubit {} cannot be coupled to itself",
                qubit1
            )));
        }

        let node1 = self.node(qubit1)?;
        let node2 = self.node(qubit2)?;
        self.graph.update_edge(node1, node2, ());
        Ok(())
    }

    fn node(&self, qubit: Qubit) -> Result<NodeIndex> {
        self.qubit_to_node
            .get(&qubit)
            .copied()
            .ok_or_else(|| RcmError::topology_error(format!("Qubit {} not found", qubit)))
    }

    /// Get the number of qubits in the topology
    pub fn qubit_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of couplers in the topology
    pub fn connection_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check whether a qubit is present
    pub fn contains(&self, qubit: Qubit) -> bool {
        self.qubit_to_node.contains_key(&qubit)
    }

    /// Check if two qubits are coupled
    pub fn are_connected(&self, qubit1: Qubit, qubit2: Qubit) -> bool {
        match (self.qubit_to_node.get(&qubit1), self.qubit_to_node.get(&qubit2)) {
            (Some(&node1), Some(&node2)) => self.graph.find_edge(node1, node2).is_some(),
            _ => false,
        }
    }

    /// All qubits coupled to a given qubit, in ascending order
    pub fn neighbors(&self, qubit: Qubit) -> Vec<Qubit> {
        let Some(&node) = self.qubit_to_node.get(&qubit) else {
            return Vec::new();
        };

        let mut neighbors: Vec<Qubit> = self
            .graph
            .neighbors(node)
            .map(|neighbor| self.graph[neighbor].qubit)
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// All qubits in ascending order
    pub fn qubits(&self) -> Vec<Qubit> {
        let mut qubits: Vec<Qubit> = self.qubit_to_node.keys().copied().collect();
        qubits.sort_unstable();
        qubits
    }

    /// All couplers as ordered pairs, sorted
    pub fn edges(&self) -> Vec<(Qubit, Qubit)> {
        let mut edges: Vec<(Qubit, Qubit)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| {
                let (qa, qb) = (self.graph[a].qubit, self.graph[b].qubit);
                if qa < qb { (qa, qb) } else { (qb, qa) }
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Lattice coordinate of a qubit, if known
    pub fn coordinate(&self, qubit: Qubit) -> Option<ChimeraCoordinate> {
        let node = self.qubit_to_node.get(&qubit)?;
        self.graph[*node].coordinate
    }

    /// Get topology metadata
    pub fn metadata(&self) -> &TopologyMetadata {
        &self.metadata
    }

    /// Set topology metadata
    pub fn set_metadata(&mut self, metadata: TopologyMetadata) {
        self.metadata = metadata;
    }

    /// Calculate shortest path between two qubits
    pub fn shortest_path(&self, start: Qubit, end: Qubit) -> Option<Vec<Qubit>> {
        let start_node = *self.qubit_to_node.get(&start)?;
        let end_node = *self.qubit_to_node.get(&end)?;

        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();

        queue.push_back(start_node);
        visited.insert(start_node);

        while let Some(current) = queue.pop_front() {
            if current == end_node {
                let mut path = vec![self.graph[current].qubit];
                let mut node = current;
                while let Some(&parent_node) = parent.get(&node) {
                    path.push(self.graph[parent_node].qubit);
                    node = parent_node;
                }
                path.reverse();
                return Some(path);
            }

            for neighbor in self.graph.neighbors(current) {
                if visited.insert(neighbor) {
                    parent.insert(neighbor, current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    /// Check if a set of qubits forms a connected subgraph
    pub fn is_connected_subgraph(&self, qubits: &[Qubit]) -> bool {
        if qubits.is_empty() {
            return true;
        }

        let qubit_set: BTreeSet<_> = qubits.iter().copied().collect();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();

        queue.push_back(qubits[0]);
        visited.insert(qubits[0]);

        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors(current) {
                if qubit_set.contains(&neighbor) && visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        visited.len() == qubit_set.len()
    }

    /// Dense index-based adjacency lists, in ascending qubit order
    ///
    /// Returns the qubit at each index alongside the neighbour indices, for
    /// the inner loops of the oracle and the annealer.
    pub fn index_adjacency(&self) -> (Vec<Qubit>, Vec<Vec<usize>>) {
        let qubits = self.qubits();
        let position: HashMap<Qubit, usize> =
            qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();

        let adjacency = qubits
            .iter()
            .map(|&q| self.neighbors(q).iter().map(|n| position[n]).collect())
            .collect();

        (qubits, adjacency)
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new()
    }
}
