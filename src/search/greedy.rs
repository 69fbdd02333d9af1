//! Greedy chain-growing embedding heuristic
//!
//! Each attempt places problem variables one at a time in a randomised
//! breadth-first order. A variable with no placed neighbours takes a single
//! free qubit; otherwise the free qubit closest to all placed neighbour
//! chains becomes its root and the shortest free paths back to those chains
//! become its chain. Successful attempts then rip up and reroute every chain,
//! keeping a reroute only when it does not grow the chain.
//!
//! Stands in for a dedicated minor-embedding library behind the
//! [`EmbeddingOracle`] seam; the size search does not depend on its internals.

use crate::embedding::Embedding;
use crate::qubo::Variable;
use crate::search::{EmbeddingOracle, SearchParams, SourceGraph};
use crate::topology::Topology;
use crate::{RcmError, Result};
use log::debug;
use petgraph::graph::NodeIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::{BTreeSet, VecDeque};

const UNREACHABLE: usize = usize::MAX;

/// Randomised greedy minor-embedding oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GreedyChainOracle {
    /// Rip-up-and-reroute passes after a successful placement
    pub refinement_rounds: usize,
}

impl Default for GreedyChainOracle {
    fn default() -> Self {
        Self {
            refinement_rounds: 2,
        }
    }
}

impl GreedyChainOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of refinement passes
    pub fn with_refinement_rounds(mut self, rounds: usize) -> Self {
        self.refinement_rounds = rounds;
        self
    }

    /// Run a single seeded attempt, returning chains per source node
    fn attempt(
        &self,
        problem: &[Vec<usize>],
        target: &[Vec<usize>],
        seed: u64,
    ) -> Option<Vec<Vec<usize>>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let order = placement_order(problem, &mut rng);
        let mut placement = Placement::new(problem.len(), target);

        for &var in &order {
            if !placement.place(var, &problem[var], &mut rng) {
                return None;
            }
        }

        for _ in 0..self.refinement_rounds {
            for &var in &order {
                let previous = placement.release(var);
                let improved = placement.place(var, &problem[var], &mut rng)
                    && placement.chains[var].len() <= previous.len();

                if !improved {
                    placement.release(var);
                    placement.claim(var, previous);
                }
            }
        }

        Some(placement.chains)
    }
}

impl EmbeddingOracle for GreedyChainOracle {
    fn find_embedding(
        &self,
        source: &SourceGraph,
        target: &Topology,
        params: &SearchParams,
    ) -> Result<Embedding> {
        let variables: Vec<Variable> = source.node_indices().map(|n| source[n]).collect();
        let problem = problem_adjacency(source);
        let (qubits, target_adjacency) = target.index_adjacency();

        if variables.len() > qubits.len() {
            debug!(
                "{} variables cannot fit on {} qubits",
                variables.len(),
                qubits.len()
            );
            return Ok(Embedding::new());
        }

        let base_seed = params.seed.unwrap_or_else(rand::random);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(params.threads)
            .build()
            .map_err(|e| RcmError::embedding_error(format!("Failed to start worker pool: {}", e)))?;

        let attempts: Vec<(usize, Vec<Vec<usize>>)> = pool.install(|| {
            (0..params.tries)
                .into_par_iter()
                .filter_map(|attempt| {
                    let seed = base_seed.wrapping_add(attempt as u64);
                    self.attempt(&problem, &target_adjacency, seed)
                        .map(|chains| (attempt, chains))
                })
                .collect()
        });

        debug!(
            "{} of {} attempts embedded {} variables on {}",
            attempts.len(),
            params.tries,
            variables.len(),
            target.metadata().name
        );

        let best = attempts
            .into_iter()
            .min_by_key(|(attempt, chains)| (chains.iter().map(Vec::len).sum::<usize>(), *attempt));

        let mut embedding = Embedding::new();
        if let Some((_, chains)) = best {
            for (var, chain) in chains.into_iter().enumerate() {
                embedding.insert(variables[var], chain.into_iter().map(|q| qubits[q]));
            }
        }
        Ok(embedding)
    }
}

/// Deduplicated neighbour lists of the source graph, self-loops dropped
fn problem_adjacency(source: &SourceGraph) -> Vec<Vec<usize>> {
    source
        .node_indices()
        .map(|n| {
            let neighbors: BTreeSet<usize> = source
                .neighbors(n)
                .filter(|&m| m != n)
                .map(NodeIndex::index)
                .collect();
            neighbors.into_iter().collect()
        })
        .collect()
}

/// Breadth-first order over every component, with shuffled starts and fronts
fn placement_order<R: Rng>(problem: &[Vec<usize>], rng: &mut R) -> Vec<usize> {
    let mut starts: Vec<usize> = (0..problem.len()).collect();
    starts.shuffle(rng);

    let mut visited = vec![false; problem.len()];
    let mut order = Vec::with_capacity(problem.len());
    let mut queue = VecDeque::new();

    for start in starts {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);

        while let Some(var) = queue.pop_front() {
            order.push(var);
            let mut next: Vec<usize> = problem[var]
                .iter()
                .copied()
                .filter(|&u| !visited[u])
                .collect();
            next.shuffle(rng);
            for u in next {
                visited[u] = true;
                queue.push_back(u);
            }
        }
    }

    order
}

/// Partial assignment of chains to target qubits
struct Placement<'a> {
    target: &'a [Vec<usize>],
    owner: Vec<Option<usize>>,
    chains: Vec<Vec<usize>>,
}

impl<'a> Placement<'a> {
    fn new(variables: usize, target: &'a [Vec<usize>]) -> Self {
        Self {
            target,
            owner: vec![None; target.len()],
            chains: vec![Vec::new(); variables],
        }
    }

    fn is_free(&self, qubit: usize) -> bool {
        self.owner[qubit].is_none()
    }

    fn free_degree(&self, qubit: usize) -> usize {
        self.target[qubit].iter().filter(|&&q| self.is_free(q)).count()
    }

    fn claim(&mut self, var: usize, chain: Vec<usize>) {
        for &q in &chain {
            self.owner[q] = Some(var);
        }
        self.chains[var] = chain;
    }

    fn release(&mut self, var: usize) -> Vec<usize> {
        let chain = std::mem::take(&mut self.chains[var]);
        for &q in &chain {
            self.owner[q] = None;
        }
        chain
    }

    /// Distances through free qubits from the chain of `var`
    ///
    /// A free qubit adjacent to the chain has distance 1. Parents lead back
    /// towards the chain.
    fn search_from(&self, var: usize) -> (Vec<usize>, Vec<Option<usize>>) {
        let mut dist = vec![UNREACHABLE; self.target.len()];
        let mut parent = vec![None; self.target.len()];
        let mut queue = VecDeque::new();

        for &q in &self.chains[var] {
            for &n in &self.target[q] {
                if self.is_free(n) && dist[n] == UNREACHABLE {
                    dist[n] = 1;
                    queue.push_back(n);
                }
            }
        }

        while let Some(q) = queue.pop_front() {
            for &n in &self.target[q] {
                if self.is_free(n) && dist[n] == UNREACHABLE {
                    dist[n] = dist[q] + 1;
                    parent[n] = Some(q);
                    queue.push_back(n);
                }
            }
        }

        (dist, parent)
    }

    /// Give `var` a chain touching every placed neighbour, if one exists
    fn place<R: Rng>(&mut self, var: usize, neighbors: &[usize], rng: &mut R) -> bool {
        let free: Vec<usize> = (0..self.target.len()).filter(|&q| self.is_free(q)).collect();
        let placed: Vec<usize> = neighbors
            .iter()
            .copied()
            .filter(|&u| !self.chains[u].is_empty())
            .collect();

        if placed.is_empty() {
            let Some(best) = free.iter().map(|&q| self.free_degree(q)).max() else {
                return false;
            };
            let roomiest: Vec<usize> = free
                .iter()
                .copied()
                .filter(|&q| self.free_degree(q) == best)
                .collect();
            return match roomiest.choose(rng) {
                Some(&q) => {
                    self.claim(var, vec![q]);
                    true
                }
                None => false,
            };
        }

        let searches: Vec<_> = placed.iter().map(|&u| self.search_from(u)).collect();

        let mut best_cost = UNREACHABLE;
        let mut roots = Vec::new();
        for &q in &free {
            let cost = searches.iter().try_fold(0usize, |acc, (dist, _)| {
                (dist[q] != UNREACHABLE).then(|| acc + dist[q])
            });
            match cost {
                Some(cost) if cost < best_cost => {
                    best_cost = cost;
                    roots.clear();
                    roots.push(q);
                }
                Some(cost) if cost == best_cost => roots.push(q),
                _ => {}
            }
        }

        let Some(&root) = roots.choose(rng) else {
            return false;
        };

        let mut chain = BTreeSet::from([root]);
        for (_, parent) in &searches {
            let mut current = root;
            while let Some(next) = parent[current] {
                chain.insert(next);
                current = next;
            }
        }

        self.claim(var, chain.into_iter().collect());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::{BinaryQuadraticModel, Vartype};
    use crate::topology::chimera;

    fn complete(n: usize) -> BinaryQuadraticModel<Variable> {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        for u in 0..n {
            bqm.add_variable(Variable(u), 0.0);
            for v in (u + 1)..n {
                bqm.add_interaction(Variable(u), Variable(v), 1.0);
            }
        }
        bqm
    }

    fn params(tries: usize, threads: usize) -> SearchParams {
        SearchParams {
            tries,
            threads,
            seed: Some(11),
        }
    }

    #[test]
    fn test_triangle_embeds_validly() {
        let bqm = complete(3);
        let target = chimera(2, 2, 4).unwrap();
        let embedding = GreedyChainOracle::new()
            .find_embedding(&bqm.interaction_graph(), &target, &params(4, 1))
            .unwrap();

        assert_eq!(embedding.len(), 3);
        embedding.validate(&bqm, &target).unwrap();
        // A triangle cannot embed in a bipartite graph without a longer chain.
        assert!(embedding.max_chain_length() >= 2);
    }

    #[test]
    fn test_dense_problem_embeds_validly() {
        let bqm = complete(6);
        let target = chimera(3, 3, 4).unwrap();
        let embedding = GreedyChainOracle::new()
            .find_embedding(&bqm.interaction_graph(), &target, &params(10, 2))
            .unwrap();

        assert_eq!(embedding.len(), 6);
        embedding.validate(&bqm, &target).unwrap();
    }

    #[test]
    fn test_isolated_variables_take_one_qubit() {
        let mut bqm = BinaryQuadraticModel::new(Vartype::Binary);
        for v in 0..3 {
            bqm.add_variable(Variable(v), 1.0);
        }
        let target = chimera(1, 1, 4).unwrap();
        let embedding = GreedyChainOracle::new()
            .find_embedding(&bqm.interaction_graph(), &target, &params(1, 1))
            .unwrap();

        assert_eq!(embedding.len(), 3);
        assert_eq!(embedding.qubit_count(), 3);
    }

    #[test]
    fn test_too_many_variables() {
        let bqm = complete(9);
        let target = chimera(1, 1, 4).unwrap();
        let embedding = GreedyChainOracle::new()
            .find_embedding(&bqm.interaction_graph(), &target, &params(3, 1))
            .unwrap();
        assert!(embedding.is_empty());
    }

    #[test]
    fn test_seeded_result_independent_of_threads() {
        let bqm = complete(5);
        let graph = bqm.interaction_graph();
        let target = chimera(2, 2, 4).unwrap();
        let oracle = GreedyChainOracle::new();

        let single = oracle.find_embedding(&graph, &target, &params(6, 1)).unwrap();
        let parallel = oracle.find_embedding(&graph, &target, &params(6, 3)).unwrap();
        assert_eq!(single, parallel);
    }

    #[test]
    fn test_placement_order_covers_components() {
        let problem = vec![vec![1], vec![0], vec![], vec![4], vec![3]];
        let mut rng = StdRng::seed_from_u64(3);
        let mut order = placement_order(&problem, &mut rng);
        order.sort_unstable();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
