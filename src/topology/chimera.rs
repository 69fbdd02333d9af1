//! Chimera lattice generation
//!
//! A Chimera lattice `C(m, n, t)` is an `m x n` grid of complete bipartite
//! `K(t, t)` unit cells. Shore `u = 0` qubits couple vertically to the same
//! position in the cell below; shore `u = 1` qubits couple horizontally to
//! the cell on the right. Qubits use the linear index
//! `((row * n + column) * 2 + u) * t + k`.

use crate::topology::{Qubit, Topology, TopologyFamily, TopologyMetadata};
use crate::{RcmError, Result};
use serde::{Deserialize, Serialize};

/// Default unit-cell shore size of production Chimera annealers
pub const DEFAULT_TILE: usize = 4;

/// Chimera lattice dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChimeraShape {
    /// Number of unit-cell rows
    pub rows: usize,
    /// Number of unit-cell columns
    pub columns: usize,
    /// Qubits per shore of a unit cell
    pub tile: usize,
}

/// Position of a qubit within a Chimera lattice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChimeraCoordinate {
    pub row: usize,
    pub column: usize,
    pub shore: usize,
    pub index: usize,
}

impl ChimeraShape {
    /// Create a shape, rejecting empty lattices
    pub fn new(rows: usize, columns: usize, tile: usize) -> Result<Self> {
        if rows == 0 || columns == 0 || tile == 0 {
            return Err(RcmError::topology_error(format!(
                "Chimera dimensions must be positive, got {}x{}x{}",
                rows, columns, tile
            )));
        }
        Ok(Self { rows, columns, tile })
    }

    /// Square lattice with the default tile
    pub fn square(size: usize) -> Result<Self> {
        Self::new(size, size, DEFAULT_TILE)
    }

    /// Total number of qubits
    pub fn qubit_count(&self) -> usize {
        self.rows * self.columns * 2 * self.tile
    }

    /// Total number of couplers
    pub fn coupler_count(&self) -> usize {
        let internal = self.rows * self.columns * self.tile * self.tile;
        let vertical = self.rows.saturating_sub(1) * self.columns * self.tile;
        let horizontal = self.rows * self.columns.saturating_sub(1) * self.tile;
        internal + vertical + horizontal
    }

    /// Linear qubit index of a coordinate
    pub fn linear_index(&self, c: ChimeraCoordinate) -> Qubit {
        Qubit(((c.row * self.columns + c.column) * 2 + c.shore) * self.tile + c.index)
    }

    /// Coordinate of a linear qubit index
    pub fn coordinate(&self, qubit: Qubit) -> Option<ChimeraCoordinate> {
        if qubit.index() >= self.qubit_count() {
            return None;
        }

        let q = qubit.index();
        let index = q % self.tile;
        let shore = (q / self.tile) % 2;
        let cell = q / (2 * self.tile);

        Some(ChimeraCoordinate {
            row: cell / self.columns,
            column: cell % self.columns,
            shore,
            index,
        })
    }

    /// Build the lattice topology
    pub fn build(&self) -> Result<Topology> {
        let mut topology = Topology::new();
        topology.set_metadata(TopologyMetadata {
            name: format!("chimera_{}x{}x{}", self.rows, self.columns, self.tile),
            family: TopologyFamily::Chimera,
            shape: Some(*self),
        });

        let cells = (0..self.rows)
            .flat_map(|row| (0..self.columns).map(move |column| (row, column)));

        for (row, column) in cells.clone() {
            for shore in 0..2 {
                for index in 0..self.tile {
                    let coordinate = ChimeraCoordinate { row, column, shore, index };
                    topology.add_qubit(self.linear_index(coordinate), Some(coordinate))?;
                }
            }
        }

        for (row, column) in cells {
            let at = |shore, index| {
                self.linear_index(ChimeraCoordinate {
                    row,
                    column,
                    shore,
                    index,
                })
            };

            // Intra-cell K(t, t)
            for k0 in 0..self.tile {
                for k1 in 0..self.tile {
                    topology.add_connection(at(0, k0), at(1, k1))?;
                }
            }

            for index in 0..self.tile {
                if row + 1 < self.rows {
                    let below = self.linear_index(ChimeraCoordinate {
                        row: row + 1,
                        column,
                        shore: 0,
                        index,
                    });
                    topology.add_connection(at(0, index), below)?;
                }
                if column + 1 < self.columns {
                    let right = self.linear_index(ChimeraCoordinate {
                        row,
                        column: column + 1,
                        shore: 1,
                        index,
                    });
                    topology.add_connection(at(1, index), right)?;
                }
            }
        }

        Ok(topology)
    }
}

/// Build a `C(rows, columns, tile)` Chimera lattice
pub fn chimera(rows: usize, columns: usize, tile: usize) -> Result<Topology> {
    ChimeraShape::new(rows, columns, tile)?.build()
}
