//! Self-Stabilization Topology
//!
//! Neighbor adjacency over a fixed number of positions `0..N`.
//!
//! # Model
//!
//! Nodes are stored in one contiguous arena owned by the engine. A topology
//! never owns nodes; it only answers "which positions are adjacent to `i`".
//! Every position has at most two neighbors:
//!
//! - **Line**: `i` is adjacent to `i - 1` and `i + 1` where they exist.
//!   Boundary positions have one neighbor, a single position has none.
//! - **Ring**: like the line, but the two ends are joined.
//!
//! The relation is fixed at construction. Nothing here resizes.

mod error;
mod line;
mod neighbors;
mod ring;
mod shape;

pub use error::{Result, TopologyError};
pub use line::LineTopology;
pub use neighbors::{are_neighbors, count_boundary, Neighbors};
pub use ring::RingTopology;
pub use shape::{Shape, TopologyKind};

/// Maximum neighbors any position can have.
pub const MAX_NEIGHBORS: usize = 2;

/// Adjacency over positions `0..len()`.
pub trait Topology {
    /// Number of positions.
    fn len(&self) -> usize;

    /// Present neighbors of `index`, or `None` if `index` is out of range.
    fn neighbors(&self, index: usize) -> Option<Neighbors>;

    /// Always false for a constructed topology; kept for API symmetry with `len`.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Like [`Topology::neighbors`], but reports an out-of-range index as an error.
    fn try_neighbors(&self, index: usize) -> Result<Neighbors> {
        self.neighbors(index).ok_or(TopologyError::IndexOutOfRange {
            index,
            len: self.len(),
        })
    }
}
