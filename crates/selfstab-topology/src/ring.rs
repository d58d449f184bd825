//! Ring topology: a line whose ends are joined.

use crate::{Neighbors, Result, Topology, TopologyError};

/// Positions `0..len` arranged in a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingTopology {
    len: usize,
}

impl RingTopology {
    /// Create a ring of `len` positions.
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(TopologyError::Empty);
        }
        Ok(Self { len })
    }
}

impl Topology for RingTopology {
    fn len(&self) -> usize {
        self.len
    }

    fn neighbors(&self, index: usize) -> Option<Neighbors> {
        if index >= self.len {
            return None;
        }
        if self.len == 1 {
            return Some(Neighbors::NONE);
        }
        let left = (index + self.len - 1) % self.len;
        let right = (index + 1) % self.len;
        Some(Neighbors::new(Some(left), Some(right)))
    }
}
