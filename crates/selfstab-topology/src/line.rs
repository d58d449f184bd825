//! Line (list) topology.
//!
//! Position `i` is adjacent to `i - 1` and `i + 1` where they exist:
//!
//! ```text
//! 0 ── 1 ── 2 ── ... ── N-1
//! ```

use crate::{Neighbors, Result, Topology, TopologyError};

/// Positions `0..len` arranged in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineTopology {
    len: usize,
}

impl LineTopology {
    /// Create a line of `len` positions.
    ///
    /// # Examples
    ///
    /// ```
    /// use selfstab_topology::{LineTopology, Topology};
    ///
    /// let line = LineTopology::new(3).unwrap();
    /// assert_eq!(line.neighbors(0).unwrap().count(), 1);
    /// assert_eq!(line.neighbors(1).unwrap().count(), 2);
    /// assert!(LineTopology::new(0).is_err());
    /// ```
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(TopologyError::Empty);
        }
        Ok(Self { len })
    }
}

impl Topology for LineTopology {
    fn len(&self) -> usize {
        self.len
    }

    fn neighbors(&self, index: usize) -> Option<Neighbors> {
        if index >= self.len {
            return None;
        }
        let left = index.checked_sub(1);
        let right = (index + 1 < self.len).then_some(index + 1);
        Some(Neighbors::new(left, right))
    }
}
