//! Present-neighbor sets.
//!
//! A position has a left and a right slot, either of which may be empty.
//! Rules downstream never branch on which slots are filled; they iterate
//! whatever is present.

use crate::{Topology, MAX_NEIGHBORS};

/// The present neighbors of one position, as indices into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbors {
    /// Neighbor on the lower-index side
    pub left: Option<usize>,
    /// Neighbor on the higher-index side
    pub right: Option<usize>,
}

impl Neighbors {
    /// No neighbors (a system of one position).
    pub const NONE: Self = Self { left: None, right: None };

    /// Build a neighbor set. A right neighbor equal to the left one is dropped,
    /// so a two-position ring reports a single neighbor.
    pub fn new(left: Option<usize>, right: Option<usize>) -> Self {
        let right = match (left, right) {
            (Some(l), Some(r)) if l == r => None,
            _ => right,
        };
        Self { left, right }
    }

    /// Present neighbor indices, left first.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.left.into_iter().chain(self.right)
    }

    /// Number of present neighbors (0, 1 or 2).
    pub fn count(&self) -> usize {
        self.left.is_some() as usize + self.right.is_some() as usize
    }

    /// True when no neighbor is present.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// True when the set has every slot filled.
    pub fn is_full(&self) -> bool {
        self.count() == MAX_NEIGHBORS
    }

    /// Check whether `index` is one of the present neighbors.
    pub fn contains(&self, index: usize) -> bool {
        self.left == Some(index) || self.right == Some(index)
    }
}

impl IntoIterator for Neighbors {
    type Item = usize;
    type IntoIter = std::iter::Chain<std::option::IntoIter<usize>, std::option::IntoIter<usize>>;

    fn into_iter(self) -> Self::IntoIter {
        self.left.into_iter().chain(self.right)
    }
}

/// Check if two positions are adjacent in `topology`.
///
/// Out-of-range positions are never adjacent to anything.
pub fn are_neighbors<T: Topology + ?Sized>(topology: &T, a: usize, b: usize) -> bool {
    topology
        .neighbors(a)
        .map(|n| n.contains(b))
        .unwrap_or(false)
}

/// Count positions that have fewer than two neighbors.
pub fn count_boundary<T: Topology + ?Sized>(topology: &T) -> usize {
    (0..topology.len())
        .filter_map(|i| topology.neighbors(i))
        .filter(|n| !n.is_full())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LineTopology, RingTopology};

    #[test]
    fn iter_is_left_then_right() {
        let n = Neighbors::new(Some(3), Some(5));
        assert_eq!(n.iter().collect::<Vec<_>>(), vec![3, 5]);
        assert_eq!(n.count(), 2);
        assert!(n.is_full());
    }

    #[test]
    fn duplicate_right_collapses() {
        let n = Neighbors::new(Some(1), Some(1));
        assert_eq!(n.count(), 1);
        assert_eq!(n.iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn none_is_empty() {
        assert!(Neighbors::NONE.is_empty());
        assert_eq!(Neighbors::NONE.iter().count(), 0);
    }

    #[test]
    fn only_right_present() {
        let n = Neighbors::new(None, Some(1));
        assert!(n.contains(1));
        assert!(!n.contains(0));
        assert_eq!(n.into_iter().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn neighbor_relation_symmetric() {
        let line = LineTopology::new(6).unwrap();
        for a in 0..6 {
            for b in 0..6 {
                assert_eq!(are_neighbors(&line, a, b), are_neighbors(&line, b, a));
            }
        }
    }

    #[test]
    fn out_of_range_never_adjacent() {
        let line = LineTopology::new(3).unwrap();
        assert!(!are_neighbors(&line, 2, 3));
        assert!(!are_neighbors(&line, 7, 6));
    }

    #[test]
    fn boundary_counts() {
        assert_eq!(count_boundary(&LineTopology::new(1).unwrap()), 1);
        assert_eq!(count_boundary(&LineTopology::new(2).unwrap()), 2);
        assert_eq!(count_boundary(&LineTopology::new(10).unwrap()), 2);
        assert_eq!(count_boundary(&RingTopology::new(10).unwrap()), 0);
    }
}
