//! The node arena: every node's state plus the fixed neighbor relation.
//!
//! Nodes live in one contiguous `Vec` addressed by position. Neighbors are
//! looked up through the topology by index and are never owned or copied.
//!
//! The store also keeps a running count of nodes whose primary differs from
//! node 0, so legality is an O(1) question instead of a rescan.

use std::fmt;

use selfstab_topology::{LineTopology, Neighbors, Topology};

use crate::config::{Params, SystemSize};
use crate::error::{Error, Result};
use crate::node::{Node, Primary};

/// All nodes of a simulated system and their neighbor relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct System<T = LineTopology> {
    topology: T,
    nodes: Vec<Node>,
    /// Nodes `1..` whose primary differs from node 0's
    disagreements: usize,
}

impl System<LineTopology> {
    /// Build a line of `size` nodes, each with primary 0 and the configured
    /// initial secondary.
    ///
    /// # Examples
    ///
    /// ```
    /// use selfstab_engine::{Params, System};
    ///
    /// let system = System::new(3i64, &Params::default()).unwrap();
    /// assert_eq!(system.len(), 3);
    /// assert!(system.is_legal());
    /// assert!(System::new(0i64, &Params::default()).is_err());
    /// ```
    pub fn new<S>(size: S, params: &Params) -> Result<Self>
    where
        S: TryInto<SystemSize, Error = Error>,
    {
        let size = size.try_into()?;
        Self::with_topology(LineTopology::new(size.get())?, params)
    }
}

impl<T: Topology> System<T> {
    /// Build a uniform system over an existing topology.
    pub fn with_topology(topology: T, params: &Params) -> Result<Self> {
        let size = SystemSize::try_from(topology.len())?;
        let nodes = vec![Node::new(Primary::Zero, params.initial_secondary); size.get()];
        Ok(Self {
            topology,
            nodes,
            disagreements: 0,
        })
    }

    /// Build a system from arbitrary node states, one per topology position.
    pub fn from_nodes(topology: T, nodes: Vec<Node>) -> Result<Self> {
        SystemSize::try_from(topology.len())?;
        if nodes.len() != topology.len() {
            return Err(Error::InvalidConfig(format!(
                "{} nodes supplied for a topology of {} positions",
                nodes.len(),
                topology.len()
            )));
        }
        let disagreements = count_disagreements(&nodes);
        Ok(Self {
            topology,
            nodes,
            disagreements,
        })
    }

    /// Number of nodes (always at least one).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a system holds at least one node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node count as a validated size.
    pub fn size(&self) -> SystemSize {
        // Constructors reject empty topologies.
        SystemSize::try_from(self.nodes.len()).unwrap_or(SystemSize::ONE)
    }

    /// The neighbor relation.
    pub fn topology(&self) -> &T {
        &self.topology
    }

    /// All nodes in position order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The node at `index`.
    pub fn node(&self, index: usize) -> Result<&Node> {
        self.nodes.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    /// Present neighbors of `index`.
    pub fn neighbors(&self, index: usize) -> Result<Neighbors> {
        Ok(self.topology.try_neighbors(index)?)
    }

    /// Primaries in position order.
    pub fn primaries(&self) -> Vec<Primary> {
        self.nodes.iter().map(Node::primary).collect()
    }

    /// Secondaries in position order.
    pub fn secondaries(&self) -> Vec<u64> {
        self.nodes.iter().map(Node::secondary).collect()
    }

    /// Current primaries, ready to print.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.primaries())
    }

    /// Number of nodes whose primary differs from node 0's.
    pub fn disagreements(&self) -> usize {
        self.disagreements
    }

    /// Legality from the running counter.
    pub fn is_legal(&self) -> bool {
        debug_assert_eq!(self.disagreements, count_disagreements(&self.nodes));
        self.disagreements == 0
    }

    /// Flip the primary of `index`, keeping the disagreement counter current.
    pub(crate) fn flip(&mut self, index: usize) -> Result<()> {
        let len = self.nodes.len();
        let node = self
            .nodes
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        node.flip();

        if index == 0 {
            // Every other node's relation to the reference inverts.
            self.disagreements = (len - 1) - self.disagreements;
        } else if self.nodes[index].agrees_with(&self.nodes[0]) {
            self.disagreements -= 1;
        } else {
            self.disagreements += 1;
        }
        Ok(())
    }

    /// Raise the secondary of `index` by `by`.
    pub(crate) fn raise_secondary(&mut self, index: usize, by: u64) -> Result<()> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?
            .raise_secondary(by);
        Ok(())
    }
}

fn count_disagreements(nodes: &[Node]) -> usize {
    match nodes.split_first() {
        Some((reference, rest)) => rest.iter().filter(|n| !n.agrees_with(reference)).count(),
        None => 0,
    }
}

/// Ordered primaries at one point in time.
///
/// Displays as space-separated `0`/`1` tokens with no trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Snapshot {
    primaries: Vec<Primary>,
}

impl Snapshot {
    /// Wrap a primary sequence.
    pub fn new(primaries: Vec<Primary>) -> Self {
        Self { primaries }
    }

    /// The primaries in position order.
    pub fn primaries(&self) -> &[Primary] {
        &self.primaries
    }

    /// Number of nodes captured.
    pub fn len(&self) -> usize {
        self.primaries.len()
    }

    /// True for an empty snapshot (only the `Default` one).
    pub fn is_empty(&self) -> bool {
        self.primaries.is_empty()
    }

    /// Primaries as 0/1 bytes.
    pub fn to_bits(&self) -> Vec<u8> {
        self.primaries.iter().map(|p| p.as_u8()).collect()
    }

    /// Whether every captured primary is the same.
    pub fn is_uniform(&self) -> bool {
        self.primaries.windows(2).all(|w| w[0] == w[1])
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for p in &self.primaries {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}", p)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use selfstab_topology::RingTopology;

    fn nodes(bits: &[u8]) -> Vec<Node> {
        bits.iter()
            .map(|&b| Node::new(Primary::try_from(b).unwrap(), 5))
            .collect()
    }

    #[test]
    fn new_system_is_uniform() {
        let system = System::new(4i64, &Params::default()).unwrap();
        assert_eq!(system.primaries(), vec![Primary::Zero; 4]);
        assert_eq!(system.secondaries(), vec![5; 4]);
        assert!(system.is_legal());
    }

    #[test]
    fn invalid_sizes_rejected() {
        assert_eq!(
            System::new(0i64, &Params::default()),
            Err(Error::InvalidSize { requested: 0 })
        );
        assert_eq!(
            System::new(-2i64, &Params::default()),
            Err(Error::InvalidSize { requested: -2 })
        );
    }

    #[test]
    fn neighbors_follow_line() {
        let system = System::new(3usize, &Params::default()).unwrap();
        assert_eq!(system.neighbors(0).unwrap().count(), 1);
        assert_eq!(system.neighbors(1).unwrap().count(), 2);
        assert_eq!(system.neighbors(2).unwrap().count(), 1);
        assert_eq!(
            system.neighbors(3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn single_node_has_no_neighbors() {
        let system = System::new(1i64, &Params::default()).unwrap();
        assert!(system.neighbors(0).unwrap().is_empty());
        assert!(system.is_legal());
    }

    #[test]
    fn from_nodes_checks_length() {
        let line = LineTopology::new(3).unwrap();
        assert!(System::from_nodes(line, nodes(&[0, 1])).is_err());
        let system = System::from_nodes(line, nodes(&[0, 1, 1])).unwrap();
        assert_eq!(system.disagreements(), 2);
    }

    #[test]
    fn flip_tracks_disagreements() {
        let mut system = System::new(4i64, &Params::default()).unwrap();
        system.flip(2).unwrap();
        assert_eq!(system.disagreements(), 1);
        system.flip(0).unwrap();
        assert_eq!(system.snapshot().to_bits(), vec![1, 0, 1, 0]);
        assert_eq!(system.disagreements(), 2);
        system.flip(2).unwrap();
        assert_eq!(system.disagreements(), 3);
        assert!(!system.is_legal());
    }

    #[test]
    fn flip_out_of_range() {
        let mut system = System::new(2i64, &Params::default()).unwrap();
        assert_eq!(
            system.flip(2),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(system.disagreements(), 0);
    }

    #[test]
    fn raise_only_touches_target() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        system.raise_secondary(1, 7).unwrap();
        assert_eq!(system.secondaries(), vec![5, 12, 5]);
    }

    #[test]
    fn ring_system() {
        let ring = RingTopology::new(5).unwrap();
        let system = System::with_topology(ring, &Params::default()).unwrap();
        for i in 0..5 {
            assert!(system.neighbors(i).unwrap().is_full());
        }
    }

    #[test]
    fn snapshot_display() {
        let line = LineTopology::new(4).unwrap();
        let system = System::from_nodes(line, nodes(&[0, 1, 1, 0])).unwrap();
        assert_eq!(system.snapshot().to_string(), "0 1 1 0");
        assert!(!system.snapshot().is_uniform());
        assert_eq!(Snapshot::default().to_string(), "");
    }
}
