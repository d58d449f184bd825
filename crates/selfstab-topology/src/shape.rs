//! Runtime-selected topology.

use std::fmt;
use std::str::FromStr;

use crate::{LineTopology, Neighbors, Result, RingTopology, Topology};

/// Which topology to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TopologyKind {
    /// Open-ended list
    #[default]
    Line,
    /// Closed cycle
    Ring,
}

impl fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyKind::Line => write!(f, "line"),
            TopologyKind::Ring => write!(f, "ring"),
        }
    }
}

impl FromStr for TopologyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" | "list" => Ok(TopologyKind::Line),
            "ring" | "cycle" => Ok(TopologyKind::Ring),
            other => Err(format!("unknown topology '{}' (expected line or ring)", other)),
        }
    }
}

/// A topology chosen at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape {
    Line(LineTopology),
    Ring(RingTopology),
}

impl Shape {
    /// Build a topology of the given kind over `len` positions.
    pub fn build(kind: TopologyKind, len: usize) -> Result<Self> {
        Ok(match kind {
            TopologyKind::Line => Shape::Line(LineTopology::new(len)?),
            TopologyKind::Ring => Shape::Ring(RingTopology::new(len)?),
        })
    }

    /// The kind this shape was built from.
    pub fn kind(&self) -> TopologyKind {
        match self {
            Shape::Line(_) => TopologyKind::Line,
            Shape::Ring(_) => TopologyKind::Ring,
        }
    }
}

impl Topology for Shape {
    fn len(&self) -> usize {
        match self {
            Shape::Line(t) => t.len(),
            Shape::Ring(t) => t.len(),
        }
    }

    fn neighbors(&self, index: usize) -> Option<Neighbors> {
        match self {
            Shape::Line(t) => t.neighbors(index),
            Shape::Ring(t) => t.neighbors(index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TopologyError;

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("Line".parse::<TopologyKind>(), Ok(TopologyKind::Line));
        assert_eq!(" ring ".parse::<TopologyKind>(), Ok(TopologyKind::Ring));
        assert!("mesh".parse::<TopologyKind>().is_err());
    }

    #[test]
    fn shape_delegates() {
        let line = Shape::build(TopologyKind::Line, 4).unwrap();
        let ring = Shape::build(TopologyKind::Ring, 4).unwrap();
        assert_eq!(line.kind(), TopologyKind::Line);
        assert_eq!(line.neighbors(0).unwrap().count(), 1);
        assert_eq!(ring.neighbors(0).unwrap().count(), 2);
    }

    #[test]
    fn empty_shape_rejected() {
        assert_eq!(Shape::build(TopologyKind::Ring, 0), Err(TopologyError::Empty));
    }
}
