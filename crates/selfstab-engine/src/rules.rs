//! Local neighborhood classification.
//!
//! The three repair rules depend only on how many present neighbors disagree
//! with the selected node and how its secondary compares to theirs. Both are
//! gathered in one pass into a [`LocalView`], whatever the neighbor count.
//!
//! # Rules
//!
//! | Neighborhood | Leader | Effect |
//! |--------------|--------|--------|
//! | all disagree | any    | flip primary (Rule 3) |
//! | all agree    | any    | nothing |
//! | mixed        | yes    | flip primary, secondary += max + M (Rule 2a) |
//! | mixed        | no     | secondary += 1 (Rule 2b) |
//!
//! A node with no neighbors is "all agree" (vacuously), never "all disagree".

use std::fmt;

use selfstab_topology::Topology;

use crate::error::Result;
use crate::node::Primary;
use crate::system::System;

/// How a node's primary relates to its present neighbors'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Neighborhood {
    /// Every present neighbor holds the other value (and at least one exists)
    AllDisagree,
    /// No present neighbor disagrees, including the no-neighbor case
    AllAgree,
    /// Some but not all present neighbors disagree
    Mixed,
}

impl Neighborhood {
    /// Classify from counts of disagreeing and present neighbors.
    pub const fn classify(disagreeing: usize, present: usize) -> Self {
        if disagreeing == 0 {
            Neighborhood::AllAgree
        } else if disagreeing >= present {
            Neighborhood::AllDisagree
        } else {
            Neighborhood::Mixed
        }
    }
}

/// Everything the rules need to know about one node and its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalView {
    /// The node's primary
    pub primary: Primary,
    /// The node's secondary
    pub secondary: u64,
    /// Number of present neighbors
    pub present: usize,
    /// Present neighbors whose primary differs
    pub disagreeing: usize,
    /// Largest neighbor secondary, `None` without neighbors
    pub max_neighbor_secondary: Option<u64>,
}

impl LocalView {
    /// Gather the view of node `index`.
    pub fn of<T: Topology>(system: &System<T>, index: usize) -> Result<Self> {
        let node = system.node(index)?;
        let mut view = Self {
            primary: node.primary(),
            secondary: node.secondary(),
            present: 0,
            disagreeing: 0,
            max_neighbor_secondary: None,
        };

        for neighbor in system.neighbors(index)? {
            let other = system.node(neighbor)?;
            view.present += 1;
            if other.primary() != view.primary {
                view.disagreeing += 1;
            }
            view.max_neighbor_secondary = view.max_neighbor_secondary.max(Some(other.secondary()));
        }

        Ok(view)
    }

    /// Classification of this neighborhood.
    pub const fn neighborhood(&self) -> Neighborhood {
        Neighborhood::classify(self.disagreeing, self.present)
    }

    /// Secondary at least every present neighbor's. Ties count as leader.
    pub fn is_leader(&self) -> bool {
        self.max_neighbor_secondary
            .map_or(true, |max| self.secondary >= max)
    }
}

/// Whether node `index` is a local leader.
pub fn is_leader<T: Topology>(system: &System<T>, index: usize) -> Result<bool> {
    Ok(LocalView::of(system, index)?.is_leader())
}

/// Largest secondary among the present neighbors of `index`.
pub fn max_neighbor_secondary<T: Topology>(
    system: &System<T>,
    index: usize,
) -> Result<Option<u64>> {
    Ok(LocalView::of(system, index)?.max_neighbor_secondary)
}

/// Which rule fired on a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "rule", rename_all = "snake_case"))]
pub enum RuleOutcome {
    /// Rule 3: surrounded by disagreement, primary flipped
    ForcedFlip,
    /// Locally consistent, nothing changed
    Stable,
    /// Rule 2a: leader flipped and raised its secondary
    LeaderResolved { raised_by: u64 },
    /// Rule 2b: non-leader raised its secondary by one
    Contained,
}

impl RuleOutcome {
    /// Whether the node's primary changed.
    pub const fn changed_primary(&self) -> bool {
        matches!(self, RuleOutcome::ForcedFlip | RuleOutcome::LeaderResolved { .. })
    }

    /// Whether the node's secondary changed.
    pub const fn changed_secondary(&self) -> bool {
        matches!(self, RuleOutcome::LeaderResolved { .. } | RuleOutcome::Contained)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::ForcedFlip => write!(f, "forced_flip"),
            RuleOutcome::Stable => write!(f, "stable"),
            RuleOutcome::LeaderResolved { raised_by } => {
                write!(f, "leader_resolved(+{})", raised_by)
            }
            RuleOutcome::Contained => write!(f, "contained"),
        }
    }
}
