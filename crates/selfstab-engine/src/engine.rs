//! The stabilization engine: one local repair step per call.

use selfstab_topology::Topology;
use tracing::trace;

use crate::config::Params;
use crate::error::Result;
use crate::rules::{LocalView, Neighborhood, RuleOutcome};
use crate::system::System;

/// Applies the repair rules to a selected node.
///
/// Stateless apart from the protocol constants; all state lives in the
/// [`System`] passed to [`step`](Self::step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StabilizationEngine {
    params: Params,
}

impl StabilizationEngine {
    /// Engine using the given constants.
    pub fn new(params: Params) -> Self {
        Self { params }
    }

    /// The constants in use.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Classify node `index` and apply exactly one rule to it.
    ///
    /// Only node `index` is ever mutated. The only error is an out-of-range
    /// index.
    ///
    /// # Examples
    ///
    /// ```
    /// use selfstab_engine::{FaultInjector, Params, RuleOutcome, StabilizationEngine, System};
    ///
    /// let mut system = System::new(3i64, &Params::default()).unwrap();
    /// FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();
    ///
    /// let engine = StabilizationEngine::default();
    /// assert_eq!(engine.step(&mut system, 1).unwrap(), RuleOutcome::ForcedFlip);
    /// assert!(system.is_legal());
    /// ```
    pub fn step<T: Topology>(&self, system: &mut System<T>, index: usize) -> Result<RuleOutcome> {
        let view = LocalView::of(system, index)?;

        let outcome = match view.neighborhood() {
            Neighborhood::AllDisagree => {
                system.flip(index)?;
                RuleOutcome::ForcedFlip
            }
            Neighborhood::AllAgree => RuleOutcome::Stable,
            Neighborhood::Mixed if view.is_leader() => {
                // Mixed implies at least two present neighbors.
                let max = view.max_neighbor_secondary.unwrap_or(view.secondary);
                let raised_by = max.saturating_add(self.params.leader_margin);
                system.flip(index)?;
                system.raise_secondary(index, raised_by)?;
                RuleOutcome::LeaderResolved { raised_by }
            }
            Neighborhood::Mixed => {
                system.raise_secondary(index, 1)?;
                RuleOutcome::Contained
            }
        };

        trace!(
            index,
            rule = %outcome,
            disagreeing = view.disagreeing,
            present = view.present,
            "rule applied"
        );
        Ok(outcome)
    }
}
