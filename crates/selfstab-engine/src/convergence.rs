//! Convergence loop: schedule, step, check, until legal.
//!
//! # State Machine
//!
//! ```text
//!            legal?
//!  Running ─────────▶ Legal (terminal)
//!     │  ▲
//!     └──┘ not legal: select index, apply one rule
//! ```
//!
//! Legality is tested before every step, so an already-legal system
//! converges in zero steps without consulting the scheduler.
//!
//! Termination is not proven for arbitrary fault patterns. A [`StepBound`]
//! turns a run that does not finish into [`Convergence::BoundExceeded`]
//! instead of an endless loop; tests should always use a finite bound.
//!
//! A recorded trace holds at most [`MAX_TRACE_LEN`] steps by default. Steps
//! past the limit are still counted in the tally but not kept, and the report
//! marks the trace as truncated.

use selfstab_topology::Topology;
use tracing::{debug, info, warn};

use crate::config::StepBound;
use crate::engine::StabilizationEngine;
use crate::error::Result;
use crate::rules::RuleOutcome;
use crate::scheduler::Schedule;
use crate::system::{Snapshot, System};

/// Default cap on recorded [`StepRecord`]s per run.
pub const MAX_TRACE_LEN: usize = 100_000;

/// Loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not yet legal; steps continue
    Running,
    /// All primaries agree
    Legal,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "result", rename_all = "snake_case"))]
pub enum Convergence {
    /// Legal after this many engine steps
    Converged { steps: u64 },
    /// Step cap hit while still illegal
    BoundExceeded { steps: u64 },
}

impl Convergence {
    /// Steps taken either way.
    pub fn steps(&self) -> u64 {
        match self {
            Convergence::Converged { steps } | Convergence::BoundExceeded { steps } => *steps,
        }
    }

    /// Whether the run reached a legal configuration.
    pub fn is_converged(&self) -> bool {
        matches!(self, Convergence::Converged { .. })
    }
}

/// How often each rule fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleTally {
    pub forced_flips: u64,
    pub stable: u64,
    pub leader_resolved: u64,
    pub contained: u64,
}

impl RuleTally {
    /// Count one outcome.
    pub fn record(&mut self, outcome: &RuleOutcome) {
        match outcome {
            RuleOutcome::ForcedFlip => self.forced_flips += 1,
            RuleOutcome::Stable => self.stable += 1,
            RuleOutcome::LeaderResolved { .. } => self.leader_resolved += 1,
            RuleOutcome::Contained => self.contained += 1,
        }
    }

    /// Total outcomes counted.
    pub fn total(&self) -> u64 {
        self.forced_flips + self.stable + self.leader_resolved + self.contained
    }
}

/// One traced engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    /// Zero-based step number
    pub step: u64,
    /// Node the scheduler selected
    pub index: usize,
    /// Rule that fired
    pub outcome: RuleOutcome,
}

/// Result of a convergence run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceReport {
    pub convergence: Convergence,
    pub tally: RuleTally,
    /// Primaries when the loop stopped
    pub final_snapshot: Snapshot,
    /// Every step, if tracing was enabled, up to the trace limit
    pub trace: Vec<StepRecord>,
    /// Steps were taken past the trace limit and not recorded
    pub trace_truncated: bool,
}

/// Drives scheduler and engine until the system is legal or the bound is hit.
#[derive(Debug, Clone)]
pub struct ConvergenceLoop {
    engine: StabilizationEngine,
    bound: StepBound,
    record_trace: bool,
    trace_limit: usize,
    trace_truncated: bool,
    steps: u64,
    tally: RuleTally,
    trace: Vec<StepRecord>,
}

impl ConvergenceLoop {
    /// New loop with no steps taken.
    pub fn new(engine: StabilizationEngine, bound: StepBound) -> Self {
        Self {
            engine,
            bound,
            record_trace: false,
            trace_limit: MAX_TRACE_LEN,
            trace_truncated: false,
            steps: 0,
            tally: RuleTally::default(),
            trace: Vec::new(),
        }
    }

    /// Keep a [`StepRecord`] for every step.
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }

    /// Keep at most `limit` step records; later steps are only tallied.
    pub fn with_trace_limit(mut self, limit: usize) -> Self {
        self.trace_limit = limit;
        self
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Rule counts so far.
    pub fn tally(&self) -> &RuleTally {
        &self.tally
    }

    /// One transition: report `Legal`, or take a step and stay `Running`.
    ///
    /// Ignores the step bound; [`run`](Self::run) enforces it.
    pub fn advance<T, S>(&mut self, system: &mut System<T>, scheduler: &mut S) -> Result<LoopState>
    where
        T: Topology,
        S: Schedule + ?Sized,
    {
        if system.is_legal() {
            return Ok(LoopState::Legal);
        }

        let index = scheduler.select();
        let outcome = self.engine.step(system, index)?;

        self.tally.record(&outcome);
        if self.record_trace {
            if self.trace.len() < self.trace_limit {
                self.trace.push(StepRecord {
                    step: self.steps,
                    index,
                    outcome,
                });
            } else {
                self.trace_truncated = true;
            }
        }
        self.steps += 1;

        Ok(LoopState::Running)
    }

    /// Run to a legal configuration or until the bound is reached.
    pub fn run<T, S>(
        mut self,
        system: &mut System<T>,
        scheduler: &mut S,
    ) -> Result<ConvergenceReport>
    where
        T: Topology,
        S: Schedule + ?Sized,
    {
        debug!(
            nodes = system.len(),
            disagreements = system.disagreements(),
            bound = ?self.bound,
            "convergence loop starting"
        );

        let convergence = loop {
            if system.is_legal() {
                break Convergence::Converged { steps: self.steps };
            }
            if !self.bound.allows(self.steps) {
                break Convergence::BoundExceeded { steps: self.steps };
            }
            self.advance(system, scheduler)?;
        };

        match convergence {
            Convergence::Converged { steps } => {
                info!(steps, tally = ?self.tally, "system legal");
            }
            Convergence::BoundExceeded { steps } => {
                warn!(
                    steps,
                    disagreements = system.disagreements(),
                    "step bound exceeded before legal configuration"
                );
            }
        }

        Ok(ConvergenceReport {
            convergence,
            tally: self.tally,
            final_snapshot: system.snapshot(),
            trace: self.trace,
            trace_truncated: self.trace_truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use crate::error::Error;
    use crate::fault::FaultInjector;
    use crate::legality::is_legal;
    use crate::node::{Node, Primary};
    use crate::scheduler::{RandomScheduler, ScriptedScheduler};
    use selfstab_topology::LineTopology;

    /// Panics if ever consulted.
    struct NeverSchedule;

    impl Schedule for NeverSchedule {
        fn select(&mut self) -> usize {
            panic!("scheduler consulted on a legal system");
        }
    }

    fn converge_loop(bound: StepBound) -> ConvergenceLoop {
        ConvergenceLoop::new(StabilizationEngine::default(), bound)
    }

    #[test]
    fn legal_system_takes_zero_steps() {
        let mut system = System::new(1i64, &Params::default()).unwrap();
        let report = converge_loop(StepBound::Limited(10))
            .run(&mut system, &mut NeverSchedule)
            .unwrap();
        assert_eq!(report.convergence, Convergence::Converged { steps: 0 });
        assert_eq!(report.tally.total(), 0);
    }

    #[test]
    fn single_fault_converges_in_one_scheduled_step() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();

        let mut scheduler = ScriptedScheduler::new(vec![1]).unwrap();
        let report = converge_loop(StepBound::Limited(10))
            .with_trace(true)
            .run(&mut system, &mut scheduler)
            .unwrap();

        assert_eq!(report.convergence, Convergence::Converged { steps: 1 });
        assert_eq!(report.final_snapshot.to_string(), "0 0 0");
        assert_eq!(
            report.trace,
            vec![StepRecord { step: 0, index: 1, outcome: RuleOutcome::ForcedFlip }]
        );
        assert_eq!(report.tally.forced_flips, 1);
        assert!(!report.trace_truncated);
    }

    #[test]
    fn bound_stops_a_run_that_cannot_progress() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();

        // Only node 2 is ever scheduled; once it matches node 1 it stays put.
        let mut scheduler = ScriptedScheduler::new(vec![2, 2]).unwrap();
        let report = converge_loop(StepBound::Limited(4))
            .run(&mut system, &mut scheduler)
            .unwrap();

        assert_eq!(report.convergence, Convergence::BoundExceeded { steps: 4 });
        assert!(!report.convergence.is_converged());
        assert!(!is_legal(&system));
    }

    #[test]
    fn zero_bound_on_illegal_system() {
        let mut system = System::new(2i64, &Params::default()).unwrap();
        FaultInjector::seeded(0).inject_at(&mut system, 0).unwrap();
        let report = converge_loop(StepBound::Limited(0))
            .run(&mut system, &mut NeverSchedule)
            .unwrap();
        assert_eq!(report.convergence, Convergence::BoundExceeded { steps: 0 });
    }

    #[test]
    fn scheduler_index_out_of_range_is_reported() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();
        let mut scheduler = ScriptedScheduler::new(vec![7]).unwrap();
        let err = converge_loop(StepBound::Limited(10))
            .run(&mut system, &mut scheduler)
            .unwrap_err();
        assert_eq!(err, Error::IndexOutOfRange { index: 7, len: 3 });
    }

    #[test]
    fn advance_reports_states() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();
        let mut scheduler = ScriptedScheduler::new(vec![1]).unwrap();
        let mut lp = converge_loop(StepBound::Unbounded);

        assert_eq!(lp.advance(&mut system, &mut scheduler).unwrap(), LoopState::Running);
        assert_eq!(lp.advance(&mut system, &mut scheduler).unwrap(), LoopState::Legal);
        assert_eq!(lp.steps(), 1);
    }

    #[test]
    fn short_lines_always_converge() {
        // With at most three nodes every disagreement touches an end node,
        // and an end node facing disagreement always flips.
        for len in 1..=3i64 {
            for seed in 0..50u64 {
                let mut system = System::new(len, &Params::default()).unwrap();
                FaultInjector::seeded(seed)
                    .inject_many(&mut system, 5usize.into())
                    .unwrap();

                let mut scheduler = RandomScheduler::seeded(system.size(), seed);
                let report = converge_loop(StepBound::Limited(100_000))
                    .run(&mut system, &mut scheduler)
                    .unwrap();

                assert!(
                    report.convergence.is_converged(),
                    "len {} seed {} did not converge",
                    len,
                    seed
                );
                assert!(report.final_snapshot.is_uniform());
                assert_eq!(report.tally.total(), report.convergence.steps());
                assert!(report.trace.is_empty());
            }
        }
    }

    #[test]
    fn dominant_interior_leader_pins_the_boundary() {
        // Node 2 outranks both neighbors by far. Each time it is selected it
        // flips and raises its secondary further, so the disagreement boundary
        // oscillates around it and neither neighbor ever becomes leader.
        let nodes = vec![
            Node::new(Primary::Zero, 5),
            Node::new(Primary::Zero, 5),
            Node::new(Primary::One, 1_000),
            Node::new(Primary::One, 5),
            Node::new(Primary::One, 5),
        ];
        let mut system = System::from_nodes(LineTopology::new(5).unwrap(), nodes).unwrap();
        let mut scheduler = RandomScheduler::seeded(system.size(), 7);

        let report = converge_loop(StepBound::Limited(10_000))
            .run(&mut system, &mut scheduler)
            .unwrap();

        assert_eq!(report.convergence, Convergence::BoundExceeded { steps: 10_000 });
        assert_eq!(report.tally.forced_flips, 0);
        assert!(report.tally.leader_resolved > 0);
        assert_eq!(system.primaries()[0], Primary::Zero);
        assert_eq!(system.primaries()[4], Primary::One);
    }

    #[test]
    fn longer_runs_end_one_way_or_the_other() {
        for seed in 0..20u64 {
            let mut system = System::new(12i64, &Params::default()).unwrap();
            FaultInjector::seeded(seed)
                .inject_many(&mut system, 3usize.into())
                .unwrap();

            let mut scheduler = RandomScheduler::seeded(system.size(), seed);
            let report = converge_loop(StepBound::Limited(5_000))
                .run(&mut system, &mut scheduler)
                .unwrap();

            assert_eq!(report.convergence.is_converged(), report.final_snapshot.is_uniform());
            assert_eq!(report.convergence.is_converged(), is_legal(&system));
            assert!(report.convergence.steps() <= 5_000);
        }
    }

    #[test]
    fn trace_stops_growing_at_its_limit() {
        // Node 3 is never scheduled and node 0 never flips, so only the bound
        // ends the run.
        let nodes = vec![
            Node::new(Primary::Zero, 5),
            Node::new(Primary::One, 1_000),
            Node::new(Primary::One, 5),
            Node::new(Primary::One, 5),
        ];
        let mut system = System::from_nodes(LineTopology::new(4).unwrap(), nodes).unwrap();
        let mut scheduler = ScriptedScheduler::new(vec![1, 2]).unwrap();

        let report = converge_loop(StepBound::Limited(60))
            .with_trace(true)
            .with_trace_limit(10)
            .run(&mut system, &mut scheduler)
            .unwrap();

        assert_eq!(report.convergence.steps(), 60);
        assert_eq!(report.trace.len(), 10);
        assert_eq!(report.trace.last().unwrap().step, 9);
        assert!(report.trace_truncated);
        assert_eq!(report.tally.total(), 60);
    }

    #[test]
    fn default_trace_limit_is_bounded() {
        let lp = converge_loop(StepBound::Unbounded).with_trace(true);
        assert_eq!(lp.trace_limit, MAX_TRACE_LEN);
    }

    #[test]
    fn tally_counts_each_rule() {
        let mut tally = RuleTally::default();
        tally.record(&RuleOutcome::ForcedFlip);
        tally.record(&RuleOutcome::Stable);
        tally.record(&RuleOutcome::Stable);
        tally.record(&RuleOutcome::Contained);
        tally.record(&RuleOutcome::LeaderResolved { raised_by: 25 });
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.stable, 2);
    }
}
