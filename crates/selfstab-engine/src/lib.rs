//! Probabilistic Fault-Containing Self-Stabilization
//!
//! Nodes on a line (or ring) each hold a binary **primary** and an integer
//! **secondary**. Starting from any configuration, repeated local repair
//! steps at randomly scheduled nodes drive every primary to the same value
//! without central coordination.
//!
//! # Repair Step
//!
//! For the selected node, count how many present neighbors disagree:
//!
//! 1. All disagree → flip the primary.
//! 2. None disagree → do nothing.
//! 3. Some disagree → the local leader (secondary ≥ every neighbor's) flips
//!    and raises its secondary by `max(neighbor secondaries) + M`; anyone
//!    else only raises its secondary by one.
//!
//! Non-leaders accumulating priority instead of flipping keeps a fault's
//! effect contained to a small region.
//!
//! # Liveness
//!
//! Convergence is not guaranteed. A leader whose secondary has outgrown both
//! neighbors can pin a disagreement boundary in the interior of a line
//! indefinitely. Every run therefore takes a [`StepBound`] and reports
//! [`Convergence::BoundExceeded`] instead of looping forever.
//!
//! # Usage
//!
//! ```
//! use selfstab_engine::{Simulation, SimulationConfig, StepBound, SystemSize, FaultCount};
//!
//! let config = SimulationConfig::default()
//!     .with_size(SystemSize::try_from(3i64).unwrap())
//!     .with_faults(FaultCount::try_from(1i64).unwrap())
//!     .with_seed(7)
//!     .with_bound(StepBound::Limited(10_000));
//!
//! let mut sim = Simulation::new(config).unwrap();
//! for fault in sim.inject_faults().unwrap() {
//!     println!("{}", fault.snapshot);
//! }
//! let report = sim.stabilize().unwrap();
//! assert!(report.convergence.is_converged());
//! ```

mod config;
mod convergence;
mod engine;
mod error;
mod fault;
mod legality;
mod node;
mod rules;
mod scheduler;
mod simulation;
mod system;

pub use config::{
    FaultCount, Params, SimulationConfig, StepBound, SystemSize, DEFAULT_INITIAL_SECONDARY,
    DEFAULT_LEADER_MARGIN, DEFAULT_SYSTEM_SIZE,
};
pub use convergence::{
    Convergence, ConvergenceLoop, ConvergenceReport, LoopState, RuleTally, StepRecord,
    MAX_TRACE_LEN,
};
pub use engine::StabilizationEngine;
pub use error::{Error, Result};
pub use fault::{Fault, FaultInjector};
pub use legality::{disagreement_count, distinct_primaries, is_legal};
pub use node::{Node, Primary};
pub use rules::{is_leader, max_neighbor_secondary, LocalView, Neighborhood, RuleOutcome};
pub use scheduler::{pick_index, RandomScheduler, Schedule, ScriptedScheduler};
pub use simulation::Simulation;
pub use system::{Snapshot, System};

pub use selfstab_topology::{LineTopology, Neighbors, RingTopology, Shape, Topology, TopologyKind};
