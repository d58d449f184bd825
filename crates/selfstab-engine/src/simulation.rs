//! End-to-end simulation: build, perturb, stabilize.
//!
//! This is the surface a front end drives. It owns the system and both random
//! streams, exposes a snapshot accessor, and offers a single "run to legal"
//! entry point. Prompting, pausing, timing and printing are left to the
//! caller.
//!
//! Faults perturb the starting configuration only. Once [`Simulation::stabilize`]
//! has run, further injection is rejected with [`Error::FaultAfterRun`]; build a
//! new simulation to perturb again.

use rand::rngs::StdRng;
use rand::SeedableRng;
use selfstab_topology::{Shape, TopologyKind};
use tracing::info;

use crate::config::SimulationConfig;
use crate::convergence::{ConvergenceLoop, ConvergenceReport};
use crate::engine::StabilizationEngine;
use crate::error::{Error, Result};
use crate::fault::{Fault, FaultInjector};
use crate::scheduler::RandomScheduler;
use crate::system::{Snapshot, System};

/// Mixed into the seed so fault placement and scheduling draw from
/// independent streams.
const FAULT_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// A configured system together with its scheduler and fault source.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    seed: u64,
    system: System<Shape>,
    scheduler: RandomScheduler<StdRng>,
    injector: FaultInjector<StdRng>,
    engine: StabilizationEngine,
    stabilized: bool,
}

impl Simulation {
    /// Build the system described by `config`.
    ///
    /// Without a configured seed one is drawn at random and logged, so the
    /// run can be replayed with `SELFSTAB_SEED`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let seed = config.seed.unwrap_or_else(rand::random);
        let topology = Shape::build(config.topology, config.size.get())?;
        let system = System::with_topology(topology, &config.params)?;

        info!(
            seed,
            nodes = config.size.get(),
            topology = %config.topology,
            faults = config.faults.get(),
            "simulation created"
        );

        Ok(Self {
            scheduler: RandomScheduler::new(config.size, StdRng::seed_from_u64(seed)),
            injector: FaultInjector::new(StdRng::seed_from_u64(seed ^ FAULT_STREAM)),
            engine: StabilizationEngine::new(config.params),
            system,
            seed,
            config,
            stabilized: false,
        })
    }

    /// The seed both random streams derive from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// The configuration this simulation was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Neighbor layout in use.
    pub fn topology(&self) -> TopologyKind {
        self.config.topology
    }

    /// Current system state.
    pub fn system(&self) -> &System<Shape> {
        &self.system
    }

    /// Current primaries.
    pub fn snapshot(&self) -> Snapshot {
        self.system.snapshot()
    }

    /// Whether all primaries currently agree.
    pub fn is_legal(&self) -> bool {
        self.system.is_legal()
    }

    /// Whether [`stabilize`](Self::stabilize) has been called.
    pub fn is_stabilized(&self) -> bool {
        self.stabilized
    }

    /// Inject the configured number of transient faults.
    pub fn inject_faults(&mut self) -> Result<Vec<Fault>> {
        self.ensure_not_stabilized()?;
        self.injector.inject_many(&mut self.system, self.config.faults)
    }

    /// Inject one transient fault at a random node.
    pub fn inject_fault(&mut self) -> Result<Fault> {
        self.ensure_not_stabilized()?;
        self.injector.inject(&mut self.system)
    }

    fn ensure_not_stabilized(&self) -> Result<()> {
        if self.stabilized {
            return Err(Error::FaultAfterRun);
        }
        Ok(())
    }

    /// Run the convergence loop until legal or until the configured bound.
    pub fn stabilize(&mut self) -> Result<ConvergenceReport> {
        self.stabilized = true;
        ConvergenceLoop::new(self.engine, self.config.bound)
            .with_trace(self.config.record_trace)
            .run(&mut self.system, &mut self.scheduler)
    }
}
