//! Validated inputs and simulation configuration.
//!
//! Sizes and fault counts arrive as plain integers (typically typed at a
//! prompt). They are validated into [`SystemSize`] and [`FaultCount`] before
//! anything is allocated, so a zero-sized or negatively-faulted system can
//! never be built.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use selfstab_topology::TopologyKind;

use crate::error::{Error, Result};

/// Starting secondary value for every node.
pub const DEFAULT_INITIAL_SECONDARY: u64 = 5;

/// Margin `M` a resolving leader adds on top of its neighbors' maximum.
pub const DEFAULT_LEADER_MARGIN: u64 = 20;

/// Default node count when nothing else is configured.
pub const DEFAULT_SYSTEM_SIZE: usize = 10;

/// Number of nodes in a system, at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemSize(NonZeroUsize);

impl SystemSize {
    /// The smallest possible system.
    pub const ONE: Self = Self(NonZeroUsize::MIN);

    /// Node count as a plain integer.
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Node count as a non-zero integer.
    pub const fn non_zero(self) -> NonZeroUsize {
        self.0
    }
}

impl TryFrom<i64> for SystemSize {
    type Error = Error;

    fn try_from(requested: i64) -> Result<Self> {
        usize::try_from(requested)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(Error::InvalidSize { requested })
    }
}

impl TryFrom<usize> for SystemSize {
    type Error = Error;

    fn try_from(requested: usize) -> Result<Self> {
        NonZeroUsize::new(requested).map(Self).ok_or(Error::InvalidSize {
            requested: i64::try_from(requested).unwrap_or(i64::MAX),
        })
    }
}

impl fmt::Display for SystemSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of transient faults to inject, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FaultCount(usize);

impl FaultCount {
    /// No faults.
    pub const ZERO: Self = Self(0);

    /// Fault count as a plain integer.
    pub const fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<i64> for FaultCount {
    type Error = Error;

    fn try_from(requested: i64) -> Result<Self> {
        usize::try_from(requested)
            .map(Self)
            .map_err(|_| Error::InvalidFaultCount { requested })
    }
}

impl From<usize> for FaultCount {
    fn from(count: usize) -> Self {
        Self(count)
    }
}

/// Protocol constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Params {
    /// Secondary value every node starts with
    pub initial_secondary: u64,
    /// `M`: added to the neighbor maximum when a leader resolves (always > 0)
    pub leader_margin: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            initial_secondary: DEFAULT_INITIAL_SECONDARY,
            leader_margin: DEFAULT_LEADER_MARGIN,
        }
    }
}

impl Params {
    /// Create protocol constants, rejecting a zero leader margin.
    pub fn new(initial_secondary: u64, leader_margin: u64) -> Result<Self> {
        if leader_margin == 0 {
            return Err(Error::InvalidConfig(
                "leader margin must be positive".to_string(),
            ));
        }
        Ok(Self {
            initial_secondary,
            leader_margin,
        })
    }
}

/// Cap on the number of engine steps a convergence run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepBound {
    /// Run until legal, however long that takes
    #[default]
    Unbounded,
    /// Give up after this many steps
    Limited(u64),
}

impl StepBound {
    /// Whether another step may be taken after `steps` have already run.
    pub fn allows(&self, steps: u64) -> bool {
        match self {
            StepBound::Unbounded => true,
            StepBound::Limited(cap) => steps < *cap,
        }
    }
}

impl FromStr for StepBound {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") || s.eq_ignore_ascii_case("none") {
            return Ok(StepBound::Unbounded);
        }
        s.parse::<u64>()
            .map(StepBound::Limited)
            .map_err(|e| format!("'{}' is not a step count: {}", s, e))
    }
}

/// Configuration for a full simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Number of nodes
    pub size: SystemSize,
    /// Transient faults injected before convergence starts
    pub faults: FaultCount,
    /// Seed for scheduling and fault placement; drawn at random when `None`
    pub seed: Option<u64>,
    /// Step cap for the convergence loop
    pub bound: StepBound,
    /// Neighbor layout
    pub topology: TopologyKind,
    /// Protocol constants
    pub params: Params,
    /// Keep a per-step trace in the report
    pub record_trace: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            size: SystemSize(NonZeroUsize::new(DEFAULT_SYSTEM_SIZE).unwrap_or(NonZeroUsize::MIN)),
            faults: FaultCount::ZERO,
            seed: None,
            bound: StepBound::Unbounded,
            topology: TopologyKind::Line,
            params: Params::default(),
            record_trace: false,
        }
    }
}

impl SimulationConfig {
    /// Defaults overlaid with `SELFSTAB_*` environment variables.
    ///
    /// Recognized: `SELFSTAB_SIZE`, `SELFSTAB_FAULTS`, `SELFSTAB_SEED`,
    /// `SELFSTAB_MAX_STEPS` (a count or `unbounded`), `SELFSTAB_TOPOLOGY`
    /// (`line` or `ring`), `SELFSTAB_INITIAL_SECONDARY`,
    /// `SELFSTAB_LEADER_MARGIN`, `SELFSTAB_TRACE` (`true`/`false`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(size) = parse_var::<i64, _>(&lookup, "SELFSTAB_SIZE")? {
            config.size = SystemSize::try_from(size)?;
        }
        if let Some(faults) = parse_var::<i64, _>(&lookup, "SELFSTAB_FAULTS")? {
            config.faults = FaultCount::try_from(faults)?;
        }
        if let Some(seed) = parse_var(&lookup, "SELFSTAB_SEED")? {
            config.seed = Some(seed);
        }
        if let Some(bound) = parse_var(&lookup, "SELFSTAB_MAX_STEPS")? {
            config.bound = bound;
        }
        if let Some(topology) = parse_var(&lookup, "SELFSTAB_TOPOLOGY")? {
            config.topology = topology;
        }

        let initial = parse_var(&lookup, "SELFSTAB_INITIAL_SECONDARY")?
            .unwrap_or(config.params.initial_secondary);
        let margin = parse_var(&lookup, "SELFSTAB_LEADER_MARGIN")?
            .unwrap_or(config.params.leader_margin);
        config.params = Params::new(initial, margin)?;

        if let Some(trace) = parse_var(&lookup, "SELFSTAB_TRACE")? {
            config.record_trace = trace;
        }

        Ok(config)
    }

    /// Set the node count.
    pub fn with_size(mut self, size: SystemSize) -> Self {
        self.size = size;
        self
    }

    /// Set the number of faults injected before the run.
    pub fn with_faults(mut self, faults: FaultCount) -> Self {
        self.faults = faults;
        self
    }

    /// Fix the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Cap the convergence loop.
    pub fn with_bound(mut self, bound: StepBound) -> Self {
        self.bound = bound;
        self
    }

    /// Choose the neighbor layout.
    pub fn with_topology(mut self, topology: TopologyKind) -> Self {
        self.topology = topology;
        self
    }

    /// Override protocol constants.
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Record every step in the report.
    pub fn with_trace(mut self, record_trace: bool) -> Self {
        self.record_trace = record_trace;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", key, raw, e))),
    }
}
