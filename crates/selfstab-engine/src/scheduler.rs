//! Node activation order.
//!
//! The distributed model assumes an asynchronous scheduler that may activate
//! nodes in any order, including adversarially. This module does NOT model a
//! worst-case adversary: [`RandomScheduler`] picks uniformly at random, which
//! is a simplification of the theoretical model. [`ScriptedScheduler`] replays
//! a fixed order for deterministic scenarios.

use std::num::NonZeroUsize;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SystemSize;
use crate::error::{Error, Result};

/// Uniformly pick an index in `0..len`.
///
/// Shared by the scheduler and the fault injector.
pub fn pick_index<R: Rng + ?Sized>(rng: &mut R, len: NonZeroUsize) -> usize {
    rng.gen_range(0..len.get())
}

/// Chooses which node the engine processes next.
pub trait Schedule {
    /// Index of the next node to activate.
    fn select(&mut self) -> usize;
}

impl<S: Schedule + ?Sized> Schedule for &mut S {
    fn select(&mut self) -> usize {
        (**self).select()
    }
}

/// Uniform random activation over `0..N`.
#[derive(Debug, Clone)]
pub struct RandomScheduler<R = StdRng> {
    len: NonZeroUsize,
    rng: R,
}

impl RandomScheduler<StdRng> {
    /// Deterministic scheduler for a system of `size` nodes.
    pub fn seeded(size: SystemSize, seed: u64) -> Self {
        Self::new(size, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomScheduler<R> {
    /// Scheduler drawing from the given random source.
    pub fn new(size: SystemSize, rng: R) -> Self {
        Self {
            len: size.non_zero(),
            rng,
        }
    }

    /// Number of nodes selections are drawn from.
    pub fn len(&self) -> usize {
        self.len.get()
    }

    /// Always false; there is at least one node to select.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<R: Rng> Schedule for RandomScheduler<R> {
    fn select(&mut self) -> usize {
        pick_index(&mut self.rng, self.len)
    }
}

/// Replays a fixed sequence of indices, wrapping around at the end.
///
/// Indices are not range-checked here; an out-of-range entry surfaces as
/// [`Error::IndexOutOfRange`] when the engine steps it.
#[derive(Debug, Clone)]
pub struct ScriptedScheduler {
    script: Vec<usize>,
    cursor: usize,
}

impl ScriptedScheduler {
    /// Scheduler replaying `script`. An empty script is rejected.
    pub fn new(script: Vec<usize>) -> Result<Self> {
        if script.is_empty() {
            return Err(Error::InvalidConfig(
                "scripted scheduler needs at least one index".to_string(),
            ));
        }
        Ok(Self { script, cursor: 0 })
    }

    /// How many selections have been made so far.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

impl Schedule for ScriptedScheduler {
    fn select(&mut self) -> usize {
        let index = self.script[self.cursor % self.script.len()];
        self.cursor += 1;
        index
    }
}
