//! Transient fault injection.
//!
//! A fault flips one node's primary and leaves its secondary alone. Faults are
//! a pre-run perturbation: they are applied before the convergence loop
//! starts, never while it runs.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use selfstab_topology::Topology;
use tracing::debug;

use crate::config::FaultCount;
use crate::error::Result;
use crate::scheduler::pick_index;
use crate::system::{Snapshot, System};

/// One applied fault and the system state right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fault {
    /// Node whose primary was flipped
    pub index: usize,
    /// Primaries after the flip
    pub snapshot: Snapshot,
}

/// Flips randomly chosen primaries.
///
/// Draws from its own random source, independent of the scheduler's.
#[derive(Debug, Clone)]
pub struct FaultInjector<R = StdRng> {
    rng: R,
}

impl FaultInjector<StdRng> {
    /// Deterministic injector.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> FaultInjector<R> {
    /// Injector drawing from the given random source.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Flip the primary of one uniformly chosen node.
    pub fn inject<T: Topology>(&mut self, system: &mut System<T>) -> Result<Fault> {
        let index = pick_index(&mut self.rng, system.size().non_zero());
        self.inject_at(system, index)
    }

    /// Flip the primary of a specific node.
    pub fn inject_at<T: Topology>(
        &mut self,
        system: &mut System<T>,
        index: usize,
    ) -> Result<Fault> {
        system.flip(index)?;
        debug!(index, disagreements = system.disagreements(), "transient fault injected");
        Ok(Fault {
            index,
            snapshot: system.snapshot(),
        })
    }

    /// Apply `count` random faults, one after another.
    ///
    /// The same node may be hit more than once; two hits cancel out.
    pub fn inject_many<T: Topology>(
        &mut self,
        system: &mut System<T>,
        count: FaultCount,
    ) -> Result<Vec<Fault>> {
        (0..count.get()).map(|_| self.inject(system)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use crate::error::Error;
    use crate::node::Primary;

    #[test]
    fn fault_flips_only_primary() {
        let mut system = System::new(5i64, &Params::default()).unwrap();
        let mut injector = FaultInjector::seeded(11);

        let fault = injector.inject(&mut system).unwrap();

        assert!(fault.index < 5);
        assert_eq!(system.node(fault.index).unwrap().primary(), Primary::One);
        assert_eq!(system.secondaries(), vec![5; 5]);
        assert_eq!(fault.snapshot, system.snapshot());
    }

    #[test]
    fn inject_at_chosen_index() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        let fault = FaultInjector::seeded(0).inject_at(&mut system, 1).unwrap();
        assert_eq!(fault.snapshot.to_string(), "0 1 0");
        assert!(!system.is_legal());
    }

    #[test]
    fn inject_at_out_of_range() {
        let mut system = System::new(3i64, &Params::default()).unwrap();
        assert_eq!(
            FaultInjector::seeded(0).inject_at(&mut system, 3),
            Err(Error::IndexOutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn inject_many_records_each_fault() {
        let mut system = System::new(8i64, &Params::default()).unwrap();
        let mut injector = FaultInjector::seeded(5);

        let faults = injector.inject_many(&mut system, FaultCount::from(4)).unwrap();

        assert_eq!(faults.len(), 4);
        assert_eq!(faults.last().unwrap().snapshot, system.snapshot());

        // Replaying the indices on a fresh system reproduces the final state.
        let mut replay = System::new(8i64, &Params::default()).unwrap();
        for fault in &faults {
            injector.inject_at(&mut replay, fault.index).unwrap();
        }
        assert_eq!(replay.primaries(), system.primaries());
    }

    #[test]
    fn zero_faults_leave_system_legal() {
        let mut system = System::new(8i64, &Params::default()).unwrap();
        let faults = FaultInjector::seeded(5)
            .inject_many(&mut system, FaultCount::ZERO)
            .unwrap();
        assert!(faults.is_empty());
        assert!(system.is_legal());
    }
}
