//! Legal-configuration checks.
//!
//! A configuration is legal when every node holds the same primary. These
//! functions rescan the whole system in O(N); the convergence loop uses the
//! store's running counter ([`System::is_legal`]) instead and the two are
//! required to agree.

use std::collections::BTreeSet;

use selfstab_topology::Topology;

use crate::node::Primary;
use crate::system::System;

/// Whether every node's primary matches node 0's. Vacuously true for one node.
pub fn is_legal<T: Topology>(system: &System<T>) -> bool {
    match system.nodes().split_first() {
        Some((reference, rest)) => rest.iter().all(|n| n.agrees_with(reference)),
        None => true,
    }
}

/// The set of primaries present in the system.
pub fn distinct_primaries<T: Topology>(system: &System<T>) -> BTreeSet<Primary> {
    system.nodes().iter().map(|n| n.primary()).collect()
}

/// Number of nodes whose primary differs from node 0's, by rescanning.
pub fn disagreement_count<T: Topology>(system: &System<T>) -> usize {
    match system.nodes().split_first() {
        Some((reference, rest)) => rest.iter().filter(|n| !n.agrees_with(reference)).count(),
        None => 0,
    }
}
