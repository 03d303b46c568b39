//! Virtual node abstractions.
//!
//! Each server is placed on the ring at `replica_points` positions instead of
//! one. Replica `i` of a server sits at `hash("<address>:<i>")`. More replicas
//! smooth out the key distribution at the cost of a longer position array:
//!
//! - **Memory**: O(r · m) positions for r replicas and m servers
//! - **Lookup**: O(log(r · m)) binary search plus a short walk
//! - **Rebalancing**: roughly 1/m of keys move when a server joins or leaves

use std::fmt;

use crate::node::Server;
use crate::partitioner::Partitioner;

/// One replica position of a server on the ring.
///
/// Ordered by position first, so a sorted `Vec<VirtualNode>` is in ring order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Position on the ring.
    pub position: u64,
    /// Server owning this position.
    pub server: Server,
}

impl VirtualNode {
    #[inline]
    pub fn new(position: u64, server: Server) -> Self {
        Self { position, server }
    }

    /// Create replica `index` of `server`, hashing its replica key.
    pub fn from_index<P: Partitioner + ?Sized>(
        server: &Server,
        index: usize,
        partitioner: &P,
    ) -> Self {
        let position = partitioner.hash_str(&server.replica_key(index));
        Self::new(position, server.clone())
    }
}

impl fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VNode(position={:016x}, server={})", self.position, self.server)
    }
}

/// All replica positions of `server`, in replica-index order (unsorted).
pub fn replica_positions<P: Partitioner + ?Sized>(
    server: &Server,
    replica_points: usize,
    partitioner: &P,
) -> Vec<u64> {
    (0..replica_points)
        .map(|i| partitioner.hash_str(&server.replica_key(i)))
        .collect()
}
