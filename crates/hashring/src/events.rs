//! Ring change notifications.
//!
//! The ring does not deliver events anywhere by itself. Callers that want to
//! observe membership changes register a [`RingEventListener`]; the ring calls
//! it after a batch has been applied and the lock released.

use crate::node::Server;

/// Something that happened to the ring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RingEvent {
    /// A batch changed membership.
    RingChanged {
        added: Vec<Server>,
        removed: Vec<Server>,
    },
    /// The membership checksum moved.
    RingChecksum { old_checksum: u64, new_checksum: u64 },
}

/// Receives [`RingEvent`]s.
///
/// Called after the ring's lock is released, so a listener may query the
/// ring. Events arrive in the order their batches were applied, one batch at
/// a time. Usually that is on the thread that applied the batch; when batches
/// overlap, it is the thread already delivering an earlier one.
pub trait RingEventListener: Send + Sync {
    fn handle_event(&self, event: &RingEvent);
}

impl<F> RingEventListener for F
where
    F: Fn(&RingEvent) + Send + Sync,
{
    fn handle_event(&self, event: &RingEvent) {
        self(event)
    }
}
