//! Hash ring data structure.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace, warn};

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::events::{RingEvent, RingEventListener};
use crate::node::Server;
use crate::partitioner::Partitioner;
use crate::ring::radix::radix_sort;
use crate::ring::search::{index_of, remove_sorted};
use crate::vnode::{replica_positions, VirtualNode};

/// Outcome of one [`HashRing::add_remove`] batch.
///
/// Only servers whose membership actually changed are listed: adding a
/// current member or removing a non-member is a no-op and is left out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RingChange {
    pub added: Vec<Server>,
    pub removed: Vec<Server>,
    pub old_checksum: u64,
    pub new_checksum: u64,
}

impl RingChange {
    /// True if the batch left membership untouched.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// True if the batch moved the checksum. Colliding positions can cancel
    /// under XOR, so a non-empty batch may still leave it unchanged.
    pub fn checksum_changed(&self) -> bool {
        self.old_checksum != self.new_checksum
    }
}

/// Everything guarded by the ring lock.
#[derive(Default)]
struct RingState {
    /// Replica positions, ascending whenever the lock is released.
    positions: Vec<u64>,
    /// Second buffer for the radix sort; always `positions.len()` long.
    scratch: Vec<u64>,
    /// Servers at each position, in insertion order. Usually one.
    owners: HashMap<u64, Vec<Server>>,
    members: HashSet<Server>,
}

impl RingState {
    /// Index of the position that owns `hash`, wrapping past the end.
    fn entry(&self, hash: u64) -> Option<usize> {
        if self.positions.is_empty() {
            return None;
        }
        let index = index_of(&self.positions, hash);
        Some(if index == self.positions.len() { 0 } else { index })
    }

    fn checksum(&self) -> u64 {
        self.positions.iter().fold(0, |acc, position| acc ^ position)
    }

    /// Drop `server` and its replicas. `positions` must be sorted.
    fn remove_server(&mut self, server: &Server, mut replicas: Vec<u64>) -> bool {
        if !self.members.remove(server) {
            return false;
        }

        for position in &replicas {
            if let Entry::Occupied(mut owners) = self.owners.entry(*position) {
                owners.get_mut().retain(|owner| owner != server);
                if owners.get().is_empty() {
                    owners.remove();
                }
            }
        }

        remove_sorted(&mut self.positions, &mut replicas);
        self.scratch.truncate(self.positions.len());
        true
    }

    /// Append `server`'s replicas without sorting.
    fn add_server_unsorted(&mut self, server: &Server, replicas: Vec<u64>) -> bool {
        if !self.members.insert(server.clone()) {
            return false;
        }

        for &position in &replicas {
            let owners = self.owners.entry(position).or_default();
            if !owners.contains(server) {
                owners.push(server.clone());
            }
        }

        self.scratch.extend_from_slice(&replicas);
        self.positions.extend(replicas);
        true
    }

    fn sort(&mut self) {
        self.scratch.resize(self.positions.len(), 0);
        radix_sort(&mut self.positions, &mut self.scratch);
    }
}

/// Applied changes waiting to reach listeners.
#[derive(Default)]
struct Outbox {
    /// In the order the batches were applied.
    queue: VecDeque<RingChange>,
    /// Set while some thread is delivering from `queue`.
    draining: bool,
}

/// Consistent hash ring.
///
/// Each server occupies `replica_points` positions on a `u64` ring. A key is
/// owned by the server at the first position at or after the key's hash,
/// wrapping around to the lowest position.
///
/// # Concurrency
///
/// All ring state sits behind one `parking_lot::RwLock`. Lookups share the
/// read lock; [`add_remove`](Self::add_remove) holds the write lock for the
/// whole batch, so readers never see a partially applied batch or an
/// unsorted position array. Guards are scoped and released on every path.
///
/// # Events
///
/// Each batch that changes membership is queued while the write lock is
/// still held, so the queue is in apply order. Listeners run after the lock
/// is released, one batch at a time, from whichever thread is draining the
/// queue. When batches overlap, `add_remove` can therefore return before
/// its own events have been delivered by the other thread.
///
/// # Example
///
/// ```
/// use hashring::partitioner::Xxh3Partitioner;
/// use hashring::{HashRing, Server};
///
/// let ring = HashRing::new(100, Xxh3Partitioner);
/// ring.add_servers(&[Server::new("10.0.0.1:3000"), Server::new("10.0.0.2:3000")]);
///
/// let owner = ring.lookup("user:42").unwrap();
/// assert!(ring.has_server(&owner));
/// assert_eq!(ring.lookup_n_unique("user:42", 2).len(), 2);
/// ```
pub struct HashRing {
    state: RwLock<RingState>,
    partitioner: Box<dyn Partitioner>,
    replica_points: usize,
    listeners: RwLock<Vec<Arc<dyn RingEventListener>>>,
    outbox: Mutex<Outbox>,
}

impl HashRing {
    /// Create an empty ring placing each server at `replica_points`
    /// positions hashed by `partitioner`.
    ///
    /// A `replica_points` of zero is raised to one; use [`RingBuilder`] to
    /// reject it instead. To pick the hash algorithm from a [`RingConfig`],
    /// use [`from_config`](Self::from_config).
    pub fn new(replica_points: usize, partitioner: impl Partitioner) -> Self {
        Self::from_parts(replica_points, Box::new(partitioner))
    }

    /// Create an empty ring using both the replica count and the hash
    /// algorithm named in `config`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] if `config.replica_points` is zero.
    pub fn from_config(config: RingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config.replica_points, config.partitioner()))
    }

    /// Start building a ring.
    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    fn from_parts(replica_points: usize, partitioner: Box<dyn Partitioner>) -> Self {
        if replica_points == 0 {
            warn!("replica_points of 0 would leave servers off the ring, using 1");
        }
        Self {
            state: RwLock::new(RingState::default()),
            partitioner,
            replica_points: replica_points.max(1),
            listeners: RwLock::new(Vec::new()),
            outbox: Mutex::new(Outbox::default()),
        }
    }

    /// Register a listener for ring events.
    ///
    /// Listeners may query the ring, and may apply batches of their own;
    /// those are delivered after the event currently being handled.
    pub fn add_listener(&self, listener: Arc<dyn RingEventListener>) {
        self.listeners.write().push(listener);
    }

    /// Server owning `key`, or `None` if the ring is empty.
    ///
    /// # Performance
    ///
    /// One hash plus a binary search over the position array, O(log(r · m))
    /// for r replica points and m servers, under the shared read lock.
    pub fn lookup(&self, key: &str) -> Option<Server> {
        let hash = self.partitioner.hash_str(key);
        let state = self.state.read();
        let index = state.entry(hash)?;
        state
            .owners
            .get(&state.positions[index])
            .and_then(|owners| owners.first())
            .cloned()
    }

    /// Up to `n` distinct servers for `key`.
    ///
    /// Walks the ring clockwise from the key's position, collecting owners
    /// until `n` distinct servers are found or every position has been
    /// visited once. Returns all members if there are fewer than `n`. The
    /// result is in walk order, but callers should treat it as a set.
    ///
    /// # Performance
    ///
    /// A binary search, then a walk that usually ends after a few
    /// positions. The worst case visits every position once, when fewer
    /// distinct servers exist than `n` would need.
    ///
    /// # Example
    ///
    /// ```
    /// use hashring::partitioner::Xxh3Partitioner;
    /// use hashring::{HashRing, Server};
    ///
    /// let ring = HashRing::new(10, Xxh3Partitioner);
    /// ring.add_servers(&[Server::new("a:1"), Server::new("b:1")]);
    ///
    /// let replicas = ring.lookup_n_unique("key", 5);
    /// assert_eq!(replicas.len(), 2);
    /// assert_eq!(Some(replicas[0].clone()), ring.lookup("key"));
    /// ```
    pub fn lookup_n_unique(&self, key: &str, n: usize) -> Vec<Server> {
        if n == 0 {
            return Vec::new();
        }

        let hash = self.partitioner.hash_str(key);
        let state = self.state.read();
        let Some(start) = state.entry(hash) else {
            return Vec::new();
        };

        let len = state.positions.len();
        let wanted = n.min(state.members.len());
        let mut found = Vec::with_capacity(wanted);
        let mut seen = HashSet::with_capacity(wanted);

        let mut visited = 0;
        while visited < len && found.len() < wanted {
            let position = state.positions[(start + visited) % len];
            if let Some(owners) = state.owners.get(&position) {
                for owner in owners {
                    if found.len() == wanted {
                        break;
                    }
                    if seen.insert(owner) {
                        found.push(owner.clone());
                    }
                }
            }
            visited += 1;
        }

        found
    }

    /// Apply a batch of additions and removals atomically.
    ///
    /// Removals are applied first, against the sorted array; additions are
    /// then appended and the whole array is radix-sorted once. A server
    /// named in both lists ends up absent. Adding a current member or
    /// removing a non-member does nothing.
    ///
    /// Listeners are notified after the lock is released; see the type-level
    /// notes on event ordering.
    ///
    /// # Performance
    ///
    /// Replica positions are hashed before the write lock is taken. Under
    /// the lock, removals cost one merge pass over the position array and
    /// additions one radix sort, however many servers the batch names.
    pub fn add_remove(&self, add: &[Server], remove: &[Server]) -> RingChange {
        // Hash outside the lock; replicas of no-op servers are just dropped.
        let removals: Vec<(&Server, Vec<u64>)> = remove
            .iter()
            .map(|server| (server, self.replicas(server)))
            .collect();
        let removing: HashSet<&Server> = remove.iter().collect();
        let additions: Vec<(&Server, Vec<u64>)> = add
            .iter()
            .filter(|server| {
                let skip = removing.contains(*server);
                if skip {
                    debug!(server = %server, "server both added and removed in one batch, leaving it out");
                }
                !skip
            })
            .map(|server| (server, self.replicas(server)))
            .collect();

        let change = {
            let mut state = self.state.write();
            let old_checksum = state.checksum();

            let mut removed = Vec::new();
            for (server, replicas) in removals {
                if state.remove_server(server, replicas) {
                    trace!(server = %server, "removed server from ring");
                    removed.push(server.clone());
                } else {
                    debug!(server = %server, "server not on ring, nothing to remove");
                }
            }

            let mut added = Vec::new();
            for (server, replicas) in additions {
                if state.add_server_unsorted(server, replicas) {
                    trace!(server = %server, "added server to ring");
                    added.push(server.clone());
                } else {
                    debug!(server = %server, "server already on ring, nothing to add");
                }
            }

            if !added.is_empty() {
                state.sort();
            }

            let change = RingChange {
                added,
                removed,
                old_checksum,
                new_checksum: state.checksum(),
            };
            if !change.is_empty() {
                self.outbox.lock().queue.push_back(change.clone());
            }
            change
        };

        if !change.is_empty() {
            debug!(
                added = change.added.len(),
                removed = change.removed.len(),
                checksum = change.new_checksum,
                "applied ring membership batch"
            );
            self.deliver_pending();
        }

        change
    }

    /// Add every server in `servers` in one batch.
    pub fn add_servers(&self, servers: &[Server]) -> RingChange {
        self.add_remove(servers, &[])
    }

    /// Remove every server in `servers` in one batch.
    pub fn remove_servers(&self, servers: &[Server]) -> RingChange {
        self.add_remove(&[], servers)
    }

    /// Add a single server. Returns `false` if it was already a member.
    pub fn add_server(&self, server: Server) -> bool {
        !self.add_remove(&[server], &[]).is_empty()
    }

    /// Remove a single server. Returns `false` if it was not a member.
    pub fn remove_server(&self, server: &Server) -> bool {
        !self.add_remove(&[], std::slice::from_ref(server)).is_empty()
    }

    /// XOR of every position on the ring.
    ///
    /// Rings with the same position multiset produce the same checksum no
    /// matter the order the servers were added or removed in. XOR cannot tell
    /// every multiset apart, though: a value present twice cancels out, so two
    /// different rings can share a checksum.
    pub fn checksum(&self) -> u64 {
        self.state.read().checksum()
    }

    /// True if `server` is currently a member.
    pub fn has_server(&self, server: &Server) -> bool {
        self.state.read().members.contains(server)
    }

    pub fn server_count(&self) -> usize {
        self.state.read().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().members.is_empty()
    }

    /// Members, sorted by address.
    pub fn servers(&self) -> Vec<Server> {
        let mut servers: Vec<Server> = self.state.read().members.iter().cloned().collect();
        servers.sort();
        servers
    }

    /// Length of the position array: `replica_points` per member.
    pub fn position_count(&self) -> usize {
        self.state.read().positions.len()
    }

    /// Snapshot of the sorted position array.
    pub fn positions(&self) -> Vec<u64> {
        self.state.read().positions.clone()
    }

    /// Snapshot of every (position, owner) pair in ring order.
    pub fn vnodes(&self) -> Vec<VirtualNode> {
        let state = self.state.read();
        let mut vnodes = Vec::with_capacity(state.positions.len());
        let mut previous = None;
        for &position in &state.positions {
            if previous == Some(position) {
                continue;
            }
            previous = Some(position);
            if let Some(owners) = state.owners.get(&position) {
                vnodes.extend(
                    owners
                        .iter()
                        .map(|owner| VirtualNode::new(position, owner.clone())),
                );
            }
        }
        vnodes
    }

    pub fn replica_points(&self) -> usize {
        self.replica_points
    }

    /// Name of the partitioner, e.g. `"xxh3"`.
    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }

    fn replicas(&self, server: &Server) -> Vec<u64> {
        replica_positions(server, self.replica_points, &*self.partitioner)
    }

    /// Deliver queued changes in order, unless another call is already
    /// doing so. That includes a listener applying a batch from inside
    /// `handle_event`, whose change then waits for the current one.
    fn deliver_pending(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining || outbox.queue.is_empty() {
                return;
            }
            outbox.draining = true;
        }

        loop {
            let change = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(change) => change,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.notify(&change);
        }
    }

    fn notify(&self, change: &RingChange) {
        // Clone out so listeners can register more listeners.
        let listeners = self.listeners.read().clone();
        if listeners.is_empty() {
            return;
        }

        let changed = RingEvent::RingChanged {
            added: change.added.clone(),
            removed: change.removed.clone(),
        };
        for listener in &listeners {
            listener.handle_event(&changed);
        }

        if change.checksum_changed() {
            let checksum = RingEvent::RingChecksum {
                old_checksum: change.old_checksum,
                new_checksum: change.new_checksum,
            };
            for listener in &listeners {
                listener.handle_event(&checksum);
            }
        }
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("HashRing")
            .field("partitioner", &self.partitioner.name())
            .field("replica_points", &self.replica_points)
            .field("servers", &state.members.len())
            .field("positions", &state.positions.len())
            .finish()
    }
}

/// Builder for [`HashRing`].
///
/// Unlike [`HashRing::new`], `build` validates the configuration and fails
/// if no partitioner was chosen.
#[derive(Default)]
pub struct RingBuilder {
    config: RingConfig,
    partitioner: Option<Box<dyn Partitioner>>,
    listeners: Vec<Arc<dyn RingEventListener>>,
    servers: Vec<Server>,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole config.
    ///
    /// Only `replica_points` is read by `build`; `config.hash` takes effect
    /// through [`with_configured_partitioner`](Self::with_configured_partitioner).
    pub fn with_config(mut self, config: RingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_replica_points(mut self, replica_points: usize) -> Self {
        self.config.replica_points = replica_points;
        self
    }

    /// Hash keys and replica keys with `partitioner`. Replaces any earlier
    /// choice.
    pub fn with_partitioner(mut self, partitioner: impl Partitioner) -> Self {
        self.partitioner = Some(Box::new(partitioner));
        self
    }

    /// Use the hash algorithm named in the current config.
    pub fn with_configured_partitioner(mut self) -> Self {
        self.partitioner = Some(self.config.partitioner());
        self
    }

    /// Register a listener before any server is added, so it also sees the
    /// builder's own servers join.
    pub fn with_listener(mut self, listener: Arc<dyn RingEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Server to place on the ring when it is built.
    pub fn add_server(mut self, server: impl Into<Server>) -> Self {
        self.servers.push(server.into());
        self
    }

    /// Validate the config and create the ring with its initial servers.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `replica_points` is zero
    /// - [`Error::MissingPartitioner`] if no partitioner was chosen
    pub fn build(self) -> Result<HashRing> {
        self.config.validate()?;
        let partitioner = self.partitioner.ok_or(Error::MissingPartitioner)?;

        let ring = HashRing::from_parts(self.config.replica_points, partitioner);
        for listener in self.listeners {
            ring.add_listener(listener);
        }
        if !self.servers.is_empty() {
            ring.add_servers(&self.servers);
        }
        Ok(ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partitioner::{SipPartitioner, Xxh3Partitioner};

    fn ring(replica_points: usize) -> HashRing {
        HashRing::new(replica_points, Xxh3Partitioner)
    }

    fn servers(addresses: &[&str]) -> Vec<Server> {
        addresses.iter().map(|a| Server::new(a)).collect()
    }

    /// Checks the structural invariants of the guarded state.
    fn assert_consistent(ring: &HashRing) {
        let state = ring.state.read();
        assert!(state.positions.windows(2).all(|w| w[0] <= w[1]), "positions unsorted");
        assert_eq!(state.scratch.len(), state.positions.len());
        assert_eq!(
            state.positions.len(),
            ring.replica_points * state.members.len()
        );
        for position in &state.positions {
            assert!(state.owners.contains_key(position), "position {position} has no owner");
        }
        let owners: HashSet<&Server> = state.owners.values().flatten().collect();
        let members: HashSet<&Server> = state.members.iter().collect();
        assert_eq!(owners, members);
    }

    #[test]
    fn test_state_consistent_through_churn() {
        let ring = ring(16);
        let all = servers(&["a:1", "b:1", "c:1", "d:1", "e:1"]);

        ring.add_servers(&all[..3]);
        assert_consistent(&ring);

        ring.add_remove(&all[3..], &all[..1]);
        assert_consistent(&ring);

        ring.remove_servers(&all);
        assert_consistent(&ring);
        assert!(ring.state.read().owners.is_empty());
    }

    #[test]
    fn test_colliding_positions_survive_partial_removal() {
        // Every replica of every server lands on the same position.
        let ring = HashRing::new(3, |_: &[u8]| 42u64);
        let a = Server::new("a:1");
        let b = Server::new("b:1");

        ring.add_servers(&[a.clone(), b.clone()]);
        assert_eq!(ring.positions(), vec![42; 6]);
        assert_eq!(ring.lookup("key"), Some(a.clone()));
        assert_eq!(ring.lookup_n_unique("key", 2), vec![a.clone(), b.clone()]);
        assert_consistent(&ring);

        ring.remove_server(&a);
        assert_eq!(ring.positions(), vec![42; 3]);
        assert_eq!(ring.lookup("key"), Some(b));
        assert_eq!(ring.checksum(), 42);
        assert_consistent(&ring);
    }

    #[test]
    fn test_add_and_remove_same_server_in_one_batch() {
        let ring = ring(4);
        let a = Server::new("a:1");
        let b = Server::new("b:1");

        let change = ring.add_remove(&[a.clone(), b.clone()], &[a.clone()]);
        assert_eq!(change.added, vec![b.clone()]);
        assert!(change.removed.is_empty());
        assert!(!ring.has_server(&a));

        ring.add_server(a.clone());
        let change = ring.add_remove(&[a.clone()], &[a.clone()]);
        assert_eq!(change.removed, vec![a.clone()]);
        assert!(!ring.has_server(&a));
        assert_consistent(&ring);
    }

    #[test]
    fn test_lookup_wraps_past_last_position() {
        let ring = HashRing::new(1, |key: &[u8]| -> u64 {
            match key {
                b"low:0" => 10,
                b"high:0" => 20,
                _ => 1000,
            }
        });
        ring.add_servers(&servers(&["low", "high"]));

        // Key hashes past the highest position and wraps to the lowest.
        assert_eq!(ring.lookup("anything").unwrap().address(), "low");
    }

    #[test]
    fn test_new_hashes_replicas_with_given_partitioner() {
        let ring = HashRing::new(3, SipPartitioner);
        let a = Server::new("a:1");
        ring.add_server(a.clone());

        let mut expected = replica_positions(&a, 3, &SipPartitioner);
        expected.sort_unstable();
        assert_eq!(ring.positions(), expected);
        assert_eq!(ring.partitioner_name(), "sip13");
        assert_eq!(ring.replica_points(), 3);
    }

    #[test]
    fn test_batch_applied_from_listener_delivered_after_current() {
        let ring = Arc::new(ring(4));
        let a = Server::new("a:1");
        let b = Server::new("b:1");
        let events = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&ring);
        let sink = Arc::clone(&events);
        let (first, second) = (a.clone(), b.clone());
        ring.add_listener(Arc::new(move |event: &RingEvent| {
            sink.lock().push(event.clone());
            if let RingEvent::RingChanged { added, .. } = event {
                if added == &[first.clone()] {
                    inner.add_server(second.clone());
                }
            }
        }));

        ring.add_server(a.clone());

        let events = events.lock().clone();
        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], RingEvent::RingChanged { added, .. } if added == &[a.clone()]));
        assert!(matches!(&events[1], RingEvent::RingChecksum { old_checksum: 0, .. }));
        assert!(matches!(&events[2], RingEvent::RingChanged { added, .. } if added == &[b.clone()]));
        match (&events[1], &events[3]) {
            (
                RingEvent::RingChecksum { new_checksum: first, .. },
                RingEvent::RingChecksum { old_checksum: second, new_checksum: last },
            ) => {
                assert_eq!(first, second);
                assert_eq!(*last, ring.checksum());
            }
            other => panic!("unexpected events {:?}", other),
        }
        assert!(ring.outbox.lock().queue.is_empty());
        assert!(!ring.outbox.lock().draining);
    }

    #[test]
    fn test_zero_replica_points_raised_to_one() {
        let ring = ring(0);
        assert_eq!(ring.replica_points(), 1);
        ring.add_server(Server::new("a:1"));
        assert_eq!(ring.position_count(), 1);
    }

    #[test]
    fn test_builder_requires_partitioner() {
        let result = RingBuilder::new().with_replica_points(3).build();
        assert!(matches!(result, Err(Error::MissingPartitioner)));
    }

    #[test]
    fn test_builder_rejects_zero_replicas() {
        let result = RingBuilder::new()
            .with_replica_points(0)
            .with_partitioner(Xxh3Partitioner)
            .build();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
