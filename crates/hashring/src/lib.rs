//! Consistent hash ring.
//!
//! This crate maps lookup keys to a stable subset of member servers:
//! - Server identity and replica (virtual node) positions
//! - Partitioners (hash functions from keys to ring positions)
//! - A sorted position array kept in order by a batched radix sort
//! - Lookup, unique-N lookup and membership checksums
//! - An optional event seam for ring change notifications

pub mod config;
pub mod error;
pub mod events;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod vnode;

pub use config::{HashAlgorithm, RingConfig, DEFAULT_REPLICA_POINTS};
pub use error::{Error, Result};
pub use events::{RingEvent, RingEventListener};
pub use node::Server;
pub use partitioner::Partitioner;
pub use ring::{HashRing, RingBuilder, RingChange};
pub use vnode::VirtualNode;
