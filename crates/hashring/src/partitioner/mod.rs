//! Partitioner abstraction for consistent hashing.
//!
//! Partitioners convert keys (and replica keys) into 64-bit positions on
//! the ring.

pub mod sip;
pub mod traits;
pub mod xxhash;

pub use sip::SipPartitioner;
pub use traits::Partitioner;
pub use xxhash::{XxHash64Partitioner, Xxh3Partitioner};
