//! Consistent hash ring implementation.
//!
//! The ring keeps a sorted array of replica positions; `radix` restores the
//! order after a membership batch and `search` locates and removes positions.

pub mod radix;
pub mod ring;
pub mod search;

pub use radix::{radix_sort, radix_sort_vec};
pub use ring::{HashRing, RingBuilder, RingChange};
pub use search::{index_of, remove_sorted};
