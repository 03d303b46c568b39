//! Error types for the hash ring.

use thiserror::Error;

/// Result type alias for the hash ring.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or building a ring.
///
/// Lookups and membership updates never fail; an empty ring or a short
/// membership list shows up as an empty or partial result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The builder was finished without a hash function.
    #[error("no partitioner configured for the ring")]
    MissingPartitioner,
    /// Configuration values out of range.
    #[error("invalid ring configuration: {0}")]
    InvalidConfig(String),
    /// Hash algorithm name not recognised.
    #[error("unknown hash algorithm: {0}")]
    UnknownHashAlgorithm(String),
}
