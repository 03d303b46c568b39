//! Ring configuration.
//!
//! Configuration is an explicit value handed to the ring at construction;
//! there is no process-wide setting. Loading it (files, environment) is up to
//! the embedding application, which can deserialize a `RingConfig` with serde.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::partitioner::{Partitioner, SipPartitioner, XxHash64Partitioner, Xxh3Partitioner};

/// Default number of replica points (virtual positions) per server.
pub const DEFAULT_REPLICA_POINTS: usize = 100;

/// Built-in hash functions selectable by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Xxh3,
    Xxh64,
    Sip,
}

impl HashAlgorithm {
    /// Instantiate the partitioner for this algorithm.
    pub fn partitioner(self) -> Box<dyn Partitioner> {
        match self {
            HashAlgorithm::Xxh3 => Box::new(Xxh3Partitioner),
            HashAlgorithm::Xxh64 => Box::new(XxHash64Partitioner),
            HashAlgorithm::Sip => Box::new(SipPartitioner),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xxh3" => Ok(HashAlgorithm::Xxh3),
            "xxh64" => Ok(HashAlgorithm::Xxh64),
            "sip" | "sip13" => Ok(HashAlgorithm::Sip),
            other => Err(Error::UnknownHashAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashAlgorithm::Xxh3 => "xxh3",
            HashAlgorithm::Xxh64 => "xxh64",
            HashAlgorithm::Sip => "sip",
        };
        f.write_str(name)
    }
}

/// Configuration for a [`HashRing`](crate::HashRing).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Virtual positions generated per server. Defaults to
    /// [`DEFAULT_REPLICA_POINTS`].
    pub replica_points: usize,
    /// Hash function used when the ring is built from configuration alone.
    pub hash: HashAlgorithm,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            replica_points: DEFAULT_REPLICA_POINTS,
            hash: HashAlgorithm::default(),
        }
    }
}

impl RingConfig {
    pub fn with_replica_points(replica_points: usize) -> Self {
        Self {
            replica_points,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.replica_points == 0 {
            return Err(Error::InvalidConfig(
                "replica_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Partitioner for the configured hash algorithm.
    pub fn partitioner(&self) -> Box<dyn Partitioner> {
        self.hash.partitioner()
    }
}
