//! Server abstractions for the consistent hash ring.
//!
//! A server is identified by its logical address (usually `host:port`). The
//! address is both the input for its replica positions and the unit of
//! identity: two `Server` values with the same address are the same member.

use std::fmt;
use std::sync::Arc;

/// Member of the ring.
///
/// Cheap to clone; the address is shared and never mutated after
/// construction, so the ring can keep one copy per position without
/// reallocating strings.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Server {
    address: Arc<str>,
}

impl Server {
    /// Construct a server from its address.
    pub fn new(address: impl AsRef<str>) -> Self {
        Self {
            address: Arc::from(address.as_ref()),
        }
    }

    /// Logical address, e.g. `10.0.0.1:3000`.
    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Key hashed for replica `index`: `"<address>:<index>"`.
    pub fn replica_key(&self, index: usize) -> String {
        format!("{}:{}", self.address, index)
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Server({})", self.address)
    }
}

impl From<&str> for Server {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Server {
    fn from(address: String) -> Self {
        Self {
            address: Arc::from(address),
        }
    }
}
