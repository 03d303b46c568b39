//! Core partitioner trait definitions.

/// A partitioner converts keys into positions on the hash ring.
///
/// Implementations must be deterministic: the same bytes always hash to the
/// same position. The ring assumes this and does not check it; a
/// non-deterministic partitioner produces arbitrary placement.
///
/// Any `Fn(&[u8]) -> u64` closure that is `Send + Sync` is a partitioner.
pub trait Partitioner: Send + Sync + 'static {
    /// Hash `key` to a ring position.
    fn hash(&self, key: &[u8]) -> u64;

    /// Returns the name of this partitioner.
    fn name(&self) -> &'static str {
        "custom"
    }

    /// Hash a string key.
    #[inline]
    fn hash_str(&self, key: &str) -> u64 {
        self.hash(key.as_bytes())
    }
}

impl<F> Partitioner for F
where
    F: Fn(&[u8]) -> u64 + Send + Sync + 'static,
{
    fn hash(&self, key: &[u8]) -> u64 {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_partitioner() {
        let p = |key: &[u8]| key.len() as u64;
        assert_eq!(p.hash(b"abc"), 3);
        assert_eq!(p.hash_str("abcd"), 4);
        assert_eq!(Partitioner::name(&p), "custom");
    }

    #[test]
    fn test_trait_object_dispatch() {
        let boxed: Box<dyn Partitioner> = Box::new(crate::partitioner::Xxh3Partitioner);
        assert_eq!(boxed.name(), "xxh3");
        assert_eq!(
            boxed.hash(b"key"),
            crate::partitioner::Xxh3Partitioner.hash(b"key")
        );
    }
}
