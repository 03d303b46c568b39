//! xxHash partitioners.

use crate::partitioner::traits::Partitioner;
use xxhash_rust::{xxh3, xxh64};

/// XXH3 64-bit partitioner. The default for new rings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Partitioner;

impl Partitioner for Xxh3Partitioner {
    #[inline]
    fn hash(&self, key: &[u8]) -> u64 {
        xxh3::xxh3_64(key)
    }

    fn name(&self) -> &'static str {
        "xxh3"
    }
}

/// XXH64 partitioner with a zero seed.
#[derive(Clone, Copy, Debug, Default)]
pub struct XxHash64Partitioner;

impl Partitioner for XxHash64Partitioner {
    #[inline]
    fn hash(&self, key: &[u8]) -> u64 {
        xxh64::xxh64(key, 0)
    }

    fn name(&self) -> &'static str {
        "xxh64"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Server;
    use std::collections::HashSet;

    /// Replica positions of one server, bucketed by their top three bits.
    fn octants<P: Partitioner>(partitioner: &P, server: &Server, replicas: usize) -> [usize; 8] {
        let mut octants = [0; 8];
        for i in 0..replicas {
            let position = partitioner.hash_str(&server.replica_key(i));
            octants[(position >> 61) as usize] += 1;
        }
        octants
    }

    #[test]
    fn test_replica_keys_spread_around_ring() {
        let server = Server::new("10.0.0.1:3000");
        for octants in [
            octants(&Xxh3Partitioner, &server, 1024),
            octants(&XxHash64Partitioner, &server, 1024),
        ] {
            // 128 expected per octant.
            assert!(
                octants.iter().all(|count| (64..=192).contains(count)),
                "replicas clumped: {:?}",
                octants
            );
        }
    }

    #[test]
    fn test_replica_positions_distinct() {
        let server = Server::new("10.0.0.1:3000");
        let positions: HashSet<u64> = (0..1000)
            .map(|i| Xxh3Partitioner.hash_str(&server.replica_key(i)))
            .collect();
        assert_eq!(positions.len(), 1000);
    }

    #[test]
    fn test_xxh3_and_xxh64_place_servers_differently() {
        let key = Server::new("10.0.0.1:3000").replica_key(0);
        assert_eq!(Xxh3Partitioner.hash_str(&key), xxh3::xxh3_64(key.as_bytes()));
        assert_eq!(XxHash64Partitioner.hash_str(&key), xxh64::xxh64(key.as_bytes(), 0));
        assert_ne!(Xxh3Partitioner.hash_str(&key), XxHash64Partitioner.hash_str(&key));
    }
}
