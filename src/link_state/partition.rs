//! Hash partitioning and the shuffle between partitions
//! Any two datasets split by the same `Partitioner` are co-partitioned: a key
//! lands in the same partition index in both, so they can be joined one
//! partition at a time without moving anything.

use fnv::FnvHasher;

use std::hash::Hasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partitioner {
    partitions: usize,
}

impl Partitioner {
    pub fn new(partitions: usize) -> Self {
        Partitioner { partitions: partitions.max(1) }
    }
    pub fn partitions(&self) -> usize {
        self.partitions
    }
    /// FNV-1a over the id bytes; stable across runs and platforms
    pub fn partition_of(&self, id: &str) -> usize {
        let mut h = FnvHasher::default();
        h.write(id.as_bytes());
        // the low bits of FNV only depend on the low bits of each byte; fold in the high half
        let h = h.finish();
        ((h ^ (h >> 32)) % self.partitions as u64) as usize
    }
    /// One empty bucket per partition
    pub fn buckets<T: Default>(&self) -> Vec<T> {
        (0..self.partitions).map(|_| T::default()).collect()
    }
}

/// Transpose per-source buckets into per-destination buckets
/// `outgoing[src][dst]` ends up as `incoming[dst][src]`, so every
/// destination sees its buckets in source order.
pub fn shuffle<T>(outgoing: Vec<Vec<T>>, partitions: usize) -> Vec<Vec<T>> {
    let mut incoming: Vec<Vec<T>> = (0..partitions)
        .map(|_| Vec::with_capacity(outgoing.len()))
        .collect();
    for buckets in outgoing {
        assert_eq!(buckets.len(), partitions, "Source produced the wrong number of buckets");
        for (dst, bucket) in buckets.into_iter().enumerate() {
            incoming[dst].push(bucket);
        }
    }
    incoming
}
