//! # Partitioner
//!
//! Routes readings to partition workers so that every reading of a meter
//! is handled by the same worker.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use ahash::AHasher;

use crate::record::MeterReading;

/// Decides which partition (0..num_partitions) a value goes to.
pub trait Partitioner<T>: Send + Sync {
    fn partition(&self, value: &T, num_partitions: usize) -> usize;
}

/// Hash-based partitioner using a key selector function.
///
/// Routing is stable for the lifetime of the process.
pub struct HashPartitioner<K, F> {
    key_selector: F,
    _phantom: PhantomData<K>,
}

impl<K, F> HashPartitioner<K, F> {
    /// Create a new hash partitioner with the given key selector.
    pub fn new(key_selector: F) -> Self {
        Self {
            key_selector,
            _phantom: PhantomData,
        }
    }
}

impl<K, T, F> Partitioner<T> for HashPartitioner<K, F>
where
    K: Hash + Send + Sync,
    F: Fn(&T) -> K + Send + Sync,
{
    fn partition(&self, value: &T, num_partitions: usize) -> usize {
        let key = (self.key_selector)(value);
        let mut hasher = AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % num_partitions
    }
}

/// Partition readings by meter id.
pub fn meter_partitioner() -> impl Partitioner<MeterReading> {
    HashPartitioner::new(|r: &MeterReading| r.meter.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(meter: &str) -> MeterReading {
        MeterReading::new(meter, 0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_same_meter_same_partition() {
        let partitioner = meter_partitioner();
        let p1 = partitioner.partition(&reading("M1"), 4);
        let p2 = partitioner.partition(&MeterReading::new("M1", 99, 5.0, 2.0).unwrap(), 4);
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_partition_in_range_and_spread() {
        let partitioner = meter_partitioner();
        let mut counts = [0usize; 4];
        for i in 0..1000 {
            let p = partitioner.partition(&reading(&format!("meter_{i}")), 4);
            assert!(p < 4);
            counts[p] += 1;
        }
        for count in counts {
            assert!(count > 150, "skewed distribution: {counts:?}");
        }
    }

    #[test]
    fn test_single_partition() {
        let partitioner = meter_partitioner();
        assert_eq!(partitioner.partition(&reading("anything"), 1), 0);
    }
}
