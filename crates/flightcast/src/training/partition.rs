//! Seeded shuffling and contiguous partitioning.

use std::ops::Range;

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{Dataset, DatasetError};

/// RNG used for shuffling training data.
pub type ShuffleRng = Xoshiro256PlusPlus;

/// Upper bound (exclusive) for drawn training seeds.
pub const MAX_DRAWN_SEED: u64 = 1_000_000_000;

/// Create the shuffle RNG for a seed.
pub fn shuffle_rng(seed: u64) -> ShuffleRng {
    Xoshiro256PlusPlus::seed_from_u64(seed)
}

/// Draw a fresh training seed from the thread RNG.
pub fn draw_seed() -> u64 {
    use rand::Rng;
    rand::thread_rng().gen_range(0..MAX_DRAWN_SEED)
}

/// Start index of each of `partition_count` contiguous partitions of `len` rows.
///
/// Starts are produced by accumulating `len / partition_count` as a float and
/// flooring each running value, so sizes differ by at most one.
pub fn partition_starts(len: usize, partition_count: usize) -> Vec<usize> {
    if partition_count == 0 {
        return Vec::new();
    }
    let size = len as f64 / partition_count as f64;
    let mut starts = Vec::with_capacity(partition_count);
    let mut exact = 0.0_f64;
    starts.push(0);
    for _ in 1..partition_count {
        exact += size;
        starts.push(exact.floor() as usize);
    }
    starts
}

/// Half-open range of partition `index`; the last one runs to `len`.
///
/// Returns `None` when `index` is not a partition.
pub fn partition_range(starts: &[usize], index: usize, len: usize) -> Option<Range<usize>> {
    let start = *starts.get(index)?;
    let end = starts.get(index + 1).copied().unwrap_or(len);
    Some(start..end)
}

/// Shuffle `dataset` in place with `seed` and return the partition starts.
pub fn shuffle_and_partition(
    dataset: &mut Dataset,
    seed: u64,
    partition_count: usize,
) -> Result<Vec<usize>, DatasetError> {
    let mut rng = shuffle_rng(seed);
    dataset.shuffle(&mut rng)?;
    Ok(partition_starts(dataset.len()?, partition_count))
}
