use std::hash::Hasher;

use twox_hash::XxHash64;

/// Selection score for an observation competing inside one time slice.
///
/// Implementations must have the avalanche property: for a fixed `seed`,
/// distinct values map to scores that behave like independent uniform
/// draws, and changing `seed` reshuffles all of them. Score `0` is the
/// "no winner yet" sentinel of the reservoir and must never be returned.
pub trait ScoreFunction: Send + Sync {
    fn score(&self, value: f64, seed: u32) -> u64;
}

/// xxHash64 over the raw bytes of the value, keyed by the slice seed.
#[derive(Debug, Clone, Copy, Default)]
pub struct XxScore;

impl ScoreFunction for XxScore {
    fn score(&self, value: f64, seed: u32) -> u64 {
        let mut h = XxHash64::with_seed(u64::from(seed));
        h.write(&value.to_bits().to_le_bytes());
        // 0 is reserved; folding it onto 1 costs one value in 2^64.
        h.finish().max(1)
    }
}
