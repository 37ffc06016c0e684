//! Fixed-size bloom filter sized from an expected item count and target false-positive rate
use std::collections::hash_map::DefaultHasher;
use std::f64::consts::LN_2;
use std::hash::{Hash, Hasher};

const MIN_BITS: u64 = 64;
const MAX_HASHES: u32 = 32;
/// Salt for the second hash of the Kirsch-Mitzenmacher double-hashing scheme.
const SECOND_HASH_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: u64,
    num_hashes: u32,
    false_positive_rate: f64,
}

impl BloomFilter {
    /// `m = -n ln p / (ln 2)^2` bits and `k = (m / n) ln 2` hash functions.
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let m = (-(n * false_positive_rate.ln()) / (LN_2 * LN_2))
            .ceil()
            .max(MIN_BITS as f64) as u64;
        let k = ((m as f64 / n) * LN_2).round().clamp(1.0, MAX_HASHES as f64) as u32;

        Self {
            bits: vec![0; m.div_ceil(64) as usize],
            num_bits: m,
            num_hashes: k,
            false_positive_rate,
        }
    }

    pub fn num_bits(&self) -> u64 {
        self.num_bits
    }

    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// The rate the filter was sized for, not a measured value.
    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    pub fn insert(&mut self, item: &str) {
        let (h1, h2) = Self::hash_pair(item);
        for i in 0..self.num_hashes {
            let bit = self.bit_index(h1, h2, i);
            self.bits[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    pub fn contains(&self, item: &str) -> bool {
        let (h1, h2) = Self::hash_pair(item);
        (0..self.num_hashes).all(|i| {
            let bit = self.bit_index(h1, h2, i);
            self.bits[(bit / 64) as usize] & (1 << (bit % 64)) != 0
        })
    }

    fn bit_index(&self, h1: u64, h2: u64, i: u32) -> u64 {
        h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.num_bits
    }

    fn hash_pair(item: &str) -> (u64, u64) {
        let mut first = DefaultHasher::new();
        item.hash(&mut first);

        let mut second = DefaultHasher::new();
        SECOND_HASH_SALT.hash(&mut second);
        item.hash(&mut second);

        // odd step so successive probes never collapse onto one bit
        (first.finish(), second.finish() | 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizing_matches_textbook_formula() {
        let filter = BloomFilter::with_rate(1_000_000, 0.001);
        // ~14.38 bits per item and 10 hashes for p = 0.1%
        assert!((14_370_000..14_390_000).contains(&filter.num_bits()));
        assert_eq!(filter.num_hashes(), 10);
    }

    #[test]
    fn tiny_filters_still_have_room() {
        let filter = BloomFilter::with_rate(0, 0.5);
        assert_eq!(filter.num_bits(), MIN_BITS);
        assert!(filter.num_hashes() >= 1);
    }

    #[test]
    fn no_false_negatives() {
        let mut filter = BloomFilter::with_rate(5_000, 0.01);
        for i in 0..5_000 {
            filter.insert(&format!("member-{i}"));
        }
        assert!((0..5_000).all(|i| filter.contains(&format!("member-{i}"))));
    }

    #[test]
    fn false_positive_rate_is_near_target() {
        let mut filter = BloomFilter::with_rate(1_000, 0.01);
        for i in 0..1_000 {
            filter.insert(&format!("member-{i}"));
        }
        let trials = 20_000;
        let false_positives = (0..trials)
            .filter(|i| filter.contains(&format!("absent-{i}")))
            .count();
        let observed = false_positives as f64 / trials as f64;
        assert!(observed < 0.02, "observed false-positive rate {observed}");
    }
}
