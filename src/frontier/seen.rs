//! Probabilistic seen-set over canonical URL strings
//!
//! A Bloom filter sized for an expected item count and false-positive rate.
//! It answers "definitely new" vs "possibly seen": a false positive makes
//! the crawler silently skip a URL, which is acceptable loss; a false
//! negative would re-admit an already-crawled URL, so the filter never
//! forgets a key it has reported as new.
//!
//! The bit array is a vector of `AtomicU64` words so that many workers can
//! call `test_and_mark` without a lock. Two concurrent calls racing on the
//! same key may both observe "new"; the admission stage tolerates the rare
//! double-admission that results.

use std::sync::atomic::{AtomicU64, Ordering};

// Well-spaced seeds for the two base hashes used in double hashing.
const HASH_SEEDS: [u64; 2] = [0x517c_c1b7_2722_0a95, 0x9e37_79b1_85eb_ca87];

/// Space-bounded approximate membership set for discovered URLs
pub struct SeenSet {
    words: Vec<AtomicU64>,
    bit_count: u64,
    hash_count: u32,
}

impl SeenSet {
    /// Creates a filter sized for `expected_items` keys at the given
    /// false-positive rate
    ///
    /// Uses the standard Bloom sizing formulas: `m = -n·ln p / (ln 2)²`
    /// bits and `k = (m/n)·ln 2` hash functions.
    pub fn with_capacity(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = false_positive_rate.clamp(1e-9, 0.5);

        let ln2 = std::f64::consts::LN_2;
        let bits = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(64.0) as u64;
        let hash_count = ((bits as f64 / n) * ln2).round().max(1.0) as u32;

        let word_count = bits.div_ceil(64) as usize;
        let mut words = Vec::with_capacity(word_count);
        words.resize_with(word_count, || AtomicU64::new(0));

        Self {
            words,
            bit_count: word_count as u64 * 64,
            hash_count,
        }
    }

    /// Tests whether a key was seen before and marks it as seen
    ///
    /// Returns `true` if the key was (possibly) already present. Once this
    /// method has returned `true` for a key, every later call with that key
    /// also returns `true`.
    pub fn test_and_mark(&self, key: &str) -> bool {
        let data = key.as_bytes();
        let h1 = mix(data, HASH_SEEDS[0]);
        let h2 = mix(data, HASH_SEEDS[1]);

        let mut already_seen = true;
        for i in 0..self.hash_count as u64 {
            let idx = h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_count;
            let word = (idx / 64) as usize;
            let mask = 1u64 << (idx % 64);
            let prev = self.words[word].fetch_or(mask, Ordering::Relaxed);
            if prev & mask == 0 {
                already_seen = false;
            }
        }
        already_seen
    }

    /// Marks a key as seen without caring whether it was new
    ///
    /// Used when priming the filter from persisted site URLs at startup.
    pub fn mark(&self, key: &str) {
        let _ = self.test_and_mark(key);
    }
}

// Seeded byte mixer shared by both base hashes.
fn mix(data: &[u8], seed: u64) -> u64 {
    let mut hash = seed ^ data.len() as u64;
    for &byte in data {
        hash ^= (byte as u64).wrapping_mul(0x1000_0000_01b3);
        hash = hash.rotate_left(13).wrapping_mul(0xff51_afd7_ed55_8ccd);
    }
    hash ^ (hash >> 33)
}
