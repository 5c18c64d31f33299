//! # Bloom Filter Module
//!
//! A fixed-size probabilistic set membership filter packed into `u64`
//! words, sized from an expected element count `n` and a target
//! false-positive rate `p` using the standard formulas:
//!
//! ```text
//! m = ceil(-(n * ln(p)) / (ln(2)^2))   // bits
//! k = ceil((m / n) * ln(2))            // hash functions, at least 1
//! ```
//!
//! The `k` hash values for a given key come from [`Key::hash`]'s double
//! hashing scheme rather than `k` independent hash functions.

use thiserror::Error;

use crate::key::Key;

/// Errors constructing a [`BloomFilter`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BloomError {
    /// `p` must lie in the open interval `(0, 1)`.
    #[error("false positive rate must be in (0, 1), got {0}")]
    InvalidFalsePositiveRate(f64),

    /// The expected element count must be positive — a zero-capacity
    /// filter has no well-defined bit width.
    #[error("expected element count must be positive, got {0}")]
    InvalidCapacity(u32),
}

const WORD_BITS: u32 = u64::BITS;

/// A packed-bitset Bloom filter over [`Key`] membership.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    // `m` from the sizing formula, exactly. Addressing reduces modulo this
    // value, not the word-rounded backing vector's bit capacity.
    num_bits: u32,
    num_hashes: u32,
}

impl BloomFilter {
    /// Builds a filter sized for `expected_items` elements at false
    /// positive rate `p`.
    ///
    /// # Errors
    /// Returns [`BloomError::InvalidFalsePositiveRate`] unless
    /// `0.0 < p < 1.0`, or [`BloomError::InvalidCapacity`] if
    /// `expected_items == 0`.
    pub fn new(expected_items: u32, false_positive_rate: f64) -> Result<Self, BloomError> {
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(BloomError::InvalidFalsePositiveRate(false_positive_rate));
        }
        if expected_items == 0 {
            return Err(BloomError::InvalidCapacity(expected_items));
        }

        let n = f64::from(expected_items);
        let ln2 = std::f64::consts::LN_2;
        let m = ((-(n * false_positive_rate.ln()) / (ln2 * ln2)).ceil() as u32).max(1);
        let k = (((m as f64 / n) * ln2).ceil() as u32).max(1);

        let num_words = m.div_ceil(WORD_BITS);
        Ok(BloomFilter {
            bits: vec![0u64; num_words as usize],
            num_bits: m,
            num_hashes: k,
        })
    }

    /// Total number of bits backing this filter.
    pub fn num_bits(&self) -> u32 {
        self.num_bits
    }

    /// Number of hash functions (double-hashing rounds) used per key.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Records `key` as present.
    pub fn insert(&mut self, key: &Key) {
        for h in key.hash(self.num_hashes) {
            let bit = h % self.num_bits;
            self.set_bit(bit);
        }
    }

    /// Returns `true` if `key` *might* be present (false positives
    /// possible); `false` means `key` is definitely absent.
    pub fn contains(&self, key: &Key) -> bool {
        key.hash(self.num_hashes)
            .into_iter()
            .all(|h| self.get_bit(h % self.num_bits))
    }

    fn set_bit(&mut self, bit: u32) {
        let word = (bit / WORD_BITS) as usize;
        let offset = bit % WORD_BITS;
        self.bits[word] |= 1u64 << offset;
    }

    fn get_bit(&self, bit: u32) -> bool {
        let word = (bit / WORD_BITS) as usize;
        let offset = bit % WORD_BITS;
        (self.bits[word] >> offset) & 1 == 1
    }
}
