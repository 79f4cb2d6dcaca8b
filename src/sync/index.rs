//! Key-to-stripe index mapping.
//!
//! Maps any `Hash`able key to a stripe index in `[0, size)`, where `size` is
//! the requested stripe count rounded up to a power of two.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stripe Index Flow                               │
//! │                                                                         │
//! │   Input Key                                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   ┌───────────────────────────────────────────────────────────────┐   │
//! │   │  StripeIndexer { mask: 0b0111 }   (stripes = 8)               │   │
//! │   │                                                               │   │
//! │   │  1. FxHasher:  key.hash(&mut hasher)                          │   │
//! │   │  2. Fold:      h = (hash ^ (hash >> 32)) as u32               │   │
//! │   │  3. Smear:     h ^= (h >> 20) ^ (h >> 12)                     │   │
//! │   │                h ^= (h >> 7) ^ (h >> 4)                       │   │
//! │   │  4. Mask:      h & mask                                       │   │
//! │   └───────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │   Stripe Index: 0..=7                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! Sizing
//! ──────
//!   requested ≤ 2^30  → size = requested.next_power_of_two(), mask = size - 1
//!   requested > 2^30  → mask = 2^31 - 1 (all index bits set), size = 2^31
//! ```
//!
//! ## Key Concepts
//!
//! - **Deterministic mapping**: the same key always yields the same index for
//!   a given indexer.
//! - **Smear**: the avalanche step spreads entropy from the high bits of the
//!   hash into the low bits the mask keeps, so weak hashes (sequential
//!   integers) still spread across stripes.
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::sync::StripeIndexer;
//!
//! let indexer = StripeIndexer::new(6);
//! assert_eq!(indexer.size(), 8);
//!
//! let index = indexer.index_for(&"user:123");
//! assert!(index < 8);
//! assert_eq!(indexer.index_for(&"user:123"), index);
//! ```

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::error::ConfigError;

/// Largest power of two a stripe count is rounded up to.
pub const MAX_POWER_OF_TWO: usize = 1 << 30;

/// Mask used once the requested stripe count exceeds [`MAX_POWER_OF_TWO`].
pub const ALL_SET: usize = (1 << 31) - 1;

/// Avalanche transform applied to a 32-bit hash before masking.
#[inline]
pub fn smear(hash: u32) -> u32 {
    let mut h = hash;
    h ^= (h >> 20) ^ (h >> 12);
    h ^ (h >> 7) ^ (h >> 4)
}

/// Maps keys to stripe indexes in `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StripeIndexer {
    mask: usize,
}

impl StripeIndexer {
    /// Creates an indexer for `stripes` stripes.
    ///
    /// # Panics
    ///
    /// Panics if `stripes` is zero.
    pub fn new(stripes: usize) -> Self {
        match Self::try_new(stripes) {
            Ok(indexer) => indexer,
            Err(err) => panic!("{err}"),
        }
    }

    /// Fallible version of [`new`](Self::new).
    pub fn try_new(stripes: usize) -> Result<Self, ConfigError> {
        if stripes == 0 {
            return Err(ConfigError::new("stripes must be > 0"));
        }
        let mask = if stripes > MAX_POWER_OF_TWO {
            ALL_SET
        } else {
            stripes.next_power_of_two() - 1
        };
        Ok(Self { mask })
    }

    /// Number of addressable stripes (`mask + 1`).
    pub fn size(&self) -> usize {
        self.mask + 1
    }

    /// Bit mask applied to the smeared hash.
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// `true` when the requested count overflowed into the all-bits mask.
    pub fn is_saturated(&self) -> bool {
        self.mask == ALL_SET
    }

    /// Maps `key` to its stripe index.
    ///
    /// ```
    /// use stripekit::sync::StripeIndexer;
    ///
    /// let indexer = StripeIndexer::new(4);
    /// let int_index = indexer.index_for(&12345_u64);
    /// assert!(int_index < 4);
    /// ```
    #[inline]
    pub fn index_for<K: Hash + ?Sized>(&self, key: &K) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        let hash = hasher.finish();
        let folded = (hash ^ (hash >> 32)) as u32;
        (smear(folded) as usize) & self.mask
    }
}
