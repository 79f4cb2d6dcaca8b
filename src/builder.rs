//! Builder for striped segment sets.
//!
//! Collects the stripe count and storage layout, then builds a
//! [`Striped<S>`] from a segment supplier.
//!
//! ## Example
//!
//! ```rust
//! use parking_lot::Mutex;
//! use stripekit::builder::{StripeLayout, StripedBuilder};
//!
//! // Eager: every segment exists up front.
//! let eager = StripedBuilder::new(64).build(|| Mutex::new(0u64));
//! assert_eq!(eager.live_segments(), 64);
//!
//! // Lazy with a custom sparse cutoff.
//! let lazy = StripedBuilder::new(1 << 20)
//!     .lazy()
//!     .sparse_cutoff(4096)
//!     .build(|| Mutex::new(0u64));
//! assert_eq!(lazy.layout(), StripeLayout::LazySparse);
//! assert_eq!(lazy.live_segments(), 0);
//! ```

use crate::error::ConfigError;
use crate::sync::Striped;

/// Requested stripe count at or above which lazy sets use sparse storage.
pub const DEFAULT_SPARSE_CUTOFF: usize = 1024;

/// How a striped set stores its segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeLayout {
    /// All segments built at construction.
    Eager,
    /// Built on demand, one weak slot per stripe.
    LazyDense,
    /// Built on demand, weak slots in a sharded map keyed by stripe index.
    LazySparse,
}

/// Builder for [`Striped`] sets.
#[derive(Debug, Clone)]
pub struct StripedBuilder {
    stripes: usize,
    lazy: bool,
    sparse_cutoff: usize,
}

impl StripedBuilder {
    /// Starts a builder for `stripes` stripes (rounded up to a power of two).
    pub fn new(stripes: usize) -> Self {
        Self {
            stripes,
            lazy: false,
            sparse_cutoff: DEFAULT_SPARSE_CUTOFF,
        }
    }

    /// Build segments on first use and hold them weakly.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Sets the lazy sparse cutoff. Ignored for eager sets.
    pub fn sparse_cutoff(mut self, cutoff: usize) -> Self {
        self.sparse_cutoff = cutoff;
        self
    }

    /// The layout [`build`](Self::build) will produce.
    pub fn layout(&self) -> StripeLayout {
        match self.lazy {
            false => StripeLayout::Eager,
            true if self.stripes < self.sparse_cutoff => StripeLayout::LazyDense,
            true => StripeLayout::LazySparse,
        }
    }

    /// Builds the set.
    ///
    /// # Panics
    ///
    /// Panics on an invalid stripe count; see [`try_build`](Self::try_build).
    pub fn build<S, F>(self, supplier: F) -> Striped<S>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        match self.try_build(supplier) {
            Ok(striped) => striped,
            Err(err) => panic!("{err}"),
        }
    }

    /// Builds the set, rejecting zero stripes and eager counts above `2^30`.
    pub fn try_build<S, F>(self, supplier: F) -> Result<Striped<S>, ConfigError>
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        if self.lazy {
            Striped::try_lazy_with_cutoff(self.stripes, self.sparse_cutoff, supplier)
        } else {
            Striped::try_eager(self.stripes, supplier)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;

    #[test]
    fn defaults_to_eager() {
        let builder = StripedBuilder::new(8);
        assert_eq!(builder.layout(), StripeLayout::Eager);
        let striped = builder.build(|| RwLock::new(()));
        assert!(!striped.is_lazy());
        assert_eq!(striped.layout(), StripeLayout::Eager);
    }

    #[test]
    fn lazy_layout_follows_cutoff() {
        assert_eq!(StripedBuilder::new(1000).lazy().layout(), StripeLayout::LazyDense);
        assert_eq!(StripedBuilder::new(1025).lazy().layout(), StripeLayout::LazySparse);
        assert_eq!(
            StripedBuilder::new(16).lazy().sparse_cutoff(16).layout(),
            StripeLayout::LazySparse
        );

        let striped = StripedBuilder::new(16).lazy().sparse_cutoff(16).build(|| ());
        assert_eq!(striped.layout(), StripeLayout::LazySparse);
    }

    #[test]
    fn try_build_reports_zero_stripes() {
        let err = StripedBuilder::new(0).try_build(|| ()).unwrap_err();
        assert!(err.to_string().contains("stripes"));
        assert!(StripedBuilder::new(0).lazy().try_build(|| ()).is_err());
    }
}
