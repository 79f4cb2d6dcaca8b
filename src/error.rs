//! Error types for the stripekit library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned by fallible constructors when parameters are
//!   invalid (zero stripes, zero capacity, zero permits, zero weight).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (`check_invariants` methods).
//! - [`Cancelled`]: Returned by blocking queue operations once the queue has
//!   been cancelled.
//!
//! Every panicking constructor has a `try_*` twin that returns
//! [`ConfigError`] instead.
//!
//! ## Example Usage
//!
//! ```
//! use stripekit::error::ConfigError;
//! use stripekit::ds::BoundedPriorityQueue;
//!
//! let queue: Result<BoundedPriorityQueue<u32>, ConfigError> = BoundedPriorityQueue::try_new(8);
//! assert!(queue.is_ok());
//!
//! let bad = BoundedPriorityQueue::<u32>::try_new(0);
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal invariants are violated.
///
/// Produced by `check_invariants` methods such as
/// [`IntrusiveList::check_invariants`](crate::ds::IntrusiveList::check_invariants).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when construction parameters are invalid.
///
/// # Example
///
/// ```
/// use stripekit::sync::Striped;
///
/// let err = Striped::try_eager(0, || ()).unwrap_err();
/// assert!(err.to_string().contains("stripes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Cancelled
// ---------------------------------------------------------------------------

/// A blocking operation was interrupted because its queue was cancelled.
///
/// Returned by [`AdmissionQueue`](crate::sync::AdmissionQueue) `put`,
/// `offer_timeout`, `take` and `poll_timeout` after
/// [`cancel`](crate::sync::AdmissionQueue::cancel) has been called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
