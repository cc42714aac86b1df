//! Domain validation errors.
//!
//! Returned by `try_new`/`parse` constructors when an input violates a
//! domain invariant. These are client errors: never retried.

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A bounds edge was not a finite number or was out of range.
    #[error("invalid bounds: {reason}")]
    InvalidBounds {
        /// Which invariant failed.
        reason: String,
    },

    /// Video resource ids must be positive integers.
    #[error("invalid video id '{input}': must be a positive integer")]
    InvalidVideoId {
        /// The rejected input.
        input: String,
    },
}
