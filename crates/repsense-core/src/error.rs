//! Error types for the repsense core layer.
//!
//! This module provides error handling using [`thiserror`] for automatic
//! `Display` and `Error` trait implementations.
//!
//! The frame-processing path itself is infallible: degraded input (missing
//! joints, low confidence) resolves to neutral results, not errors. The
//! errors here cover construction misuse only.
//!
//! # Example
//!
//! ```rust
//! use repsense_core::{Confidence, CoreError};
//!
//! let err = Confidence::new(1.5).unwrap_err();
//! assert!(matches!(err, CoreError::InvalidConfidence { .. }));
//! ```

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Error type for the repsense core layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Confidence value outside the valid range
    #[error("Confidence must be in [0.0, 1.0], got {value}")]
    InvalidConfidence {
        /// The out-of-range value
        value: f32,
    },

    /// Numeric joint index with no corresponding joint
    #[error("Invalid joint index: {index}")]
    InvalidJointIndex {
        /// The unmapped index
        index: u8,
    },
}
