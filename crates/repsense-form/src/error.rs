//! Error types for form profile lookup and analysis.

use thiserror::Error;

/// A specialized `Result` type for form operations.
pub type FormResult<T> = Result<T, FormError>;

/// Error type for the form layer.
///
/// Frame analysis itself never fails; degraded input produces a neutral
/// result. The only failure surfaced here is asking for an exercise the
/// profile registry does not know, which callers must see at
/// configuration time rather than as silently wrong scores later.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FormError {
    /// Exercise identifier with no registered profile
    #[error("Unsupported exercise: '{name}'")]
    UnsupportedExercise {
        /// The unrecognized identifier
        name: String,
    },
}

impl FormError {
    /// Creates a new unsupported-exercise error.
    #[must_use]
    pub fn unsupported(name: impl Into<String>) -> Self {
        Self::UnsupportedExercise { name: name.into() }
    }
}
