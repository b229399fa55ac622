//! Engine error types.

use thiserror::Error;

/// Common result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Unified error type for session engine operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// No exercise has been configured yet.
    #[error("engine is not configured with an exercise")]
    NotConfigured,

    /// Exercise lookup or profile error.
    #[error(transparent)]
    Form(#[from] repsense_form::FormError),

    /// Calibration construction error.
    #[error(transparent)]
    Calibration(#[from] repsense_vbt::CalibrationError),

    /// An event sink rejected an event.
    #[error("event sink '{name}' failed: {message}")]
    SinkFailure {
        /// Name of the failing sink
        name: String,
        /// What the sink reported
        message: String,
    },
}

impl EngineError {
    /// Creates a sink failure error.
    pub fn sink_failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkFailure {
            name: name.into(),
            message: message.into(),
        }
    }
}
