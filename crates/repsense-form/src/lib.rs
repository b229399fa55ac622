//! Form Analysis Library
//!
//! This crate scores exercise form from 2D pose frames. It carries the
//! per-exercise knowledge of the pipeline: which joint angle defines a
//! repetition, which angle ranges constitute good form, and which
//! geometric patterns are faults worth reporting.
//!
//! # Features
//!
//! - **Exercise Profiles**: Built-in tracking and scoring rules for nine lifts
//! - **Ideal-Angle Scoring**: Weighted, capped penalties for angle deviations
//! - **Issue Detection**: Named faults with severities and affected joints
//! - **Bar-Path Tracking**: Rolling lateral-drift deviation over recent frames
//!
//! # Example
//!
//! ```rust
//! use repsense_core::{PoseFrame, Timestamp};
//! use repsense_form::{ExerciseFormProfile, ExerciseKind, FormAnalyzer, FormAnalyzerConfig};
//!
//! let profile = ExerciseFormProfile::for_exercise(ExerciseKind::BackSquat);
//! let mut analyzer = FormAnalyzer::new(FormAnalyzerConfig::default());
//! analyzer.set_profile(profile);
//!
//! // Frames without reliable core joints produce the neutral result.
//! let result = analyzer.analyze(&PoseFrame::new(Timestamp::new(0, 0)));
//! assert_eq!(result.score, 0.0);
//! ```

pub mod analyzer;
pub mod error;
pub mod issues;
pub mod profile;

// Re-export main types for convenience
pub use analyzer::{
    FormAnalysisResult, FormAnalyzer, FormAnalyzerConfig, FormAnalyzerConfigBuilder,
};
pub use error::{FormError, FormResult};
pub use issues::{FormIssue, IssueCheck, IssueDetector, Severity};
pub use profile::{
    ExerciseFormProfile, ExerciseKind, IdealAngleCheck, ResistanceProfile, TrackedAngle,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analyzer::{FormAnalysisResult, FormAnalyzer, FormAnalyzerConfig};
    pub use crate::error::{FormError, FormResult};
    pub use crate::issues::{FormIssue, Severity};
    pub use crate::profile::{ExerciseFormProfile, ExerciseKind, ResistanceProfile};
}
