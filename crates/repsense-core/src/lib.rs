//! # repsense-core
//!
//! Core types, traits, and geometry for the repsense repetition-analysis
//! pipeline.
//!
//! This crate provides the foundational building blocks used throughout
//! the repsense workspace:
//!
//! - **Pose Data Types**: [`PoseFrame`], [`Keypoint`], [`JointName`] for
//!   representing per-frame 2D pose detections, plus [`Confidence`] and
//!   [`Timestamp`].
//!
//! - **Phase Vocabulary**: [`RepPhase`], the five-state repetition phase
//!   shared by the state machine and the velocity tracker.
//!
//! - **Geometry**: the [`geometry`] module with angle/midpoint/statistics
//!   helpers behind the frame's derived queries.
//!
//! - **Traits**: [`Resettable`] and [`PhaseListener`], the seams between
//!   pipeline layers.
//!
//! ## Data flow
//!
//! ```text
//!   PoseFrame stream
//!        |
//!        v
//!   validity gate ──> tracked-angle smoothing ──> phase machine
//!        |                                            |
//!        v                                            v
//!   form scoring                            phase notifications
//!        |                                            |
//!        +────────────> RepEvent <──── velocity/fatigue tracking
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization via serde
//!
//! ## Example
//!
//! ```rust
//! use repsense_core::{Confidence, JointName, Keypoint, PoseFrame, Timestamp};
//!
//! let mut frame = PoseFrame::new(Timestamp::now());
//! frame.set_keypoint(Keypoint::new(
//!     JointName::LeftKnee,
//!     0.5,
//!     0.6,
//!     Confidence::new(0.95).unwrap(),
//! ));
//!
//! assert_eq!(frame.detected_count(), 1);
//! assert!(frame.keypoint(JointName::LeftKnee).unwrap().is_reliable());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod geometry;
pub mod traits;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, CoreResult};
pub use traits::{PhaseListener, Resettable};
pub use types::{Confidence, JointName, Keypoint, PoseFrame, RepPhase, Timestamp};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of joints in the pose skeleton
pub const JOINT_COUNT: usize = 19;

/// Confidence a joint must reach to count toward pose validity
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;

/// Prelude module for convenient imports.
///
/// ```rust
/// use repsense_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::traits::{PhaseListener, Resettable};
    pub use crate::types::{Confidence, JointName, Keypoint, PoseFrame, RepPhase, Timestamp};
}
