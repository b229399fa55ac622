//! Velocity-based training metrics.
//!
//! Turns the vertical trajectory of a single tracked joint into bar
//! speed, per-rep velocity statistics, and set-level fatigue estimates.
//!
//! # Architecture
//!
//! Velocity flows through four stages:
//!
//! 1. **Calibration** ([`Calibration`]): converts normalized image
//!    displacement to meters using body height and skeleton extent.
//! 2. **Tracking** ([`VelocityTracker`]): differentiates the velocity
//!    joint between frames, guards against dropped-frame gaps, and
//!    smooths the displayed speed over a short moving average.
//! 3. **Rep statistics** ([`RepVelocity`]): readings are routed into
//!    concentric or eccentric accumulators by the movement phase and
//!    folded into mean and peak figures when a rep completes.
//! 4. **Fatigue** ([`FatigueModel`]): compares each rep's concentric
//!    mean against the session baseline, flags auto-stop, and projects
//!    reps to failure from the set's velocity trend.
//!
//! # Example
//!
//! ```
//! use repsense_core::{Confidence, JointName, Keypoint, PhaseListener, RepPhase, Timestamp};
//! use repsense_vbt::{Calibration, FatigueModel, VelocityTracker, VelocityTrackerConfig};
//!
//! let mut tracker = VelocityTracker::new(
//!     VelocityTrackerConfig::default(),
//!     Calibration::default(),
//! );
//! let mut fatigue = FatigueModel::default();
//!
//! // Readings taken while ascending accumulate into the concentric buffer.
//! tracker.phase_changed(RepPhase::Ascending, Timestamp::from_secs_f64(0.0));
//! let hip = Keypoint::new(JointName::LeftHip, 0.5, 0.62, Confidence::clamped(0.9));
//! tracker.process(&hip, Timestamp::from_secs_f64(0.0));
//! let hip = Keypoint::new(JointName::LeftHip, 0.5, 0.60, Confidence::clamped(0.9));
//! tracker.process(&hip, Timestamp::from_secs_f64(1.0 / 30.0));
//!
//! let rep = tracker.complete_rep();
//! fatigue.record_rep(&rep);
//! assert!(fatigue.baseline_mps().is_some());
//! ```

pub mod calibration;
pub mod fatigue;
pub mod velocity;

pub use calibration::{Calibration, CalibrationError};
pub use fatigue::{FatigueConfig, FatigueModel, FatigueStatus};
pub use velocity::{RepVelocity, VelocityReading, VelocityTracker, VelocityTrackerConfig};
