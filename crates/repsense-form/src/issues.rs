//! Form-issue detection.
//!
//! Each exercise profile carries a small set of issue checks. A check is
//! boolean per frame: its detector either fires or it does not, and a
//! firing check contributes one [`FormIssue`] plus a fixed score penalty
//! determined by severity. Detectors are a closed enum with an explicit
//! evaluator so profiles stay plain data.

use serde::{Deserialize, Serialize};

use repsense_core::{JointName, PoseFrame};

use crate::profile::TrackedAngle;

/// Severity of a detected form issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Cosmetic deviation, small penalty
    Minor,
    /// Meaningful technique fault
    Moderate,
    /// Injury-relevant fault, large penalty
    Major,
}

impl Severity {
    /// Score penalty applied when an issue of this severity fires.
    #[must_use]
    pub fn penalty(&self) -> f32 {
        match self {
            Self::Minor => 5.0,
            Self::Moderate => 15.0,
            Self::Major => 25.0,
        }
    }

    /// Returns the severity name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Major => "major",
        }
    }
}

/// A form issue detected on a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormIssue {
    /// Stable identifier of the issue within its exercise
    pub name: String,
    /// How strongly this issue penalizes the form score
    pub severity: Severity,
    /// The joint the issue is about
    pub affected_joint: JointName,
    /// Human-readable coaching message
    pub message: String,
}

/// Detector kinds available to issue checks.
///
/// Missing joints make a detector evaluate to `false`: no data is never
/// treated as a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueDetector {
    /// Fires when the angle falls below a threshold
    AngleBelow {
        /// The angle being watched
        angle: TrackedAngle,
        /// Firing threshold in degrees
        threshold_degrees: f32,
    },
    /// Fires when the angle rises above a threshold
    AngleAbove {
        /// The angle being watched
        angle: TrackedAngle,
        /// Firing threshold in degrees
        threshold_degrees: f32,
    },
    /// Fires when a joint drifts horizontally away from a reference joint
    LateralOffset {
        /// The drifting joint
        joint: JointName,
        /// The joint it should stay stacked over
        reference: JointName,
        /// Maximum tolerated horizontal offset (normalized units)
        max_offset: f32,
    },
    /// Fires when one joint pair is narrower than another pair, scaled
    /// by a ratio (knees caving inside the ankles, for one)
    PairWidthBelow {
        /// The pair expected to stay wide
        upper: [JointName; 2],
        /// The reference pair
        lower: [JointName; 2],
        /// Minimum tolerated width ratio upper/lower
        min_ratio: f32,
    },
}

impl IssueDetector {
    /// Evaluates this detector against a frame.
    #[must_use]
    pub fn evaluate(&self, frame: &PoseFrame) -> bool {
        match self {
            Self::AngleBelow {
                angle,
                threshold_degrees,
            } => angle
                .measure(frame)
                .is_some_and(|a| a < *threshold_degrees),
            Self::AngleAbove {
                angle,
                threshold_degrees,
            } => angle
                .measure(frame)
                .is_some_and(|a| a > *threshold_degrees),
            Self::LateralOffset {
                joint,
                reference,
                max_offset,
            } => {
                let (Some(kp), Some(ref_kp)) = (frame.keypoint(*joint), frame.keypoint(*reference))
                else {
                    return false;
                };
                (kp.x - ref_kp.x).abs() > *max_offset
            }
            Self::PairWidthBelow {
                upper,
                lower,
                min_ratio,
            } => {
                let (Some(upper_width), Some(lower_width)) = (
                    frame.distance_between(upper[0], upper[1]),
                    frame.distance_between(lower[0], lower[1]),
                ) else {
                    return false;
                };
                lower_width > 0.0 && upper_width < lower_width * min_ratio
            }
        }
    }
}

/// One issue rule inside an exercise profile.
#[derive(Debug, Clone)]
pub struct IssueCheck {
    /// Stable identifier of the issue
    pub name: &'static str,
    /// Penalty class
    pub severity: Severity,
    /// The joint the issue is about
    pub affected_joint: JointName,
    /// Coaching message shown when the issue fires
    pub message: &'static str,
    /// The detector deciding whether the issue fires on a frame
    pub detector: IssueDetector,
}

impl IssueCheck {
    /// Builds the owned [`FormIssue`] reported when this check fires.
    #[must_use]
    pub fn issue(&self) -> FormIssue {
        FormIssue {
            name: self.name.to_string(),
            severity: self.severity,
            affected_joint: self.affected_joint,
            message: self.message.to_string(),
        }
    }
}
