//! Core data types for the repsense repetition-analysis pipeline.
//!
//! This module defines the fundamental data structures shared by every
//! layer of the system: joint identifiers, per-joint keypoints, whole-body
//! pose frames with geometry queries, and the repetition phase vocabulary.
//!
//! # Type Categories
//!
//! - **Pose Types**: [`JointName`], [`Keypoint`], [`PoseFrame`]
//! - **Common Types**: [`Confidence`], [`Timestamp`]
//! - **Phase Types**: [`RepPhase`]

use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry;
use crate::{DEFAULT_CONFIDENCE_THRESHOLD, JOINT_COUNT};

// =============================================================================
// Common Types
// =============================================================================

/// High-precision timestamp attached to every pose frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timestamp {
    /// Seconds since Unix epoch
    pub seconds: i64,
    /// Nanoseconds within the second
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a new timestamp from seconds and nanoseconds.
    #[must_use]
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Creates a timestamp from the current time.
    #[must_use]
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            seconds: now.timestamp(),
            nanos: now.timestamp_subsec_nanos(),
        }
    }

    /// Creates a timestamp from fractional seconds since epoch.
    ///
    /// Useful for driving the pipeline from a recorded frame clock.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        let seconds = secs.floor() as i64;
        let nanos = ((secs - secs.floor()) * 1_000_000_000.0).round() as u32;
        Self { seconds, nanos }
    }

    /// Converts to `DateTime<Utc>`.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    /// Returns the timestamp as total nanoseconds since epoch.
    #[must_use]
    pub fn as_nanos(&self) -> i128 {
        i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos)
    }

    /// Returns the duration between two timestamps in seconds.
    ///
    /// Negative when `earlier` is in fact later than `self`.
    #[must_use]
    pub fn duration_since(&self, earlier: &Self) -> f64 {
        let diff_nanos = self.as_nanos() - earlier.as_nanos();
        diff_nanos as f64 / 1_000_000_000.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

/// Confidence score in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Confidence(f32);

impl Confidence {
    /// Creates a new confidence value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range [0.0, 1.0].
    pub fn new(value: f32) -> Result<Self, CoreError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(CoreError::InvalidConfidence { value });
        }
        Ok(Self(value))
    }

    /// Creates a confidence value, clamping out-of-range input into [0.0, 1.0].
    ///
    /// Intended for adapters ingesting upstream detector output that may
    /// carry small float excursions past the bounds.
    #[must_use]
    pub fn clamped(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the raw confidence value.
    #[must_use]
    pub fn value(&self) -> f32 {
        self.0
    }

    /// Returns `true` if the confidence meets the default validity threshold.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.0 >= DEFAULT_CONFIDENCE_THRESHOLD
    }

    /// Returns `true` if the confidence meets the given threshold.
    #[must_use]
    pub fn exceeds(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }

    /// Maximum confidence (1.0).
    pub const MAX: Self = Self(1.0);

    /// Minimum confidence (0.0).
    pub const MIN: Self = Self(0.0);
}

impl Default for Confidence {
    fn default() -> Self {
        Self(0.0)
    }
}

// =============================================================================
// Pose Types
// =============================================================================

/// Anatomical landmarks reported by the upstream pose detector.
///
/// Joints tagged as *core* (shoulders, hips, knees) must be present with
/// reliable confidence for a frame to count as valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[repr(u8)]
pub enum JointName {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Neck (base of the cervical spine)
    Neck = 5,
    /// Left shoulder
    LeftShoulder = 6,
    /// Right shoulder
    RightShoulder = 7,
    /// Left elbow
    LeftElbow = 8,
    /// Right elbow
    RightElbow = 9,
    /// Left wrist
    LeftWrist = 10,
    /// Right wrist
    RightWrist = 11,
    /// Pelvis (root of the skeleton)
    Pelvis = 12,
    /// Left hip
    LeftHip = 13,
    /// Right hip
    RightHip = 14,
    /// Left knee
    LeftKnee = 15,
    /// Right knee
    RightKnee = 16,
    /// Left ankle
    LeftAnkle = 17,
    /// Right ankle
    RightAnkle = 18,
}

impl JointName {
    /// Returns all joints in index order.
    #[must_use]
    pub fn all() -> &'static [Self; JOINT_COUNT] {
        &[
            Self::Nose,
            Self::LeftEye,
            Self::RightEye,
            Self::LeftEar,
            Self::RightEar,
            Self::Neck,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::Pelvis,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Returns the joint name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::Neck => "neck",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::Pelvis => "pelvis",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }

    /// Returns `true` if this joint is required for pose validity.
    #[must_use]
    pub fn is_core(&self) -> bool {
        matches!(
            self,
            Self::LeftShoulder
                | Self::RightShoulder
                | Self::LeftHip
                | Self::RightHip
                | Self::LeftKnee
                | Self::RightKnee
        )
    }

    /// Returns `true` if this is an upper body joint.
    #[must_use]
    pub fn is_upper_body(&self) -> bool {
        matches!(
            self,
            Self::Neck
                | Self::LeftShoulder
                | Self::RightShoulder
                | Self::LeftElbow
                | Self::RightElbow
                | Self::LeftWrist
                | Self::RightWrist
        )
    }

    /// Returns `true` if this is a lower body joint.
    #[must_use]
    pub fn is_lower_body(&self) -> bool {
        matches!(
            self,
            Self::Pelvis
                | Self::LeftHip
                | Self::RightHip
                | Self::LeftKnee
                | Self::RightKnee
                | Self::LeftAnkle
                | Self::RightAnkle
        )
    }
}

impl TryFrom<u8> for JointName {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Nose),
            1 => Ok(Self::LeftEye),
            2 => Ok(Self::RightEye),
            3 => Ok(Self::LeftEar),
            4 => Ok(Self::RightEar),
            5 => Ok(Self::Neck),
            6 => Ok(Self::LeftShoulder),
            7 => Ok(Self::RightShoulder),
            8 => Ok(Self::LeftElbow),
            9 => Ok(Self::RightElbow),
            10 => Ok(Self::LeftWrist),
            11 => Ok(Self::RightWrist),
            12 => Ok(Self::Pelvis),
            13 => Ok(Self::LeftHip),
            14 => Ok(Self::RightHip),
            15 => Ok(Self::LeftKnee),
            16 => Ok(Self::RightKnee),
            17 => Ok(Self::LeftAnkle),
            18 => Ok(Self::RightAnkle),
            _ => Err(CoreError::InvalidJointIndex { index: value }),
        }
    }
}

impl std::fmt::Display for JointName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single detected joint with position and confidence.
///
/// Coordinates are in the detector's normalized 0..1 image frame; they are
/// not calibrated to real-world units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    /// The joint this keypoint describes
    pub joint: JointName,
    /// X coordinate (normalized 0.0-1.0)
    pub x: f32,
    /// Y coordinate (normalized 0.0-1.0)
    pub y: f32,
    /// Detection confidence
    pub confidence: Confidence,
}

impl Keypoint {
    /// Creates a new keypoint.
    #[must_use]
    pub fn new(joint: JointName, x: f32, y: f32, confidence: Confidence) -> Self {
        Self {
            joint,
            x,
            y,
            confidence,
        }
    }

    /// Returns `true` if this keypoint meets the default validity threshold.
    #[must_use]
    pub fn is_reliable(&self) -> bool {
        self.confidence.is_reliable()
    }

    /// Returns the position as a tuple.
    #[must_use]
    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }

    /// Calculates the Euclidean distance to another keypoint.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.hypot(dy)
    }
}

/// One tick of detected pose data: a sparse joint map plus a timestamp.
///
/// A frame is *valid* only when every core joint is present with
/// confidence at or above [`DEFAULT_CONFIDENCE_THRESHOLD`]. Geometry
/// queries return `None` when a required joint is absent; they never
/// panic and never substitute defaults.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoseFrame {
    /// Detected keypoints, indexed by joint; `None` = not detected
    pub keypoints: [Option<Keypoint>; JOINT_COUNT],
    /// Capture time of this frame
    pub timestamp: Timestamp,
}

impl PoseFrame {
    /// Creates a new empty frame at the given time.
    #[must_use]
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            keypoints: [None; JOINT_COUNT],
            timestamp,
        }
    }

    /// Sets a keypoint, replacing any existing entry for the same joint.
    pub fn set_keypoint(&mut self, keypoint: Keypoint) {
        self.keypoints[keypoint.joint as usize] = Some(keypoint);
    }

    /// Gets a keypoint by joint.
    #[must_use]
    pub fn keypoint(&self, joint: JointName) -> Option<&Keypoint> {
        self.keypoints[joint as usize].as_ref()
    }

    /// Returns the number of detected joints.
    #[must_use]
    pub fn detected_count(&self) -> usize {
        self.keypoints.iter().filter(|kp| kp.is_some()).count()
    }

    /// Returns `true` if every core joint is present with reliable confidence.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        JointName::all()
            .iter()
            .filter(|joint| joint.is_core())
            .all(|joint| self.keypoint(*joint).is_some_and(Keypoint::is_reliable))
    }

    /// Computes the angle in degrees at `vertex` between the rays toward
    /// `from` and `to`.
    ///
    /// The result is direction-agnostic and normalized into [0, 180].
    /// Returns `None` if any of the three joints is absent.
    #[must_use]
    pub fn angle_at(&self, vertex: JointName, from: JointName, to: JointName) -> Option<f32> {
        let v = self.keypoint(vertex)?;
        let a = self.keypoint(from)?;
        let b = self.keypoint(to)?;
        Some(geometry::angle_between_rays(
            v.position(),
            a.position(),
            b.position(),
        ))
    }

    /// Computes the Euclidean distance between two joints.
    ///
    /// Returns `None` if either joint is absent.
    #[must_use]
    pub fn distance_between(&self, a: JointName, b: JointName) -> Option<f32> {
        let ka = self.keypoint(a)?;
        let kb = self.keypoint(b)?;
        Some(ka.distance_to(kb))
    }

    /// Computes the midpoint between two joints.
    ///
    /// Returns `None` if either joint is absent.
    #[must_use]
    pub fn midpoint(&self, a: JointName, b: JointName) -> Option<(f32, f32)> {
        let ka = self.keypoint(a)?;
        let kb = self.keypoint(b)?;
        Some(geometry::midpoint(ka.position(), kb.position()))
    }

    /// Returns the vertical extent (max y − min y) of all reliable joints.
    ///
    /// Used to estimate how much of the image frame the person occupies,
    /// which seeds pixel-to-meters calibration. `None` when fewer than two
    /// reliable joints are detected.
    #[must_use]
    pub fn vertical_extent(&self) -> Option<f32> {
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        let mut count = 0usize;

        for kp in self.keypoints.iter().flatten() {
            if kp.is_reliable() {
                min_y = min_y.min(kp.y);
                max_y = max_y.max(kp.y);
                count += 1;
            }
        }

        if count < 2 {
            return None;
        }
        Some(max_y - min_y)
    }
}

// =============================================================================
// Phase Types
// =============================================================================

/// Repetition phase of the tracked movement.
///
/// Created as [`RepPhase::Idle`] at configuration time; transitions are
/// driven only by smoothed-angle zone membership and motion direction, and
/// the phase resets to `Idle` whenever the exercise or set changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RepPhase {
    /// No repetition in progress
    Idle,
    /// Lowering toward the bottom of the movement (eccentric)
    Descending,
    /// Holding the bottom position
    AtBottom,
    /// Lifting toward the top of the movement (concentric)
    Ascending,
    /// Holding the top position
    AtTop,
}

impl RepPhase {
    /// Returns the phase name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Descending => "descending",
            Self::AtBottom => "at_bottom",
            Self::Ascending => "ascending",
            Self::AtTop => "at_top",
        }
    }

    /// Returns `true` during the lifting (concentric) portion of a rep.
    #[must_use]
    pub fn is_concentric(&self) -> bool {
        matches!(self, Self::Ascending)
    }

    /// Returns `true` during the lowering (eccentric) portion of a rep.
    #[must_use]
    pub fn is_eccentric(&self) -> bool {
        matches!(self, Self::Descending)
    }
}

impl Default for RepPhase {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for RepPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn keypoint(joint: JointName, x: f32, y: f32, confidence: f32) -> Keypoint {
        Keypoint::new(joint, x, y, Confidence::new(confidence).unwrap())
    }

    fn frame_with_core_joints(confidence: f32) -> PoseFrame {
        let mut frame = PoseFrame::new(Timestamp::new(0, 0));
        for (i, joint) in JointName::all()
            .iter()
            .filter(|j| j.is_core())
            .enumerate()
        {
            frame.set_keypoint(keypoint(*joint, 0.4 + 0.02 * i as f32, 0.5, confidence));
        }
        frame
    }

    #[test]
    fn test_confidence_rejects_out_of_range() {
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(1.0).is_ok());
    }

    #[test]
    fn test_confidence_clamped() {
        assert_abs_diff_eq!(Confidence::clamped(1.7).value(), 1.0);
        assert_abs_diff_eq!(Confidence::clamped(-0.3).value(), 0.0);
        assert_abs_diff_eq!(Confidence::clamped(0.42).value(), 0.42);
    }

    #[test]
    fn test_confidence_threshold() {
        assert!(Confidence::new(0.3).unwrap().is_reliable());
        assert!(!Confidence::new(0.29).unwrap().is_reliable());
        assert!(Confidence::MAX.exceeds(0.99));
    }

    #[test]
    fn test_timestamp_duration_since() {
        let t0 = Timestamp::new(10, 0);
        let t1 = Timestamp::new(10, 500_000_000);
        assert_abs_diff_eq!(t1.duration_since(&t0), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(t0.duration_since(&t1), -0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_timestamp_from_secs_f64() {
        let t = Timestamp::from_secs_f64(12.25);
        assert_eq!(t.seconds, 12);
        assert_eq!(t.nanos, 250_000_000);
    }

    #[test]
    fn test_joint_roundtrip_through_index() {
        for joint in JointName::all() {
            let index = *joint as u8;
            assert_eq!(JointName::try_from(index).unwrap(), *joint);
        }
        assert!(JointName::try_from(19).is_err());
    }

    #[test]
    fn test_core_joints() {
        let core: Vec<_> = JointName::all().iter().filter(|j| j.is_core()).collect();
        assert_eq!(core.len(), 6);
        assert!(JointName::LeftKnee.is_core());
        assert!(!JointName::Nose.is_core());
    }

    #[test]
    fn test_frame_validity_requires_core_joints() {
        let frame = frame_with_core_joints(0.9);
        assert!(frame.is_valid());

        let low = frame_with_core_joints(0.2);
        assert!(!low.is_valid());

        let mut missing = frame_with_core_joints(0.9);
        missing.keypoints[JointName::LeftKnee as usize] = None;
        assert!(!missing.is_valid());
    }

    #[test]
    fn test_angle_at_right_angle() {
        let mut frame = PoseFrame::new(Timestamp::new(0, 0));
        frame.set_keypoint(keypoint(JointName::LeftKnee, 0.5, 0.5, 0.9));
        frame.set_keypoint(keypoint(JointName::LeftHip, 0.5, 0.3, 0.9));
        frame.set_keypoint(keypoint(JointName::LeftAnkle, 0.7, 0.5, 0.9));

        let angle = frame
            .angle_at(JointName::LeftKnee, JointName::LeftHip, JointName::LeftAnkle)
            .unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_angle_at_missing_joint_is_none() {
        let mut frame = PoseFrame::new(Timestamp::new(0, 0));
        frame.set_keypoint(keypoint(JointName::LeftKnee, 0.5, 0.5, 0.9));
        frame.set_keypoint(keypoint(JointName::LeftHip, 0.5, 0.3, 0.9));

        assert!(frame
            .angle_at(JointName::LeftKnee, JointName::LeftHip, JointName::LeftAnkle)
            .is_none());
    }

    #[test]
    fn test_distance_and_midpoint() {
        let mut frame = PoseFrame::new(Timestamp::new(0, 0));
        frame.set_keypoint(keypoint(JointName::LeftShoulder, 0.3, 0.2, 0.9));
        frame.set_keypoint(keypoint(JointName::RightShoulder, 0.6, 0.6, 0.9));

        let distance = frame
            .distance_between(JointName::LeftShoulder, JointName::RightShoulder)
            .unwrap();
        assert_abs_diff_eq!(distance, 0.5, epsilon = 1e-6);

        let (mx, my) = frame
            .midpoint(JointName::LeftShoulder, JointName::RightShoulder)
            .unwrap();
        assert_abs_diff_eq!(mx, 0.45, epsilon = 1e-6);
        assert_abs_diff_eq!(my, 0.4, epsilon = 1e-6);

        assert!(frame
            .distance_between(JointName::LeftShoulder, JointName::Nose)
            .is_none());
    }

    #[test]
    fn test_vertical_extent() {
        let mut frame = PoseFrame::new(Timestamp::new(0, 0));
        frame.set_keypoint(keypoint(JointName::Nose, 0.5, 0.1, 0.9));
        frame.set_keypoint(keypoint(JointName::LeftAnkle, 0.5, 0.8, 0.9));
        frame.set_keypoint(keypoint(JointName::LeftWrist, 0.5, 0.4, 0.1));

        // Low-confidence wrist is excluded from the extent.
        assert_abs_diff_eq!(frame.vertical_extent().unwrap(), 0.7, epsilon = 1e-6);

        let mut sparse = PoseFrame::new(Timestamp::new(0, 0));
        sparse.set_keypoint(keypoint(JointName::Nose, 0.5, 0.1, 0.9));
        assert!(sparse.vertical_extent().is_none());
    }

    #[test]
    fn test_rep_phase_names() {
        assert_eq!(RepPhase::Idle.name(), "idle");
        assert_eq!(RepPhase::AtBottom.name(), "at_bottom");
        assert_eq!(RepPhase::default(), RepPhase::Idle);
        assert!(RepPhase::Ascending.is_concentric());
        assert!(RepPhase::Descending.is_eccentric());
        assert!(!RepPhase::AtTop.is_concentric());
    }
}
