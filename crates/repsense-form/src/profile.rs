//! Exercise form profiles.
//!
//! A profile is effectively immutable reference data describing how one
//! exercise is interpreted: which joint angle tracks rep progress, what
//! the top and bottom of the movement look like in degrees, the weighted
//! ideal-angle checks and issue checks applied every frame, and which
//! joints carry the bar path and the velocity measurement.
//!
//! "Top" is whatever position ends a rep. For a squat that is the larger
//! knee angle (lockout); for a row or pull-up it is the smaller elbow
//! angle (full contraction). Direction is always derived by comparing
//! the two configured angles, never assumed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use repsense_core::{JointName, PoseFrame};

use crate::error::FormError;
use crate::issues::{IssueCheck, IssueDetector, Severity};

/// The nine exercises with registered profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    /// Barbell back squat
    BackSquat,
    /// Barbell bench press
    BenchPress,
    /// Standing overhead press
    OverheadPress,
    /// Bent-over row
    Row,
    /// Romanian deadlift
    RomanianDeadlift,
    /// Conventional deadlift
    Deadlift,
    /// Pull-up
    PullUp,
    /// Cable lat pulldown
    LatPulldown,
    /// Barbell hip thrust
    HipThrust,
}

impl ExerciseKind {
    /// Returns all supported exercises.
    #[must_use]
    pub fn all() -> &'static [Self; 9] {
        &[
            Self::BackSquat,
            Self::BenchPress,
            Self::OverheadPress,
            Self::Row,
            Self::RomanianDeadlift,
            Self::Deadlift,
            Self::PullUp,
            Self::LatPulldown,
            Self::HipThrust,
        ]
    }

    /// Returns the exercise identifier as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::BackSquat => "back_squat",
            Self::BenchPress => "bench_press",
            Self::OverheadPress => "overhead_press",
            Self::Row => "row",
            Self::RomanianDeadlift => "romanian_deadlift",
            Self::Deadlift => "deadlift",
            Self::PullUp => "pull_up",
            Self::LatPulldown => "lat_pulldown",
            Self::HipThrust => "hip_thrust",
        }
    }

    /// Looks up an exercise by identifier.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.name() == name)
    }
}

impl FromStr for ExerciseKind {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| FormError::unsupported(s))
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How machine resistance changes over the range of motion.
///
/// Velocity readings are multiplied by the modifier so cam-profiled
/// machines stay comparable to free-weight standards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResistanceProfile {
    /// Constant load (barbells, dumbbells, bodyweight)
    FreeWeight,
    /// Machines that load up near lockout
    HeavierAtLockout,
    /// Machines that unload near lockout
    LighterAtLockout,
}

impl ResistanceProfile {
    /// Velocity normalization modifier for this resistance curve.
    #[must_use]
    pub fn velocity_modifier(&self) -> f32 {
        match self {
            Self::FreeWeight => 1.0,
            Self::HeavierAtLockout => 0.90,
            Self::LighterAtLockout => 1.10,
        }
    }
}

/// A joint angle expressed as a vertex plus two ray endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackedAngle {
    /// The joint at which the angle is measured
    pub vertex: JointName,
    /// First ray endpoint
    pub from: JointName,
    /// Second ray endpoint
    pub to: JointName,
}

impl TrackedAngle {
    /// Creates a new angle triple.
    #[must_use]
    pub fn new(vertex: JointName, from: JointName, to: JointName) -> Self {
        Self { vertex, from, to }
    }

    /// Measures this angle on a frame, in degrees.
    ///
    /// `None` when any of the three joints is absent.
    #[must_use]
    pub fn measure(&self, frame: &PoseFrame) -> Option<f32> {
        frame.angle_at(self.vertex, self.from, self.to)
    }
}

/// One weighted ideal-angle-range rule inside a profile.
#[derive(Debug, Clone)]
pub struct IdealAngleCheck {
    /// Stable identifier of the check
    pub name: &'static str,
    /// The angle being checked
    pub angle: TrackedAngle,
    /// Lower bound of the ideal range, inclusive
    pub ideal_min: f32,
    /// Upper bound of the ideal range, inclusive
    pub ideal_max: f32,
    /// Relative weight of this check in the score
    pub weight: f32,
}

/// Per-exercise interpretation rules.
///
/// Profiles are obtained from [`ExerciseFormProfile::for_exercise`] and
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ExerciseFormProfile {
    /// The exercise this profile describes
    pub exercise: ExerciseKind,
    /// The angle that defines rep-phase progress
    pub tracking_angle: TrackedAngle,
    /// Tracking angle at the top of the movement, in degrees
    pub top_angle_degrees: f32,
    /// Tracking angle at the bottom of the movement, in degrees
    pub bottom_angle_degrees: f32,
    /// Weighted ideal-angle checks applied every frame
    pub ideal_checks: Vec<IdealAngleCheck>,
    /// Boolean issue checks applied every frame
    pub issue_checks: Vec<IssueCheck>,
    /// Joint tracked for bar-path deviation, if the exercise has one
    pub bar_path_joint: Option<JointName>,
    /// Joint tracked for movement velocity
    pub velocity_joint: JointName,
    /// Resistance curve of the implement
    pub resistance: ResistanceProfile,
}

impl ExerciseFormProfile {
    /// Returns `true` when the top of the movement is the larger angle.
    ///
    /// Computed once at configuration time and carried forward from
    /// there; comparison sites never re-derive it.
    #[must_use]
    pub fn is_top_high_angle(&self) -> bool {
        self.top_angle_degrees > self.bottom_angle_degrees
    }

    /// Builds the profile for an exercise.
    ///
    /// Joint choices assume the single side-on camera the upstream
    /// detector is calibrated for, so the left-side joints are primary.
    #[must_use]
    pub fn for_exercise(exercise: ExerciseKind) -> Self {
        let knee = TrackedAngle::new(JointName::LeftKnee, JointName::LeftHip, JointName::LeftAnkle);
        let hip = TrackedAngle::new(
            JointName::LeftHip,
            JointName::LeftShoulder,
            JointName::LeftKnee,
        );
        let elbow = TrackedAngle::new(
            JointName::LeftElbow,
            JointName::LeftShoulder,
            JointName::LeftWrist,
        );
        let shoulder = TrackedAngle::new(
            JointName::LeftShoulder,
            JointName::LeftElbow,
            JointName::LeftHip,
        );
        let spine = TrackedAngle::new(JointName::Neck, JointName::Nose, JointName::Pelvis);

        match exercise {
            ExerciseKind::BackSquat => Self {
                exercise,
                tracking_angle: knee,
                top_angle_degrees: 170.0,
                bottom_angle_degrees: 70.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "knee_tracking",
                        angle: knee,
                        ideal_min: 65.0,
                        ideal_max: 175.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "hip_hinge",
                        angle: hip,
                        ideal_min: 55.0,
                        ideal_max: 175.0,
                        weight: 0.8,
                    },
                    IdealAngleCheck {
                        name: "neutral_spine",
                        angle: spine,
                        ideal_min: 140.0,
                        ideal_max: 180.0,
                        weight: 0.6,
                    },
                ],
                issue_checks: vec![
                    IssueCheck {
                        name: "knee_valgus",
                        severity: Severity::Major,
                        affected_joint: JointName::LeftKnee,
                        message: "Knees caving inward",
                        detector: IssueDetector::PairWidthBelow {
                            upper: [JointName::LeftKnee, JointName::RightKnee],
                            lower: [JointName::LeftAnkle, JointName::RightAnkle],
                            min_ratio: 0.7,
                        },
                    },
                    IssueCheck {
                        name: "excessive_lean",
                        severity: Severity::Moderate,
                        affected_joint: JointName::LeftHip,
                        message: "Torso collapsing forward",
                        detector: IssueDetector::AngleBelow {
                            angle: hip,
                            threshold_degrees: 40.0,
                        },
                    },
                ],
                bar_path_joint: Some(JointName::Neck),
                velocity_joint: JointName::LeftHip,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::BenchPress => Self {
                exercise,
                tracking_angle: elbow,
                top_angle_degrees: 160.0,
                bottom_angle_degrees: 75.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "elbow_extension",
                        angle: elbow,
                        ideal_min: 70.0,
                        ideal_max: 170.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "shoulder_tuck",
                        angle: shoulder,
                        ideal_min: 20.0,
                        ideal_max: 80.0,
                        weight: 0.7,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "wrist_stack",
                    severity: Severity::Moderate,
                    affected_joint: JointName::LeftWrist,
                    message: "Wrist drifting off the elbow line",
                    detector: IssueDetector::LateralOffset {
                        joint: JointName::LeftWrist,
                        reference: JointName::LeftElbow,
                        max_offset: 0.08,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::OverheadPress => Self {
                exercise,
                tracking_angle: elbow,
                top_angle_degrees: 170.0,
                bottom_angle_degrees: 80.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "lockout_reach",
                        angle: elbow,
                        ideal_min: 75.0,
                        ideal_max: 178.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "standing_tall",
                        angle: hip,
                        ideal_min: 150.0,
                        ideal_max: 180.0,
                        weight: 0.6,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "lean_back",
                    severity: Severity::Moderate,
                    affected_joint: JointName::LeftHip,
                    message: "Leaning back through the press",
                    detector: IssueDetector::AngleBelow {
                        angle: hip,
                        threshold_degrees: 145.0,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::Row => Self {
                exercise,
                tracking_angle: elbow,
                // Contraction ends the rep: top is the smaller angle.
                top_angle_degrees: 60.0,
                bottom_angle_degrees: 160.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "elbow_drive",
                        angle: elbow,
                        ideal_min: 50.0,
                        ideal_max: 165.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "hinge_hold",
                        angle: hip,
                        ideal_min: 70.0,
                        ideal_max: 130.0,
                        weight: 0.8,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "torso_heave",
                    severity: Severity::Moderate,
                    affected_joint: JointName::LeftHip,
                    message: "Heaving the torso to move the load",
                    detector: IssueDetector::AngleAbove {
                        angle: hip,
                        threshold_degrees: 140.0,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::RomanianDeadlift => Self {
                exercise,
                tracking_angle: hip,
                top_angle_degrees: 170.0,
                bottom_angle_degrees: 85.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "hip_hinge_depth",
                        angle: hip,
                        ideal_min: 80.0,
                        ideal_max: 175.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "soft_knee",
                        angle: knee,
                        ideal_min: 140.0,
                        ideal_max: 175.0,
                        weight: 0.7,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "bar_drift",
                    severity: Severity::Major,
                    affected_joint: JointName::LeftWrist,
                    message: "Bar drifting away from the legs",
                    detector: IssueDetector::LateralOffset {
                        joint: JointName::LeftWrist,
                        reference: JointName::LeftKnee,
                        max_offset: 0.1,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::Deadlift => Self {
                exercise,
                tracking_angle: hip,
                top_angle_degrees: 170.0,
                bottom_angle_degrees: 60.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "hip_drive",
                        angle: hip,
                        ideal_min: 55.0,
                        ideal_max: 175.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "lockout_knee",
                        angle: knee,
                        ideal_min: 65.0,
                        ideal_max: 178.0,
                        weight: 0.8,
                    },
                    IdealAngleCheck {
                        name: "neutral_spine",
                        angle: spine,
                        ideal_min: 140.0,
                        ideal_max: 180.0,
                        weight: 0.6,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "bar_drift",
                    severity: Severity::Major,
                    affected_joint: JointName::LeftWrist,
                    message: "Bar drifting away from the shins",
                    detector: IssueDetector::LateralOffset {
                        joint: JointName::LeftWrist,
                        reference: JointName::LeftAnkle,
                        max_offset: 0.1,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::PullUp => Self {
                exercise,
                tracking_angle: elbow,
                // Chin over bar ends the rep: top is the flexed elbow.
                top_angle_degrees: 55.0,
                bottom_angle_degrees: 165.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "full_hang",
                        angle: elbow,
                        ideal_min: 50.0,
                        ideal_max: 170.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "shoulder_engagement",
                        angle: shoulder,
                        ideal_min: 10.0,
                        ideal_max: 170.0,
                        weight: 0.5,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "kipping",
                    severity: Severity::Moderate,
                    affected_joint: JointName::LeftHip,
                    message: "Swinging the hips for momentum",
                    detector: IssueDetector::LateralOffset {
                        joint: JointName::LeftHip,
                        reference: JointName::LeftShoulder,
                        max_offset: 0.07,
                    },
                }],
                bar_path_joint: None,
                velocity_joint: JointName::Neck,
                resistance: ResistanceProfile::FreeWeight,
            },
            ExerciseKind::LatPulldown => Self {
                exercise,
                tracking_angle: elbow,
                top_angle_degrees: 60.0,
                bottom_angle_degrees: 160.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "elbow_path",
                        angle: elbow,
                        ideal_min: 55.0,
                        ideal_max: 165.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "upright_torso",
                        angle: hip,
                        ideal_min: 95.0,
                        ideal_max: 180.0,
                        weight: 0.6,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "lean_back",
                    severity: Severity::Moderate,
                    affected_joint: JointName::LeftHip,
                    message: "Leaning back to pull the stack",
                    detector: IssueDetector::AngleBelow {
                        angle: hip,
                        threshold_degrees: 90.0,
                    },
                }],
                bar_path_joint: Some(JointName::LeftWrist),
                velocity_joint: JointName::LeftWrist,
                resistance: ResistanceProfile::LighterAtLockout,
            },
            ExerciseKind::HipThrust => Self {
                exercise,
                tracking_angle: hip,
                top_angle_degrees: 165.0,
                bottom_angle_degrees: 90.0,
                ideal_checks: vec![
                    IdealAngleCheck {
                        name: "hip_lockout",
                        angle: hip,
                        ideal_min: 85.0,
                        ideal_max: 178.0,
                        weight: 1.0,
                    },
                    IdealAngleCheck {
                        name: "shin_vertical",
                        angle: knee,
                        ideal_min: 75.0,
                        ideal_max: 115.0,
                        weight: 0.5,
                    },
                ],
                issue_checks: vec![IssueCheck {
                    name: "hyperextension",
                    severity: Severity::Minor,
                    affected_joint: JointName::LeftHip,
                    message: "Overextending at the top",
                    detector: IssueDetector::AngleAbove {
                        angle: hip,
                        threshold_degrees: 177.0,
                    },
                }],
                bar_path_joint: Some(JointName::LeftHip),
                velocity_joint: JointName::LeftHip,
                resistance: ResistanceProfile::FreeWeight,
            },
        }
    }
}
