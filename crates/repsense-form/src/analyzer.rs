//! Per-frame form analysis.
//!
//! The analyzer is stateless per call apart from one rolling buffer: the
//! bar-path window. Scoring starts every frame at the maximum and
//! subtracts penalties for ideal-angle deviations and detected issues,
//! clamping the result into [0, 100].

use std::collections::HashMap;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use repsense_core::geometry;
use repsense_core::{PoseFrame, Resettable};

use crate::issues::FormIssue;
use crate::profile::ExerciseFormProfile;

/// Maximum (and starting) form score.
pub const MAX_FORM_SCORE: f32 = 100.0;

/// Cap multiplier for one ideal-angle check: penalty never exceeds
/// `weight * IDEAL_PENALTY_CAP_MULTIPLIER`.
pub const IDEAL_PENALTY_CAP_MULTIPLIER: f32 = 30.0;

/// Linear slope of the ideal-angle penalty per degree of deviation.
pub const IDEAL_PENALTY_SLOPE: f32 = 2.0;

/// Frames kept in the bar-path window (about one second at 30 fps).
pub const BAR_PATH_WINDOW: usize = 30;

/// Samples required before a bar-path deviation is reported.
pub const BAR_PATH_MIN_SAMPLES: usize = 5;

/// Maps the window's standard deviation onto the 0..1 deviation score.
///
/// Empirically chosen; kept as a tunable constant rather than re-derived.
pub const BAR_PATH_DEVIATION_SCALE: f32 = 20.0;

/// Configuration for the form analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormAnalyzerConfig {
    /// Per-check penalty ceiling, as a multiple of the check weight
    pub ideal_penalty_cap_multiplier: f32,

    /// Penalty per degree of deviation, scaled by the check weight
    pub ideal_penalty_slope: f32,

    /// Bar-path window capacity in frames
    pub bar_path_window: usize,

    /// Minimum samples before a deviation is reported
    pub bar_path_min_samples: usize,

    /// Standard-deviation-to-score scale factor
    pub bar_path_deviation_scale: f32,
}

impl Default for FormAnalyzerConfig {
    fn default() -> Self {
        Self {
            ideal_penalty_cap_multiplier: IDEAL_PENALTY_CAP_MULTIPLIER,
            ideal_penalty_slope: IDEAL_PENALTY_SLOPE,
            bar_path_window: BAR_PATH_WINDOW,
            bar_path_min_samples: BAR_PATH_MIN_SAMPLES,
            bar_path_deviation_scale: BAR_PATH_DEVIATION_SCALE,
        }
    }
}

impl FormAnalyzerConfig {
    /// Create a new builder
    pub fn builder() -> FormAnalyzerConfigBuilder {
        FormAnalyzerConfigBuilder::new()
    }
}

/// Builder for [`FormAnalyzerConfig`]
#[derive(Debug, Default)]
pub struct FormAnalyzerConfigBuilder {
    config: FormAnalyzerConfig,
}

impl FormAnalyzerConfigBuilder {
    /// Create new builder
    pub fn new() -> Self {
        Self {
            config: FormAnalyzerConfig::default(),
        }
    }

    /// Set the penalty cap multiplier
    pub fn ideal_penalty_cap_multiplier(mut self, multiplier: f32) -> Self {
        self.config.ideal_penalty_cap_multiplier = multiplier;
        self
    }

    /// Set the penalty slope per degree
    pub fn ideal_penalty_slope(mut self, slope: f32) -> Self {
        self.config.ideal_penalty_slope = slope;
        self
    }

    /// Set bar-path window capacity
    pub fn bar_path_window(mut self, frames: usize) -> Self {
        self.config.bar_path_window = frames;
        self
    }

    /// Set minimum bar-path samples
    pub fn bar_path_min_samples(mut self, samples: usize) -> Self {
        self.config.bar_path_min_samples = samples;
        self
    }

    /// Set the deviation scale factor
    pub fn bar_path_deviation_scale(mut self, scale: f32) -> Self {
        self.config.bar_path_deviation_scale = scale;
        self
    }

    /// Build the config
    pub fn build(self) -> FormAnalyzerConfig {
        self.config
    }
}

/// Result of analyzing one frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormAnalysisResult {
    /// Form score in [0, 100]
    pub score: f32,

    /// Issues detected on this frame
    pub issues: Vec<FormIssue>,

    /// Measured angles keyed by check name, in degrees
    pub joint_angles: HashMap<String, f32>,

    /// The tracking angle of this single frame, in degrees
    pub rom_degrees: f32,

    /// Rolling bar-path deviation in 0..1
    pub bar_path_deviation: f32,
}

impl FormAnalysisResult {
    /// The well-defined "no data" result used for invalid frames and
    /// unconfigured analysis. Not an error.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            issues: Vec::new(),
            joint_angles: HashMap::new(),
            rom_degrees: 0.0,
            bar_path_deviation: 0.0,
        }
    }
}

/// Evaluates frames against the active exercise profile.
#[derive(Debug, Default)]
pub struct FormAnalyzer {
    config: FormAnalyzerConfig,
    profile: Option<ExerciseFormProfile>,
    bar_path_window: VecDeque<f32>,
}

impl FormAnalyzer {
    /// Creates a new analyzer with no active profile.
    #[must_use]
    pub fn new(config: FormAnalyzerConfig) -> Self {
        Self {
            config,
            profile: None,
            bar_path_window: VecDeque::new(),
        }
    }

    /// Installs the active profile, clearing the bar-path window.
    pub fn set_profile(&mut self, profile: ExerciseFormProfile) {
        self.profile = Some(profile);
        self.bar_path_window.clear();
    }

    /// Returns the active profile, if configured.
    #[must_use]
    pub fn profile(&self) -> Option<&ExerciseFormProfile> {
        self.profile.as_ref()
    }

    /// Analyzes one frame against the active profile.
    ///
    /// Invalid frames and unconfigured analyzers produce the neutral
    /// result; scoring is otherwise total and the returned score is
    /// always inside [0, 100].
    pub fn analyze(&mut self, frame: &PoseFrame) -> FormAnalysisResult {
        let Some(profile) = &self.profile else {
            return FormAnalysisResult::neutral();
        };
        if !frame.is_valid() {
            return FormAnalysisResult::neutral();
        }

        let mut score = MAX_FORM_SCORE;
        let mut issues = Vec::new();
        let mut joint_angles = HashMap::new();

        for check in &profile.ideal_checks {
            let Some(angle) = check.angle.measure(frame) else {
                continue;
            };
            joint_angles.insert(check.name.to_string(), angle);

            if angle < check.ideal_min || angle > check.ideal_max {
                let deviation = if angle < check.ideal_min {
                    check.ideal_min - angle
                } else {
                    angle - check.ideal_max
                };
                let penalty = (check.weight * self.config.ideal_penalty_cap_multiplier)
                    .min(deviation * check.weight * self.config.ideal_penalty_slope);
                score -= penalty;
            }
        }

        for check in &profile.issue_checks {
            if check.detector.evaluate(frame) {
                score -= check.severity.penalty();
                issues.push(check.issue());
            }
        }

        let rom_degrees = profile.tracking_angle.measure(frame).unwrap_or(0.0);

        if let Some(joint) = profile.bar_path_joint {
            if let Some(kp) = frame.keypoint(joint) {
                if kp.is_reliable() {
                    self.bar_path_window.push_back(kp.x);
                    while self.bar_path_window.len() > self.config.bar_path_window {
                        self.bar_path_window.pop_front();
                    }
                }
            }
        }

        FormAnalysisResult {
            score: score.clamp(0.0, MAX_FORM_SCORE),
            issues,
            joint_angles,
            rom_degrees,
            bar_path_deviation: self.bar_path_deviation(),
        }
    }

    /// Current rolling bar-path deviation in 0..1.
    ///
    /// Zero until the window holds the minimum number of samples.
    #[must_use]
    pub fn bar_path_deviation(&self) -> f32 {
        if self.bar_path_window.len() < self.config.bar_path_min_samples {
            return 0.0;
        }
        let samples: Vec<f32> = self.bar_path_window.iter().copied().collect();
        (geometry::std_dev(&samples) * self.config.bar_path_deviation_scale).min(1.0)
    }

    /// Clears the bar-path window.
    ///
    /// Called between sets, not between reps. Idempotent.
    pub fn reset_bar_path(&mut self) {
        self.bar_path_window.clear();
    }
}

impl Resettable for FormAnalyzer {
    fn reset(&mut self) {
        self.reset_bar_path();
    }
}
