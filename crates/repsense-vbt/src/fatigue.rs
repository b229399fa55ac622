//! Set-level fatigue estimation from concentric velocity decline.
//!
//! The first rep with a non-zero mean concentric velocity sets the
//! session baseline. Every later rep is compared against it: once the
//! loss crosses the auto-stop threshold the set should end, and a
//! linear fit over the current set's reps projects how many remain
//! before velocity falls to the failure fraction of baseline.

use serde::{Deserialize, Serialize};

use crate::velocity::RepVelocity;

/// Velocity-loss fraction at which a set should be stopped.
pub const DEFAULT_AUTO_STOP_LOSS: f32 = 0.20;

/// Fraction of baseline velocity treated as technical failure.
pub const DEFAULT_FAILURE_VELOCITY_FRACTION: f32 = 0.30;

/// Configuration for the fatigue model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FatigueConfig {
    /// Velocity-loss fraction at which `should_auto_stop` turns on.
    pub auto_stop_loss: f32,
    /// Fraction of baseline velocity treated as failure.
    pub failure_velocity_fraction: f32,
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            auto_stop_loss: DEFAULT_AUTO_STOP_LOSS,
            failure_velocity_fraction: DEFAULT_FAILURE_VELOCITY_FRACTION,
        }
    }
}

/// Point-in-time fatigue assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueStatus {
    /// Fractional concentric velocity loss against the session
    /// baseline, never negative.
    pub velocity_loss: f32,
    /// True once the loss reaches the auto-stop threshold.
    pub should_auto_stop: bool,
    /// Estimated reps until failure velocity. `None` when the trend is
    /// flat, improving, or too short to fit.
    pub reps_to_failure: Option<u32>,
}

impl FatigueStatus {
    /// The assessment before any baseline exists.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            velocity_loss: 0.0,
            should_auto_stop: false,
            reps_to_failure: None,
        }
    }
}

/// Tracks concentric velocity across reps and sets.
///
/// The baseline and session peak persist across sets; the rep history
/// the trend is fitted over is per set.
#[derive(Debug)]
pub struct FatigueModel {
    config: FatigueConfig,
    /// Mean concentric velocity of the first productive rep.
    baseline_mps: Option<f32>,
    /// Fastest single concentric reading observed this session.
    session_peak_mps: f32,
    /// Mean concentric velocity of each rep in the current set.
    set_history: Vec<f32>,
}

impl FatigueModel {
    /// Creates an empty model.
    #[must_use]
    pub fn new(config: FatigueConfig) -> Self {
        Self {
            config,
            baseline_mps: None,
            session_peak_mps: 0.0,
            set_history: Vec::new(),
        }
    }

    /// Records one completed rep.
    ///
    /// A rep whose mean concentric velocity is zero still enters the
    /// set history but never becomes the baseline.
    pub fn record_rep(&mut self, rep: &RepVelocity) {
        self.set_history.push(rep.mean_concentric_mps);
        if self.baseline_mps.is_none() && rep.mean_concentric_mps > 0.0 {
            self.baseline_mps = Some(rep.mean_concentric_mps);
        }
        if rep.peak_concentric_mps > self.session_peak_mps {
            self.session_peak_mps = rep.peak_concentric_mps;
        }
    }

    /// Current fatigue assessment.
    ///
    /// Neutral until a baseline exists and the current set has at
    /// least one rep.
    #[must_use]
    pub fn status(&self) -> FatigueStatus {
        let (Some(baseline), Some(&latest)) = (self.baseline_mps, self.set_history.last()) else {
            return FatigueStatus::neutral();
        };

        let velocity_loss = ((baseline - latest) / baseline).max(0.0);
        FatigueStatus {
            velocity_loss,
            should_auto_stop: velocity_loss >= self.config.auto_stop_loss,
            reps_to_failure: self.reps_to_failure(baseline, latest),
        }
    }

    /// Session baseline, if one has been established.
    #[must_use]
    pub fn baseline_mps(&self) -> Option<f32> {
        self.baseline_mps
    }

    /// Fastest single concentric reading observed this session.
    #[must_use]
    pub fn session_peak_mps(&self) -> f32 {
        self.session_peak_mps
    }

    /// Reps recorded in the current set.
    #[must_use]
    pub fn set_rep_count(&self) -> usize {
        self.set_history.len()
    }

    /// Ends the current set: the rep history clears, the baseline and
    /// session peak carry over.
    pub fn reset_set(&mut self) {
        self.set_history.clear();
    }

    /// Forgets everything, including the baseline and the peak.
    pub fn reset_session(&mut self) {
        self.set_history.clear();
        self.baseline_mps = None;
        self.session_peak_mps = 0.0;
    }

    /// Linear projection of reps remaining until failure velocity.
    ///
    /// Fits a straight line through the set's first and latest rep and
    /// extends it until it crosses `baseline * failure_fraction`.
    fn reps_to_failure(&self, baseline: f32, latest: f32) -> Option<u32> {
        if self.set_history.len() < 2 {
            return None;
        }
        let first = self.set_history[0];
        let decline_per_rep = (first - latest) / (self.set_history.len() - 1) as f32;
        if decline_per_rep <= 0.0 {
            return None;
        }

        let failure_velocity = baseline * self.config.failure_velocity_fraction;
        if latest <= failure_velocity {
            return Some(0);
        }
        Some(((latest - failure_velocity) / decline_per_rep).ceil() as u32)
    }
}

impl Default for FatigueModel {
    fn default() -> Self {
        Self::new(FatigueConfig::default())
    }
}
