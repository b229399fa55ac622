//! Instantaneous velocity from keypoint displacement.
//!
//! The tracker differentiates the vertical position of a single
//! velocity joint between consecutive frames, converts the result to
//! meters per second through the [`Calibration`], and maintains both a
//! short moving average for display and per-phase accumulators for
//! rep-level statistics.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use repsense_core::{
    Keypoint, PhaseListener, RepPhase, Resettable, Timestamp, DEFAULT_CONFIDENCE_THRESHOLD,
};

use crate::calibration::Calibration;

/// Readings in the displayed-velocity moving average.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;

/// Inter-sample gaps at or above this many seconds discard the reading.
pub const DEFAULT_MAX_FRAME_GAP_SECS: f64 = 0.5;

/// Configuration for the velocity tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VelocityTrackerConfig {
    /// Readings in the displayed-velocity moving average.
    pub smoothing_window: usize,
    /// Gaps at or above this many seconds discard the reading.
    pub max_frame_gap_secs: f64,
    /// Keypoints below this confidence are ignored.
    pub min_confidence: f32,
    /// Resistance-curve modifier applied to every reading.
    pub velocity_modifier: f32,
}

impl Default for VelocityTrackerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            max_frame_gap_secs: DEFAULT_MAX_FRAME_GAP_SECS,
            min_confidence: DEFAULT_CONFIDENCE_THRESHOLD,
            velocity_modifier: 1.0,
        }
    }
}

/// One velocity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VelocityReading {
    /// Unsmoothed speed of this frame pair, m/s.
    pub raw_mps: f32,
    /// Moving-average speed over the recent window, m/s.
    pub smoothed_mps: f32,
    /// Movement phase the reading was taken in.
    pub phase: RepPhase,
}

/// Velocity statistics for one completed repetition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepVelocity {
    /// Mean concentric speed, m/s.
    pub mean_concentric_mps: f32,
    /// Peak concentric speed, m/s.
    pub peak_concentric_mps: f32,
    /// Mean eccentric speed, m/s.
    pub mean_eccentric_mps: f32,
}

/// Frame-to-frame velocity tracker for one joint.
#[derive(Debug)]
pub struct VelocityTracker {
    config: VelocityTrackerConfig,
    calibration: Calibration,
    /// Current movement phase, fed by the rep state machine.
    phase: RepPhase,
    /// Vertical position and time of the previous accepted sample.
    last_sample: Option<(f32, Timestamp)>,
    /// Recent raw readings for the moving average.
    recent: VecDeque<f32>,
    /// Smoothed readings taken while ascending, cleared per rep.
    concentric: Vec<f32>,
    /// Smoothed readings taken while descending, cleared per rep.
    eccentric: Vec<f32>,
}

impl VelocityTracker {
    /// Creates a tracker with the given configuration and calibration.
    #[must_use]
    pub fn new(config: VelocityTrackerConfig, calibration: Calibration) -> Self {
        Self {
            config,
            calibration,
            phase: RepPhase::Idle,
            last_sample: None,
            recent: VecDeque::new(),
            concentric: Vec::new(),
            eccentric: Vec::new(),
        }
    }

    /// Feeds one observation of the velocity joint.
    ///
    /// Returns `None` when no reading can be produced: the first sample
    /// after a reset, a keypoint below the confidence floor, a
    /// non-positive time step, or a gap at or beyond the configured
    /// maximum. A discarded gap still re-anchors the tracker so the
    /// next frame measures against the current position.
    pub fn process(&mut self, keypoint: &Keypoint, at: Timestamp) -> Option<VelocityReading> {
        if keypoint.confidence.value() < self.config.min_confidence {
            return None;
        }

        let previous = self.last_sample.replace((keypoint.y, at))?;
        let (last_y, last_at) = previous;

        let dt = at.duration_since(&last_at);
        if dt <= 0.0 || dt >= self.config.max_frame_gap_secs {
            return None;
        }

        let displacement_m = self.calibration.to_meters((keypoint.y - last_y).abs());
        let raw = displacement_m / dt as f32 * self.config.velocity_modifier;

        self.recent.push_back(raw);
        while self.recent.len() > self.config.smoothing_window {
            self.recent.pop_front();
        }
        let smoothed = self.current_velocity_mps();

        // Rep statistics accumulate the smoothed series; other phases
        // only feed the live readout.
        match self.phase {
            RepPhase::Ascending => self.concentric.push(smoothed),
            RepPhase::Descending => self.eccentric.push(smoothed),
            _ => {}
        }

        Some(VelocityReading {
            raw_mps: raw,
            smoothed_mps: smoothed,
            phase: self.phase,
        })
    }

    /// Moving-average speed over the recent window, zero when empty.
    #[must_use]
    pub fn current_velocity_mps(&self) -> f32 {
        if self.recent.is_empty() {
            return 0.0;
        }
        self.recent.iter().sum::<f32>() / self.recent.len() as f32
    }

    /// Current movement phase as last reported by the state machine.
    #[must_use]
    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    /// Folds the per-phase accumulators into rep statistics and clears
    /// them for the next rep.
    ///
    /// With no accepted readings in a phase its statistics are zero,
    /// not an error; the fatigue model treats a zero mean as "no
    /// baseline yet".
    pub fn complete_rep(&mut self) -> RepVelocity {
        let rep = RepVelocity {
            mean_concentric_mps: mean_of(&self.concentric),
            peak_concentric_mps: peak_of(&self.concentric),
            mean_eccentric_mps: mean_of(&self.eccentric),
        };
        self.concentric.clear();
        self.eccentric.clear();
        rep
    }

    /// Clears every sample and the phase, keeping config and
    /// calibration. The next observation only re-anchors the tracker.
    pub fn reset_set(&mut self) {
        self.phase = RepPhase::Idle;
        self.last_sample = None;
        self.recent.clear();
        self.concentric.clear();
        self.eccentric.clear();
    }
}

impl PhaseListener for VelocityTracker {
    fn phase_changed(&mut self, phase: RepPhase, _at: Timestamp) {
        self.phase = phase;
    }
}

impl Resettable for VelocityTracker {
    fn reset(&mut self) {
        self.reset_set();
    }
}

/// Arithmetic mean, zero for an empty slice.
fn mean_of(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Maximum value, zero for an empty slice.
fn peak_of(values: &[f32]) -> f32 {
    values.iter().copied().fold(0.0_f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use repsense_core::{Confidence, JointName};

    fn hip_at(y: f32) -> Keypoint {
        Keypoint::new(JointName::LeftHip, 0.5, y, Confidence::new(0.9).unwrap())
    }

    fn at(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    /// 3 m per normalized unit for round numbers.
    fn tracker() -> VelocityTracker {
        VelocityTracker::new(
            VelocityTrackerConfig::default(),
            Calibration::from_body_height(1.8, 0.6).unwrap(),
        )
    }

    #[test]
    fn first_sample_yields_no_reading() {
        let mut t = tracker();
        assert!(t.process(&hip_at(0.5), at(0.0)).is_none());
    }

    #[test]
    fn computes_meters_per_second() {
        let mut t = tracker();
        t.process(&hip_at(0.50), at(0.0));
        let reading = t.process(&hip_at(0.53), at(0.1)).unwrap();
        // 0.03 units * 3 m/unit over 0.1 s.
        assert_abs_diff_eq!(reading.raw_mps, 0.9, epsilon = 1e-4);
        assert_abs_diff_eq!(reading.smoothed_mps, 0.9, epsilon = 1e-4);
    }

    #[test]
    fn direction_does_not_matter() {
        let mut t = tracker();
        t.process(&hip_at(0.53), at(0.0));
        let reading = t.process(&hip_at(0.50), at(0.1)).unwrap();
        assert_abs_diff_eq!(reading.raw_mps, 0.9, epsilon = 1e-4);
    }

    #[test]
    fn applies_velocity_modifier() {
        let config = VelocityTrackerConfig {
            velocity_modifier: 0.90,
            ..VelocityTrackerConfig::default()
        };
        let mut t =
            VelocityTracker::new(config, Calibration::from_body_height(1.8, 0.6).unwrap());
        t.process(&hip_at(0.50), at(0.0));
        let reading = t.process(&hip_at(0.53), at(0.1)).unwrap();
        assert_abs_diff_eq!(reading.raw_mps, 0.81, epsilon = 1e-4);
    }

    #[test]
    fn low_confidence_keypoint_ignored() {
        let mut t = tracker();
        t.process(&hip_at(0.50), at(0.0));

        let weak = Keypoint::new(
            JointName::LeftHip,
            0.5,
            0.9,
            Confidence::new(0.1).unwrap(),
        );
        assert!(t.process(&weak, at(0.1)).is_none());

        // The weak sample did not become the anchor: the next reading
        // spans 0.0 to 0.2 seconds from y 0.50.
        let reading = t.process(&hip_at(0.56), at(0.2)).unwrap();
        assert_abs_diff_eq!(reading.raw_mps, 0.9, epsilon = 1e-4);
    }

    #[test]
    fn frame_gap_discards_but_reanchors() {
        let mut t = tracker();
        t.process(&hip_at(0.50), at(0.0));
        assert!(t.process(&hip_at(0.80), at(0.6)).is_none());

        // Next frame measures against the re-anchored 0.80 at 0.6 s.
        let reading = t.process(&hip_at(0.83), at(0.7)).unwrap();
        assert_abs_diff_eq!(reading.raw_mps, 0.9, epsilon = 1e-4);
    }

    #[test]
    fn non_positive_dt_discards_reading() {
        let mut t = tracker();
        t.process(&hip_at(0.50), at(1.0));
        assert!(t.process(&hip_at(0.53), at(1.0)).is_none());
        assert!(t.process(&hip_at(0.53), at(0.9)).is_none());
    }

    #[test]
    fn smoothing_averages_recent_readings() {
        let mut t = tracker();
        let mut y = 0.10;
        t.process(&hip_at(y), at(0.0));
        for i in 1..=5 {
            y += 0.03;
            t.process(&hip_at(y), at(i as f64 * 0.1));
        }
        // Window full of 0.9 readings, then one at 1.8.
        y += 0.06;
        let reading = t.process(&hip_at(y), at(0.6)).unwrap();
        assert_abs_diff_eq!(reading.raw_mps, 1.8, epsilon = 1e-3);
        assert_abs_diff_eq!(reading.smoothed_mps, 1.08, epsilon = 1e-3);
    }

    #[test]
    fn readings_route_by_phase() {
        let mut t = tracker();
        t.phase_changed(RepPhase::Descending, at(0.0));
        t.process(&hip_at(0.30), at(0.0));
        t.process(&hip_at(0.33), at(0.1));
        t.process(&hip_at(0.36), at(0.2));

        t.phase_changed(RepPhase::Ascending, at(0.3));
        t.process(&hip_at(0.33), at(0.3));
        t.process(&hip_at(0.27), at(0.4));

        let rep = t.complete_rep();
        // Eccentric smoothed readings were 0.9 and 0.9. The last ascent
        // frame moved at a raw 1.8, averaged against three 0.9 readings
        // into 1.125.
        assert_abs_diff_eq!(rep.mean_eccentric_mps, 0.9, epsilon = 1e-3);
        assert_abs_diff_eq!(rep.mean_concentric_mps, 1.0125, epsilon = 1e-3);
        assert_abs_diff_eq!(rep.peak_concentric_mps, 1.125, epsilon = 1e-3);
    }

    #[test]
    fn idle_readings_are_unrouted() {
        let mut t = tracker();
        t.process(&hip_at(0.50), at(0.0));
        t.process(&hip_at(0.53), at(0.1));

        let rep = t.complete_rep();
        assert_eq!(rep.mean_concentric_mps, 0.0);
        assert_eq!(rep.mean_eccentric_mps, 0.0);
        assert_eq!(rep.peak_concentric_mps, 0.0);
    }

    #[test]
    fn complete_rep_clears_accumulators() {
        let mut t = tracker();
        t.phase_changed(RepPhase::Ascending, at(0.0));
        t.process(&hip_at(0.50), at(0.0));
        t.process(&hip_at(0.53), at(0.1));

        let first = t.complete_rep();
        assert!(first.mean_concentric_mps > 0.0);

        let second = t.complete_rep();
        assert_eq!(second.mean_concentric_mps, 0.0);
    }

    #[test]
    fn reset_set_zeroes_velocity_and_anchor() {
        let mut t = tracker();
        t.phase_changed(RepPhase::Ascending, at(0.0));
        t.process(&hip_at(0.50), at(0.0));
        t.process(&hip_at(0.53), at(0.1));
        assert!(t.current_velocity_mps() > 0.0);

        t.reset_set();
        assert_eq!(t.current_velocity_mps(), 0.0);
        assert_eq!(t.phase(), RepPhase::Idle);
        assert!(t.process(&hip_at(0.60), at(5.0)).is_none());
    }
}
