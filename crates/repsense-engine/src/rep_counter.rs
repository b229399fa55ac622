//! Five-phase repetition state machine.
//!
//! The counter consumes one tracking-angle measurement per valid frame,
//! smooths it over a short rolling window, and walks a fixed cycle:
//!
//! ```text
//! Idle -> AtTop -> Descending -> AtBottom -> Ascending -> AtTop (rep)
//! ```
//!
//! A rep is emitted only on the `Ascending -> AtTop` transition. A
//! stroke that aborts partway takes one of two recovery edges instead:
//! a descent that turns around early returns over `Descending -> AtTop`
//! and an ascent that sinks back over `Ascending -> AtBottom`; neither
//! counts. Zone membership carries its own hysteresis: the top and
//! bottom zones cover opposite ends of the configured range with a wide
//! dead band between them.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use repsense_core::{RepPhase, Timestamp};

/// Frames in the angle smoothing window.
pub const DEFAULT_ANGLE_SMOOTHING_WINDOW: usize = 5;

/// Fraction of the angular range, measured from the bottom angle, that
/// counts as the bottom zone.
pub const DEFAULT_BOTTOM_ZONE_FRACTION: f32 = 0.30;

/// Fraction of the angular range beyond which the top zone begins.
pub const DEFAULT_TOP_ZONE_FRACTION: f32 = 0.80;

/// Configuration for the rep counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepCounterConfig {
    /// Frames in the angle smoothing window.
    pub smoothing_window: usize,
    /// Fraction of the range forming the bottom zone.
    pub bottom_zone_fraction: f32,
    /// Fraction of the range where the top zone begins.
    pub top_zone_fraction: f32,
}

impl Default for RepCounterConfig {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_ANGLE_SMOOTHING_WINDOW,
            bottom_zone_fraction: DEFAULT_BOTTOM_ZONE_FRACTION,
            top_zone_fraction: DEFAULT_TOP_ZONE_FRACTION,
        }
    }
}

/// Angle thresholds for the top and bottom zones of one exercise.
///
/// Derived once at configuration from the profile's top and bottom
/// angles. The orientation (whether the top of the movement is the
/// larger or the smaller angle) is baked in here so the state machine
/// itself never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleZones {
    top_enter_degrees: f32,
    bottom_enter_degrees: f32,
    is_top_high: bool,
}

impl AngleZones {
    /// Derives the zones from a profile's top and bottom angles.
    #[must_use]
    pub fn new(top_angle: f32, bottom_angle: f32, config: &RepCounterConfig) -> Self {
        let is_top_high = top_angle > bottom_angle;
        let range = (top_angle - bottom_angle).abs();

        let (top_enter, bottom_enter) = if is_top_high {
            (
                bottom_angle + config.top_zone_fraction * range,
                bottom_angle + config.bottom_zone_fraction * range,
            )
        } else {
            (
                bottom_angle - config.top_zone_fraction * range,
                bottom_angle - config.bottom_zone_fraction * range,
            )
        };

        Self {
            top_enter_degrees: top_enter,
            bottom_enter_degrees: bottom_enter,
            is_top_high,
        }
    }

    /// Whether the top of the movement is the larger angle.
    #[must_use]
    pub fn is_top_high(&self) -> bool {
        self.is_top_high
    }

    /// Angle at which the top zone begins. Inclusive.
    #[must_use]
    pub fn top_enter_degrees(&self) -> f32 {
        self.top_enter_degrees
    }

    /// Angle at which the bottom zone begins. Inclusive.
    #[must_use]
    pub fn bottom_enter_degrees(&self) -> f32 {
        self.bottom_enter_degrees
    }

    /// Whether an angle is inside the top zone.
    #[must_use]
    pub fn in_top(&self, angle: f32) -> bool {
        if self.is_top_high {
            angle >= self.top_enter_degrees
        } else {
            angle <= self.top_enter_degrees
        }
    }

    /// Whether an angle is inside the bottom zone.
    #[must_use]
    pub fn in_bottom(&self, angle: f32) -> bool {
        if self.is_top_high {
            angle <= self.bottom_enter_degrees
        } else {
            angle >= self.bottom_enter_degrees
        }
    }
}

/// One phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    /// Phase before the transition
    pub from: RepPhase,
    /// Phase after the transition
    pub to: RepPhase,
}

/// A repetition as seen by the counter, before enrichment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletedRep {
    /// 1-based rep number within the session
    pub rep_number: u32,
    /// Smoothed-angle span covered since the previous rep, in degrees
    pub rom_degrees: f32,
    /// Seconds from leaving the top to returning to it
    pub duration_secs: f64,
    /// Seconds from leaving the top to leaving the bottom, including
    /// the bottom dwell
    pub eccentric_secs: f64,
    /// Seconds from leaving the bottom to re-entering the top
    pub concentric_secs: f64,
    /// Frame timestamp of the completing transition
    pub completed_at: Timestamp,
}

/// Result of feeding one angle measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepUpdate {
    /// Smoothed tracking angle for this frame
    pub smoothed_angle: f32,
    /// Phase after this frame
    pub phase: RepPhase,
    /// The transition this frame caused, if any
    pub transition: Option<PhaseTransition>,
    /// The rep this frame completed, if any
    pub completed: Option<CompletedRep>,
}

/// Rolling-average rep state machine.
#[derive(Debug)]
pub struct RepCounter {
    config: RepCounterConfig,
    zones: AngleZones,
    window: VecDeque<f32>,
    phase: RepPhase,
    rep_count: u32,
    /// Smoothed-angle extremes since the last emitted rep.
    rom_span: Option<(f32, f32)>,
    /// When the current rep attempt left the top zone.
    rep_started_at: Option<Timestamp>,
    /// When the current rep attempt left the bottom zone.
    ascent_started_at: Option<Timestamp>,
}

impl RepCounter {
    /// Creates an idle counter for the given zones.
    #[must_use]
    pub fn new(zones: AngleZones, config: RepCounterConfig) -> Self {
        Self {
            config,
            zones,
            window: VecDeque::new(),
            phase: RepPhase::Idle,
            rep_count: 0,
            rom_span: None,
            rep_started_at: None,
            ascent_started_at: None,
        }
    }

    /// Feeds one tracking-angle measurement from a valid frame.
    pub fn update(&mut self, raw_angle: f32, at: Timestamp) -> RepUpdate {
        self.window.push_back(raw_angle);
        while self.window.len() > self.config.smoothing_window {
            self.window.pop_front();
        }
        let smoothed = self.window.iter().sum::<f32>() / self.window.len() as f32;

        let span = self.rom_span.get_or_insert((smoothed, smoothed));
        span.0 = span.0.min(smoothed);
        span.1 = span.1.max(smoothed);

        let next = self.next_phase(smoothed);
        let transition = (next != self.phase).then_some(PhaseTransition {
            from: self.phase,
            to: next,
        });

        let mut completed = None;
        if let Some(t) = transition {
            match (t.from, t.to) {
                (RepPhase::AtTop, RepPhase::Descending) => {
                    self.rep_started_at = Some(at);
                }
                (RepPhase::AtBottom, RepPhase::Ascending) => {
                    self.ascent_started_at = Some(at);
                }
                (RepPhase::Ascending, RepPhase::AtTop) => {
                    self.rep_count += 1;
                    let (min, max) = self.rom_span.take().unwrap_or((smoothed, smoothed));
                    let started = self.rep_started_at.take().unwrap_or(at);
                    let ascent = self.ascent_started_at.take().unwrap_or(at);
                    completed = Some(CompletedRep {
                        rep_number: self.rep_count,
                        rom_degrees: max - min,
                        duration_secs: at.duration_since(&started),
                        eccentric_secs: ascent.duration_since(&started),
                        concentric_secs: at.duration_since(&ascent),
                        completed_at: at,
                    });
                    // The next rep's span starts measuring from here.
                    self.rom_span = Some((smoothed, smoothed));
                }
                _ => {}
            }
        }

        self.phase = next;
        RepUpdate {
            smoothed_angle: smoothed,
            phase: next,
            transition,
            completed,
        }
    }

    fn next_phase(&self, angle: f32) -> RepPhase {
        let zones = &self.zones;
        match self.phase {
            RepPhase::Idle | RepPhase::AtTop => {
                if zones.in_top(angle) {
                    RepPhase::AtTop
                } else if self.phase == RepPhase::AtTop {
                    RepPhase::Descending
                } else {
                    RepPhase::Idle
                }
            }
            RepPhase::Descending => {
                if zones.in_bottom(angle) {
                    RepPhase::AtBottom
                } else if zones.in_top(angle) {
                    // Turned around before reaching the bottom.
                    RepPhase::AtTop
                } else {
                    RepPhase::Descending
                }
            }
            RepPhase::AtBottom => {
                if zones.in_bottom(angle) {
                    RepPhase::AtBottom
                } else {
                    RepPhase::Ascending
                }
            }
            RepPhase::Ascending => {
                if zones.in_top(angle) {
                    RepPhase::AtTop
                } else if zones.in_bottom(angle) {
                    // Sank back before reaching the top.
                    RepPhase::AtBottom
                } else {
                    RepPhase::Ascending
                }
            }
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RepPhase {
        self.phase
    }

    /// Reps counted this session, across sets.
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    /// Current smoothed angle, `None` before the first measurement.
    #[must_use]
    pub fn smoothed_angle(&self) -> Option<f32> {
        if self.window.is_empty() {
            return None;
        }
        Some(self.window.iter().sum::<f32>() / self.window.len() as f32)
    }

    /// Active zone thresholds.
    #[must_use]
    pub fn zones(&self) -> &AngleZones {
        &self.zones
    }

    /// Ends the set: phase returns to idle and the smoothing and span
    /// buffers clear. The session rep count is preserved.
    pub fn end_set(&mut self) {
        self.phase = RepPhase::Idle;
        self.window.clear();
        self.rom_span = None;
        self.rep_started_at = None;
        self.ascent_started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn squat_counter() -> RepCounter {
        let config = RepCounterConfig::default();
        RepCounter::new(AngleZones::new(170.0, 70.0, &config), config)
    }

    fn row_counter() -> RepCounter {
        let config = RepCounterConfig::default();
        RepCounter::new(AngleZones::new(60.0, 160.0, &config), config)
    }

    /// Feeds `frames` copies of one angle at 30 fps, collecting any
    /// completed reps and returning the transitions that fired.
    fn dwell(
        counter: &mut RepCounter,
        angle: f32,
        frames: usize,
        clock: &mut f64,
        completed: &mut Vec<CompletedRep>,
    ) -> Vec<PhaseTransition> {
        let mut transitions = Vec::new();
        for _ in 0..frames {
            let update = counter.update(angle, Timestamp::from_secs_f64(*clock));
            *clock += 1.0 / 30.0;
            completed.extend(update.completed);
            transitions.extend(update.transition);
        }
        transitions
    }

    #[test]
    fn test_zone_thresholds_for_high_top() {
        let zones = AngleZones::new(170.0, 70.0, &RepCounterConfig::default());
        assert!(zones.is_top_high());
        assert_abs_diff_eq!(zones.top_enter_degrees(), 150.0);
        assert_abs_diff_eq!(zones.bottom_enter_degrees(), 100.0);

        assert!(zones.in_top(150.0));
        assert!(!zones.in_top(149.9));
        assert!(zones.in_bottom(100.0));
        assert!(!zones.in_bottom(100.1));
    }

    #[test]
    fn test_zone_thresholds_for_low_top() {
        let zones = AngleZones::new(60.0, 160.0, &RepCounterConfig::default());
        assert!(!zones.is_top_high());
        assert_abs_diff_eq!(zones.top_enter_degrees(), 80.0);
        assert_abs_diff_eq!(zones.bottom_enter_degrees(), 130.0);

        assert!(zones.in_top(80.0));
        assert!(!zones.in_top(80.1));
        assert!(zones.in_bottom(130.0));
        assert!(!zones.in_bottom(129.9));
    }

    #[test]
    fn test_idle_until_top_zone_reached() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        dwell(&mut counter, 120.0, 5, &mut clock, &mut reps);
        assert_eq!(counter.phase(), RepPhase::Idle);

        dwell(&mut counter, 170.0, 5, &mut clock, &mut reps);
        assert_eq!(counter.phase(), RepPhase::AtTop);
        assert!(reps.is_empty());
    }

    #[test]
    fn test_first_frame_in_top_zone_arms_without_a_rep() {
        let mut counter = squat_counter();

        let update = counter.update(170.0, Timestamp::from_secs_f64(0.0));
        assert_eq!(
            update.transition,
            Some(PhaseTransition {
                from: RepPhase::Idle,
                to: RepPhase::AtTop,
            })
        );
        assert!(update.completed.is_none());
        assert_eq!(counter.rep_count(), 0);
    }

    #[test]
    fn test_full_cycle_emits_exactly_one_rep() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        for angle in [170.0, 140.0, 70.0, 140.0, 170.0] {
            dwell(&mut counter, angle, 5, &mut clock, &mut reps);
        }

        assert_eq!(reps.len(), 1);
        assert_eq!(counter.rep_count(), 1);
        assert_eq!(counter.phase(), RepPhase::AtTop);

        let rep = &reps[0];
        assert_eq!(rep.rep_number, 1);
        assert_abs_diff_eq!(rep.rom_degrees, 100.0, epsilon = 1e-3);
        // Descent starts at frame 8, ascent at frame 17, lockout at
        // frame 21 under the 5-sample smoother.
        assert_abs_diff_eq!(rep.eccentric_secs, 9.0 / 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(rep.concentric_secs, 4.0 / 30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(
            rep.duration_secs,
            rep.eccentric_secs + rep.concentric_secs,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_partial_descent_does_not_count() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();
        let mut transitions = Vec::new();

        // Leaves the top, turns around before the bottom zone.
        for angle in [170.0, 120.0, 170.0] {
            transitions.extend(dwell(&mut counter, angle, 5, &mut clock, &mut reps));
        }

        assert!(reps.is_empty());
        assert_eq!(counter.rep_count(), 0);
        // The abort surfaces as the turnaround edge, not a wedged state.
        assert!(transitions.contains(&PhaseTransition {
            from: RepPhase::Descending,
            to: RepPhase::AtTop,
        }));
        assert_eq!(counter.phase(), RepPhase::AtTop);
    }

    #[test]
    fn test_sinking_back_delays_the_rep() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();
        let mut transitions = Vec::new();

        // Rises out of the bottom, sinks back, then finishes.
        for angle in [170.0, 140.0, 70.0, 120.0, 70.0, 140.0, 170.0] {
            transitions.extend(dwell(&mut counter, angle, 5, &mut clock, &mut reps));
        }

        // The failed ascent drops back over the sink-back edge and the
        // rep only counts on the second attempt.
        assert!(transitions.contains(&PhaseTransition {
            from: RepPhase::Ascending,
            to: RepPhase::AtBottom,
        }));
        assert_eq!(reps.len(), 1);
        assert_eq!(counter.rep_count(), 1);
    }

    #[test]
    fn test_inverted_orientation_counts_reps() {
        let mut counter = row_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        // Row: top is full contraction at the small elbow angle.
        for angle in [60.0, 120.0, 160.0, 120.0, 60.0] {
            dwell(&mut counter, angle, 5, &mut clock, &mut reps);
        }

        assert_eq!(reps.len(), 1);
        assert_abs_diff_eq!(reps[0].rom_degrees, 100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_consecutive_reps_number_sequentially() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        dwell(&mut counter, 170.0, 5, &mut clock, &mut reps);
        for _ in 0..3 {
            for angle in [140.0, 70.0, 140.0, 170.0] {
                dwell(&mut counter, angle, 5, &mut clock, &mut reps);
            }
        }

        assert_eq!(reps.len(), 3);
        assert_eq!(counter.rep_count(), 3);
        let numbers: Vec<u32> = reps.iter().map(|r| r.rep_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        for rep in &reps {
            assert_abs_diff_eq!(rep.rom_degrees, 100.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_end_set_preserves_rep_count() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        for angle in [170.0, 140.0, 70.0, 140.0, 170.0] {
            dwell(&mut counter, angle, 5, &mut clock, &mut reps);
        }
        assert_eq!(counter.rep_count(), 1);

        counter.end_set();
        assert_eq!(counter.phase(), RepPhase::Idle);
        assert!(counter.smoothed_angle().is_none());
        assert_eq!(counter.rep_count(), 1);

        // The next set continues the session numbering.
        for angle in [170.0, 140.0, 70.0, 140.0, 170.0] {
            dwell(&mut counter, angle, 5, &mut clock, &mut reps);
        }
        assert_eq!(counter.rep_count(), 2);
        assert_eq!(reps.last().map(|r| r.rep_number), Some(2));
    }

    #[test]
    fn test_smoothing_absorbs_single_frame_spikes() {
        let mut counter = squat_counter();
        let mut clock = 0.0;
        let mut reps = Vec::new();

        dwell(&mut counter, 170.0, 5, &mut clock, &mut reps);

        // One wild dropout frame does not leave the top zone:
        // the smoothed angle stays at (170*4 + 90) / 5 = 154.
        counter.update(90.0, Timestamp::from_secs_f64(clock));
        assert_eq!(counter.phase(), RepPhase::AtTop);
    }
}
