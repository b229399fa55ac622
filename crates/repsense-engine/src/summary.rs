//! Per-set rep history and set summaries.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use repsense_core::{geometry, Timestamp};
use repsense_form::ExerciseKind;

use crate::events::RepEvent;

/// Reps retained per set before the oldest are evicted.
pub const DEFAULT_REP_LOG_CAPACITY: usize = 256;

/// Bounded log of the current set's completed reps.
#[derive(Debug, Clone)]
pub struct RepLog {
    capacity: usize,
    reps: VecDeque<RepEvent>,
}

impl RepLog {
    /// Creates an empty log holding at most `capacity` reps.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            reps: VecDeque::new(),
        }
    }

    /// Appends a rep, evicting the oldest past capacity.
    pub fn push(&mut self, rep: RepEvent) {
        self.reps.push_back(rep);
        while self.reps.len() > self.capacity {
            self.reps.pop_front();
        }
    }

    /// Number of logged reps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reps.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reps.is_empty()
    }

    /// Most recently logged rep.
    #[must_use]
    pub fn latest(&self) -> Option<&RepEvent> {
        self.reps.back()
    }

    /// Iterates reps oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &RepEvent> {
        self.reps.iter()
    }

    /// Removes every logged rep.
    pub fn clear(&mut self) {
        self.reps.clear();
    }

    /// Folds the logged reps into a summary for the given set.
    #[must_use]
    pub fn summarize(
        &self,
        set_number: u32,
        exercise: ExerciseKind,
        final_velocity_loss: f32,
    ) -> SetSummary {
        let scores: Vec<f32> = self.reps.iter().map(|r| r.form_score).collect();
        let roms: Vec<f32> = self.reps.iter().map(|r| r.rom_degrees).collect();
        let concentric_means: Vec<f32> = self
            .reps
            .iter()
            .map(|r| r.velocity.mean_concentric_mps)
            .collect();
        let peak_concentric_mps = self
            .reps
            .iter()
            .map(|r| r.velocity.peak_concentric_mps)
            .fold(0.0_f32, f32::max);
        let worst_form_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().copied().fold(f32::INFINITY, f32::min)
        };

        SetSummary {
            set_number,
            exercise,
            rep_count: self.reps.len() as u32,
            mean_form_score: geometry::mean(&scores),
            best_form_score: scores.iter().copied().fold(0.0_f32, f32::max),
            worst_form_score,
            mean_rom_degrees: geometry::mean(&roms),
            mean_concentric_mps: geometry::mean(&concentric_means),
            peak_concentric_mps,
            final_velocity_loss,
            first_rep_at: self.reps.front().map(|r| r.completed_at),
            last_rep_at: self.reps.back().map(|r| r.completed_at),
            recorded_at: Utc::now(),
        }
    }
}

impl Default for RepLog {
    fn default() -> Self {
        Self::new(DEFAULT_REP_LOG_CAPACITY)
    }
}

/// Summary of one completed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSummary {
    /// 1-based set number within the session
    pub set_number: u32,
    /// Exercise the set was performed under
    pub exercise: ExerciseKind,
    /// Reps completed in this set
    pub rep_count: u32,
    /// Mean per-rep form score
    pub mean_form_score: f32,
    /// Highest per-rep form score
    pub best_form_score: f32,
    /// Lowest per-rep form score
    pub worst_form_score: f32,
    /// Mean per-rep range of motion, degrees
    pub mean_rom_degrees: f32,
    /// Mean of the reps' mean concentric velocities, m/s
    pub mean_concentric_mps: f32,
    /// Fastest single concentric reading across the set, m/s
    pub peak_concentric_mps: f32,
    /// Velocity loss against baseline when the set ended
    pub final_velocity_loss: f32,
    /// Completion time of the first rep
    pub first_rep_at: Option<Timestamp>,
    /// Completion time of the last rep
    pub last_rep_at: Option<Timestamp>,
    /// Wall-clock time the summary was produced
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use repsense_vbt::RepVelocity;

    fn rep(number: u32, score: f32, rom: f32, mean_concentric: f32) -> RepEvent {
        RepEvent {
            rep_number: number,
            rom_degrees: rom,
            duration_secs: 2.0,
            eccentric_secs: 1.2,
            concentric_secs: 0.8,
            form_score: score,
            bar_path_deviation: 0.1,
            issues: Vec::new(),
            velocity: RepVelocity {
                mean_concentric_mps: mean_concentric,
                peak_concentric_mps: mean_concentric * 1.3,
                mean_eccentric_mps: mean_concentric * 0.5,
            },
            completed_at: Timestamp::new(i64::from(number) * 3, 0),
        }
    }

    #[test]
    fn test_log_evicts_oldest_beyond_capacity() {
        let mut log = RepLog::new(3);
        for n in 1..=5 {
            log.push(rep(n, 90.0, 100.0, 0.7));
        }
        assert_eq!(log.len(), 3);
        let numbers: Vec<u32> = log.iter().map(|r| r.rep_number).collect();
        assert_eq!(numbers, vec![3, 4, 5]);
        assert_eq!(log.latest().map(|r| r.rep_number), Some(5));
    }

    #[test]
    fn test_summarize_aggregates_reps() {
        let mut log = RepLog::default();
        log.push(rep(1, 100.0, 102.0, 0.70));
        log.push(rep(2, 90.0, 98.0, 0.65));
        log.push(rep(3, 80.0, 100.0, 0.60));

        let summary = log.summarize(2, ExerciseKind::BackSquat, 0.14);
        assert_eq!(summary.set_number, 2);
        assert_eq!(summary.rep_count, 3);
        assert_abs_diff_eq!(summary.mean_form_score, 90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(summary.best_form_score, 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(summary.worst_form_score, 80.0, epsilon = 1e-3);
        assert_abs_diff_eq!(summary.mean_rom_degrees, 100.0, epsilon = 1e-3);
        assert_abs_diff_eq!(summary.mean_concentric_mps, 0.65, epsilon = 1e-5);
        assert_abs_diff_eq!(summary.peak_concentric_mps, 0.91, epsilon = 1e-5);
        assert_abs_diff_eq!(summary.final_velocity_loss, 0.14);
        assert_eq!(summary.first_rep_at, Some(Timestamp::new(3, 0)));
        assert_eq!(summary.last_rep_at, Some(Timestamp::new(9, 0)));
    }

    #[test]
    fn test_empty_set_summarizes_to_zeroes() {
        let log = RepLog::default();
        let summary = log.summarize(1, ExerciseKind::Deadlift, 0.0);
        assert_eq!(summary.rep_count, 0);
        assert_eq!(summary.mean_form_score, 0.0);
        assert_eq!(summary.worst_form_score, 0.0);
        assert_eq!(summary.peak_concentric_mps, 0.0);
        assert!(summary.first_rep_at.is_none());
    }

    #[test]
    fn test_clear_empties_the_log() {
        let mut log = RepLog::new(8);
        log.push(rep(1, 95.0, 100.0, 0.7));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
    }
}
