//! Shared live session state.
//!
//! The engine refreshes one [`LiveSnapshot`] behind a read-write lock
//! after every processed frame. UI layers hold a [`SharedLiveState`]
//! clone and read at their own cadence without touching the engine.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use repsense_core::{RepPhase, Timestamp};
use repsense_form::{ExerciseKind, FormIssue};
use repsense_vbt::FatigueStatus;

/// Point-in-time view of the session for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSnapshot {
    /// Identifier of the configured session
    pub session_id: Uuid,
    /// Active exercise, `None` before configuration
    pub exercise: Option<ExerciseKind>,
    /// Current movement phase
    pub phase: RepPhase,
    /// Reps completed this session
    pub rep_count: u32,
    /// 1-based current set number, zero before configuration
    pub set_number: u32,
    /// Smoothed tracking angle, degrees
    pub smoothed_angle: Option<f32>,
    /// Tracking angle of the latest analyzed frame, degrees
    pub rom_degrees: f32,
    /// Form score of the latest analyzed frame
    pub form_score: f32,
    /// Issues detected on the latest analyzed frame
    pub active_issues: Vec<FormIssue>,
    /// Rolling bar-path deviation in 0..1
    pub bar_path_deviation: f32,
    /// Smoothed velocity, m/s
    pub velocity_mps: f32,
    /// Mean concentric velocity of the latest rep this set, m/s
    pub last_concentric_mps: f32,
    /// Fastest concentric reading of the session, m/s
    pub peak_concentric_mps: f32,
    /// Current fatigue assessment
    pub fatigue: FatigueStatus,
    /// Timestamp of the frame this snapshot reflects
    pub updated_at: Option<Timestamp>,
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self {
            session_id: Uuid::nil(),
            exercise: None,
            phase: RepPhase::Idle,
            rep_count: 0,
            set_number: 0,
            smoothed_angle: None,
            rom_degrees: 0.0,
            form_score: 0.0,
            active_issues: Vec::new(),
            bar_path_deviation: 0.0,
            velocity_mps: 0.0,
            last_concentric_mps: 0.0,
            peak_concentric_mps: 0.0,
            fatigue: FatigueStatus::neutral(),
            updated_at: None,
        }
    }
}

/// Handle shared between the engine and its readers.
pub type SharedLiveState = Arc<RwLock<LiveSnapshot>>;

/// Creates a fresh shared state handle with a default snapshot.
#[must_use]
pub fn shared_live_state() -> SharedLiveState {
    Arc::new(RwLock::new(LiveSnapshot::default()))
}
