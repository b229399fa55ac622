//! Engine events and sink delivery.
//!
//! Everything noteworthy the engine does is announced as an
//! [`EngineEvent`] to every registered [`EventSink`]. Sinks are the
//! integration seam for UI layers, websocket fan-out, or persistence;
//! a failing sink is logged and skipped, never allowed to stall frame
//! processing.

use serde::{Deserialize, Serialize};

use repsense_core::{RepPhase, Timestamp};
use repsense_form::FormIssue;
use repsense_vbt::{FatigueStatus, RepVelocity};

use crate::error::EngineError;
use crate::summary::SetSummary;

/// A fully described completed repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    /// 1-based rep number within the session
    pub rep_number: u32,
    /// Range of motion covered by this rep, in degrees
    pub rom_degrees: f32,
    /// Time from leaving the top to returning to it, in seconds
    pub duration_secs: f64,
    /// Lowering time, from leaving the top to leaving the bottom
    pub eccentric_secs: f64,
    /// Lifting time, from leaving the bottom to re-entering the top
    pub concentric_secs: f64,
    /// Mean form score over the rep's frames, in [0, 100]
    pub form_score: f32,
    /// Mean bar-path deviation over the rep's frames, in [0, 1]
    pub bar_path_deviation: f32,
    /// Distinct issues observed during the rep
    pub issues: Vec<FormIssue>,
    /// Velocity statistics for the rep
    pub velocity: RepVelocity,
    /// Frame timestamp of the completing transition
    pub completed_at: Timestamp,
}

/// Everything the engine announces to its sinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A repetition completed.
    RepCompleted {
        /// The completed rep
        rep: RepEvent,
    },

    /// The movement phase changed.
    PhaseChanged {
        /// Phase before the transition
        from: RepPhase,
        /// Phase after the transition
        to: RepPhase,
        /// Frame timestamp of the transition
        at: Timestamp,
    },

    /// A set ended and was summarized.
    SetEnded {
        /// The finished set
        summary: SetSummary,
    },

    /// Velocity loss crossed the auto-stop threshold.
    AutoStopTriggered {
        /// Fatigue assessment at the moment of crossing
        status: FatigueStatus,
        /// Frame timestamp of the crossing
        at: Timestamp,
    },
}

impl EngineEvent {
    /// Stable identifier used in logs and wire messages.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RepCompleted { .. } => "rep_completed",
            Self::PhaseChanged { .. } => "phase_changed",
            Self::SetEnded { .. } => "set_ended",
            Self::AutoStopTriggered { .. } => "auto_stop_triggered",
        }
    }
}

/// Receiver for engine events.
pub trait EventSink: Send + Sync {
    /// Sink name, used when logging delivery failures.
    fn name(&self) -> &str;

    /// Handles one event.
    fn on_event(&self, event: &EngineEvent) -> Result<(), EngineError>;
}

/// Sink that forwards events to the tracing subscriber.
pub struct LogSink;

impl EventSink for LogSink {
    fn name(&self) -> &str {
        "log"
    }

    fn on_event(&self, event: &EngineEvent) -> Result<(), EngineError> {
        match event {
            EngineEvent::RepCompleted { rep } => {
                tracing::info!(
                    rep = rep.rep_number,
                    rom_degrees = rep.rom_degrees,
                    form_score = rep.form_score,
                    mean_concentric_mps = rep.velocity.mean_concentric_mps,
                    "Rep completed"
                );
            }
            EngineEvent::PhaseChanged { from, to, .. } => {
                tracing::debug!(from = %from, to = %to, "Phase changed");
            }
            EngineEvent::SetEnded { summary } => {
                tracing::info!(
                    set = summary.set_number,
                    reps = summary.rep_count,
                    mean_form_score = summary.mean_form_score,
                    "Set ended"
                );
            }
            EngineEvent::AutoStopTriggered { status, .. } => {
                tracing::warn!(
                    velocity_loss = status.velocity_loss,
                    "Auto-stop threshold crossed"
                );
            }
        }
        Ok(())
    }
}
