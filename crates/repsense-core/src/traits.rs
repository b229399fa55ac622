//! Core trait abstractions shared across the pipeline layers.
//!
//! Components communicate through explicit method calls only; these traits
//! name the two seams every layer agrees on: resetting rolling state and
//! receiving repetition-phase announcements.

use crate::types::{RepPhase, Timestamp};

/// A component holding rolling state that can be returned to its initial
/// configuration.
///
/// `reset` must clear every buffer in one call so a caller can rebuild the
/// whole pipeline without a partially-reset window.
pub trait Resettable {
    /// Clears all rolling state back to the just-configured condition.
    fn reset(&mut self);
}

/// Receiver of repetition-phase announcements.
///
/// The phase state machine owns phase decisions; downstream components
/// that need phase context (velocity buffering, for one) implement this
/// and are notified on every transition instead of sharing state.
pub trait PhaseListener {
    /// Called once per phase transition with the new phase and the frame
    /// time at which it occurred.
    fn phase_changed(&mut self, phase: RepPhase, at: Timestamp);
}
