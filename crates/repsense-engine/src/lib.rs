#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

//! # RepSense Session Engine
//!
//! Orchestration layer of the RepSense stack. Feeds pose frames through
//! rep counting, form analysis, and velocity tracking, then folds the
//! results into per-rep events, per-set summaries, and a shared live
//! snapshot.
//!
//! ## Features
//!
//! - **Five-phase rep counting** on a smoothed tracking angle
//! - **Per-rep form scoring** with distinct-issue aggregation
//! - **Velocity statistics** routed by movement phase
//! - **Fatigue monitoring** with an auto-stop recommendation
//! - **Event sinks** for reps, phase changes, set ends, and auto-stop
//! - **Shared live state** for concurrent readers
//!
//! ## Quick Start
//!
//! ```
//! use repsense_core::{PoseFrame, Timestamp};
//! use repsense_engine::prelude::*;
//!
//! let mut engine = SessionEngine::default();
//! engine.configure_by_name("back_squat", 1.8, 0.6)?;
//!
//! // An empty frame fails the validity gate and is skipped, not an error.
//! let frame = PoseFrame::new(Timestamp::from_secs_f64(0.0));
//! let outcome = engine.process_frame(&frame)?;
//! assert!(!outcome.accepted);
//! # Ok::<(), repsense_engine::EngineError>(())
//! ```

pub mod error;
pub mod events;
pub mod rep_counter;
pub mod session;
pub mod state;
pub mod summary;

// Errors
pub use error::{EngineError, EngineResult};

// Events and sinks
pub use events::{EngineEvent, EventSink, LogSink, RepEvent};

// Rep counting
pub use rep_counter::{
    AngleZones, CompletedRep, PhaseTransition, RepCounter, RepCounterConfig, RepUpdate,
};

// Session orchestration
pub use session::{FrameOutcome, SessionEngine, SessionEngineConfig, SessionEngineConfigBuilder};

// Live state and summaries
pub use state::{shared_live_state, LiveSnapshot, SharedLiveState};
pub use summary::{RepLog, SetSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient imports for engine consumers.
pub mod prelude {
    // Session orchestration
    pub use crate::session::{
        FrameOutcome, SessionEngine, SessionEngineConfig, SessionEngineConfigBuilder,
    };

    // Events and sinks
    pub use crate::events::{EngineEvent, EventSink, LogSink, RepEvent};

    // Rep counting
    pub use crate::rep_counter::{
        AngleZones, CompletedRep, PhaseTransition, RepCounter, RepCounterConfig, RepUpdate,
    };

    // Live state and summaries
    pub use crate::state::{shared_live_state, LiveSnapshot, SharedLiveState};
    pub use crate::summary::{RepLog, SetSummary};

    // Errors
    pub use crate::error::{EngineError, EngineResult};

    // Upstream building blocks
    pub use repsense_core::prelude::*;
    pub use repsense_form::prelude::*;
    pub use repsense_vbt::{
        Calibration, FatigueConfig, FatigueModel, FatigueStatus, RepVelocity, VelocityReading,
        VelocityTracker, VelocityTrackerConfig,
    };
}
