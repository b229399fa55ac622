//! Session orchestration.
//!
//! [`SessionEngine`] wires the whole pipeline together: frames pass the
//! validity gate, drive the rep state machine, and fan out to form
//! analysis and velocity tracking; completed reps feed the fatigue
//! model; everything noteworthy is dispatched to the registered sinks
//! and mirrored into the shared live snapshot.

use std::mem;

use uuid::Uuid;

use repsense_core::{PhaseListener, PoseFrame, RepPhase, Resettable, Timestamp};
use repsense_form::{
    ExerciseFormProfile, ExerciseKind, FormAnalysisResult, FormAnalyzer, FormAnalyzerConfig,
    FormIssue,
};
use repsense_vbt::{
    Calibration, FatigueConfig, FatigueModel, FatigueStatus, VelocityReading, VelocityTracker,
    VelocityTrackerConfig,
};

use crate::error::{EngineError, EngineResult};
use crate::events::{EngineEvent, EventSink, RepEvent};
use crate::rep_counter::{AngleZones, CompletedRep, RepCounter, RepCounterConfig};
use crate::state::{shared_live_state, LiveSnapshot, SharedLiveState};
use crate::summary::{RepLog, SetSummary, DEFAULT_REP_LOG_CAPACITY};

/// Aggregate configuration for a session engine.
#[derive(Debug, Clone)]
pub struct SessionEngineConfig {
    /// Rep counter settings
    pub counter: RepCounterConfig,
    /// Form analyzer settings
    pub analyzer: FormAnalyzerConfig,
    /// Velocity tracker settings. The resistance modifier is
    /// overwritten from the exercise profile at configure time.
    pub velocity: VelocityTrackerConfig,
    /// Fatigue model settings
    pub fatigue: FatigueConfig,
    /// Reps retained per set
    pub rep_log_capacity: usize,
}

impl Default for SessionEngineConfig {
    fn default() -> Self {
        Self {
            counter: RepCounterConfig::default(),
            analyzer: FormAnalyzerConfig::default(),
            velocity: VelocityTrackerConfig::default(),
            fatigue: FatigueConfig::default(),
            rep_log_capacity: DEFAULT_REP_LOG_CAPACITY,
        }
    }
}

impl SessionEngineConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SessionEngineConfigBuilder {
        SessionEngineConfigBuilder::default()
    }
}

/// Builder for [`SessionEngineConfig`].
#[derive(Debug, Default)]
pub struct SessionEngineConfigBuilder {
    config: SessionEngineConfig,
}

impl SessionEngineConfigBuilder {
    /// Set the rep counter configuration.
    pub fn counter(mut self, counter: RepCounterConfig) -> Self {
        self.config.counter = counter;
        self
    }

    /// Set the form analyzer configuration.
    pub fn analyzer(mut self, analyzer: FormAnalyzerConfig) -> Self {
        self.config.analyzer = analyzer;
        self
    }

    /// Set the velocity tracker configuration.
    pub fn velocity(mut self, velocity: VelocityTrackerConfig) -> Self {
        self.config.velocity = velocity;
        self
    }

    /// Set the fatigue model configuration.
    pub fn fatigue(mut self, fatigue: FatigueConfig) -> Self {
        self.config.fatigue = fatigue;
        self
    }

    /// Set the per-set rep log capacity.
    pub fn rep_log_capacity(mut self, capacity: usize) -> Self {
        self.config.rep_log_capacity = capacity.max(1);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SessionEngineConfig {
        self.config
    }
}

/// Per-frame outputs in one bundle.
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// Whether the frame passed the validity gate and produced a
    /// tracking angle
    pub accepted: bool,
    /// Phase after this frame
    pub phase: RepPhase,
    /// Smoothed tracking angle, when the frame was accepted
    pub smoothed_angle: Option<f32>,
    /// Form analysis of this frame
    pub form: FormAnalysisResult,
    /// Velocity reading of this frame, if one was produced
    pub velocity: Option<VelocityReading>,
    /// The rep this frame completed, if any
    pub completed_rep: Option<RepEvent>,
    /// Fatigue assessment after this frame
    pub fatigue: FatigueStatus,
}

impl FrameOutcome {
    fn skipped(phase: RepPhase, fatigue: FatigueStatus) -> Self {
        Self {
            accepted: false,
            phase,
            smoothed_angle: None,
            form: FormAnalysisResult::neutral(),
            velocity: None,
            completed_rep: None,
            fatigue,
        }
    }
}

/// The configured exercise with its state machine.
struct ActiveExercise {
    profile: ExerciseFormProfile,
    counter: RepCounter,
}

/// Real-time repetition analysis engine for one athlete session.
pub struct SessionEngine {
    config: SessionEngineConfig,
    session_id: Uuid,
    active: Option<ActiveExercise>,
    analyzer: FormAnalyzer,
    tracker: VelocityTracker,
    fatigue: FatigueModel,
    log: RepLog,
    sets: Vec<SetSummary>,
    set_number: u32,
    auto_stop_fired: bool,
    /// Form scores accumulated since the current rep attempt began.
    score_sum: f32,
    score_frames: u32,
    /// Bar-path deviations accumulated over the same frames.
    bar_sum: f32,
    /// Distinct issues observed during the current rep attempt.
    rep_issues: Vec<FormIssue>,
    sinks: Vec<Box<dyn EventSink>>,
    live: SharedLiveState,
}

impl SessionEngine {
    /// Creates an unconfigured engine.
    #[must_use]
    pub fn new(config: SessionEngineConfig) -> Self {
        Self {
            analyzer: FormAnalyzer::new(config.analyzer.clone()),
            tracker: VelocityTracker::new(config.velocity.clone(), Calibration::default()),
            fatigue: FatigueModel::new(config.fatigue),
            log: RepLog::new(config.rep_log_capacity),
            config,
            session_id: Uuid::nil(),
            active: None,
            sets: Vec::new(),
            set_number: 0,
            auto_stop_fired: false,
            score_sum: 0.0,
            score_frames: 0,
            bar_sum: 0.0,
            rep_issues: Vec::new(),
            sinks: Vec::new(),
            live: shared_live_state(),
        }
    }

    /// Registers an event sink.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Configures the session for an exercise, resetting every piece of
    /// state including the session rep count.
    pub fn configure(&mut self, exercise: ExerciseKind, calibration: Calibration) {
        let profile = ExerciseFormProfile::for_exercise(exercise);
        let zones = AngleZones::new(
            profile.top_angle_degrees,
            profile.bottom_angle_degrees,
            &self.config.counter,
        );

        let mut velocity_config = self.config.velocity.clone();
        velocity_config.velocity_modifier = profile.resistance.velocity_modifier();

        self.session_id = Uuid::new_v4();
        self.analyzer = FormAnalyzer::new(self.config.analyzer.clone());
        self.analyzer.set_profile(profile.clone());
        self.tracker = VelocityTracker::new(velocity_config, calibration);
        self.fatigue = FatigueModel::new(self.config.fatigue);
        self.log = RepLog::new(self.config.rep_log_capacity);
        self.sets.clear();
        self.set_number = 1;
        self.auto_stop_fired = false;
        self.score_sum = 0.0;
        self.score_frames = 0;
        self.bar_sum = 0.0;
        self.rep_issues.clear();
        self.active = Some(ActiveExercise {
            counter: RepCounter::new(zones, self.config.counter.clone()),
            profile,
        });

        tracing::info!(session_id = %self.session_id, exercise = %exercise, "Session configured");
        self.refresh_live(RepPhase::Idle, None, &FormAnalysisResult::neutral(), None);
    }

    /// Configures by exercise name with an on-the-spot calibration.
    pub fn configure_by_name(
        &mut self,
        name: &str,
        body_height_m: f32,
        vertical_extent: f32,
    ) -> EngineResult<()> {
        let exercise: ExerciseKind = name.parse()?;
        let calibration = Calibration::from_body_height(body_height_m, vertical_extent)?;
        self.configure(exercise, calibration);
        Ok(())
    }

    /// Processes one pose frame through the whole pipeline.
    ///
    /// Frames failing the validity gate, and valid frames whose
    /// tracking angle cannot be measured, are skipped without touching
    /// any analysis state.
    pub fn process_frame(&mut self, frame: &PoseFrame) -> EngineResult<FrameOutcome> {
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NotConfigured);
        };

        if !frame.is_valid() {
            tracing::trace!("Frame rejected by the validity gate");
            return Ok(FrameOutcome::skipped(
                active.counter.phase(),
                self.fatigue.status(),
            ));
        }
        let Some(raw_angle) = active.profile.tracking_angle.measure(frame) else {
            tracing::trace!("Tracking angle unavailable on a valid frame");
            return Ok(FrameOutcome::skipped(
                active.counter.phase(),
                self.fatigue.status(),
            ));
        };

        let update = active.counter.update(raw_angle, frame.timestamp);

        if let Some(transition) = update.transition {
            self.tracker.phase_changed(transition.to, frame.timestamp);
            if transition.from == RepPhase::AtTop && transition.to == RepPhase::Descending {
                // A new rep attempt: per-rep accumulation restarts.
                self.score_sum = 0.0;
                self.score_frames = 0;
                self.bar_sum = 0.0;
                self.rep_issues.clear();
            }
            dispatch_event(
                &self.sinks,
                &EngineEvent::PhaseChanged {
                    from: transition.from,
                    to: transition.to,
                    at: frame.timestamp,
                },
            );
        }

        let form = self.analyzer.analyze(frame);
        self.score_sum += form.score;
        self.score_frames += 1;
        self.bar_sum += form.bar_path_deviation;
        for issue in &form.issues {
            if !self.rep_issues.iter().any(|known| known.name == issue.name) {
                self.rep_issues.push(issue.clone());
            }
        }

        let velocity = match frame.keypoint(active.profile.velocity_joint) {
            Some(kp) => self.tracker.process(kp, frame.timestamp),
            None => None,
        };

        let completed_rep = update.completed.map(|rep| self.finish_rep(rep));

        let fatigue = self.fatigue.status();
        if fatigue.should_auto_stop && !self.auto_stop_fired {
            self.auto_stop_fired = true;
            tracing::warn!(
                velocity_loss = fatigue.velocity_loss,
                "Velocity loss crossed the auto-stop threshold"
            );
            dispatch_event(
                &self.sinks,
                &EngineEvent::AutoStopTriggered {
                    status: fatigue,
                    at: frame.timestamp,
                },
            );
        }

        self.refresh_live(
            update.phase,
            Some(update.smoothed_angle),
            &form,
            Some(frame.timestamp),
        );

        Ok(FrameOutcome {
            accepted: true,
            phase: update.phase,
            smoothed_angle: Some(update.smoothed_angle),
            form,
            velocity,
            completed_rep,
            fatigue,
        })
    }

    /// Ends the current set and summarizes it.
    ///
    /// Velocity state, the bar path, per-rep accumulation, and the
    /// fatigue trend reset; the session rep count, the velocity
    /// baseline, and the session peak carry over to the next set.
    pub fn end_set(&mut self) -> EngineResult<SetSummary> {
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NotConfigured);
        };

        let final_loss = self.fatigue.status().velocity_loss;
        let summary = self
            .log
            .summarize(self.set_number, active.profile.exercise, final_loss);

        active.counter.end_set();
        self.analyzer.reset();
        self.tracker.reset();
        self.fatigue.reset_set();
        self.log.clear();
        self.rep_issues.clear();
        self.score_sum = 0.0;
        self.score_frames = 0;
        self.bar_sum = 0.0;
        self.auto_stop_fired = false;

        self.sets.push(summary.clone());
        self.set_number += 1;

        tracing::info!(
            set = summary.set_number,
            reps = summary.rep_count,
            "Set ended"
        );
        dispatch_event(&self.sinks, &EngineEvent::SetEnded {
            summary: summary.clone(),
        });
        self.refresh_live(RepPhase::Idle, None, &FormAnalysisResult::neutral(), None);

        Ok(summary)
    }

    /// Clears the rolling bar-path window without ending the set.
    pub fn reset_bar_path(&mut self) {
        self.analyzer.reset_bar_path();
    }

    /// Identifier of the configured session, nil before configuration.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The configured exercise, if any.
    #[must_use]
    pub fn exercise(&self) -> Option<ExerciseKind> {
        self.active.as_ref().map(|a| a.profile.exercise)
    }

    /// Whether an exercise has been configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.active.is_some()
    }

    /// Current movement phase.
    #[must_use]
    pub fn phase(&self) -> RepPhase {
        self.active
            .as_ref()
            .map_or(RepPhase::Idle, |a| a.counter.phase())
    }

    /// Reps completed this session, across sets.
    #[must_use]
    pub fn rep_count(&self) -> u32 {
        self.active.as_ref().map_or(0, |a| a.counter.rep_count())
    }

    /// 1-based current set number, zero before configuration.
    #[must_use]
    pub fn set_number(&self) -> u32 {
        self.set_number
    }

    /// Current fatigue assessment.
    #[must_use]
    pub fn fatigue_status(&self) -> FatigueStatus {
        self.fatigue.status()
    }

    /// Summaries of the sets ended so far.
    #[must_use]
    pub fn set_summaries(&self) -> &[SetSummary] {
        &self.sets
    }

    /// The current set's rep log.
    #[must_use]
    pub fn rep_log(&self) -> &RepLog {
        &self.log
    }

    /// Handle to the shared live snapshot for external readers.
    #[must_use]
    pub fn live_state(&self) -> SharedLiveState {
        SharedLiveState::clone(&self.live)
    }

    /// Copy of the current live snapshot.
    #[must_use]
    pub fn snapshot(&self) -> LiveSnapshot {
        self.live.read().clone()
    }

    /// Enriches a counted rep with form and velocity statistics,
    /// records it, and announces it.
    fn finish_rep(&mut self, rep: CompletedRep) -> RepEvent {
        let (form_score, bar_path_deviation) = if self.score_frames == 0 {
            (0.0, 0.0)
        } else {
            let frames = self.score_frames as f32;
            (self.score_sum / frames, self.bar_sum / frames)
        };

        let event = RepEvent {
            rep_number: rep.rep_number,
            rom_degrees: rep.rom_degrees,
            duration_secs: rep.duration_secs,
            eccentric_secs: rep.eccentric_secs,
            concentric_secs: rep.concentric_secs,
            form_score,
            bar_path_deviation,
            issues: mem::take(&mut self.rep_issues),
            velocity: self.tracker.complete_rep(),
            completed_at: rep.completed_at,
        };

        self.fatigue.record_rep(&event.velocity);
        self.log.push(event.clone());
        dispatch_event(&self.sinks, &EngineEvent::RepCompleted {
            rep: event.clone(),
        });
        event
    }

    fn refresh_live(
        &self,
        phase: RepPhase,
        smoothed_angle: Option<f32>,
        form: &FormAnalysisResult,
        at: Option<Timestamp>,
    ) {
        let mut live = self.live.write();
        live.session_id = self.session_id;
        live.exercise = self.exercise();
        live.phase = phase;
        live.rep_count = self.rep_count();
        live.set_number = self.set_number;
        live.smoothed_angle = smoothed_angle;
        live.rom_degrees = form.rom_degrees;
        live.form_score = form.score;
        live.active_issues = form.issues.clone();
        live.bar_path_deviation = self.analyzer.bar_path_deviation();
        live.velocity_mps = self.tracker.current_velocity_mps();
        live.last_concentric_mps = self
            .log
            .latest()
            .map_or(0.0, |rep| rep.velocity.mean_concentric_mps);
        live.peak_concentric_mps = self.fatigue.session_peak_mps();
        live.fatigue = self.fatigue.status();
        live.updated_at = at;
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(SessionEngineConfig::default())
    }
}

/// Delivers one event to every sink, logging failures without
/// propagating them.
fn dispatch_event(sinks: &[Box<dyn EventSink>], event: &EngineEvent) {
    tracing::debug!(event = event.event_type(), "Dispatching event");
    for sink in sinks {
        if let Err(error) = sink.on_event(event) {
            tracing::warn!(sink = sink.name(), error = %error, "Event sink failed");
        }
    }
}
