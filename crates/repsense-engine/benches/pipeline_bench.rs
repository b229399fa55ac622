//! Performance benchmarks for the session engine frame pipeline.
//!
//! Run with: cargo bench --package repsense-engine
//!
//! Benchmarks cover:
//! - Steady-state frame processing
//! - Full rep cycles at various dwell lengths
//! - The invalid-frame fast path
//! - Set summarization and live snapshot reads

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use repsense_core::{Confidence, JointName, Keypoint, PoseFrame, Timestamp};
use repsense_engine::{RepEvent, RepLog, SessionEngine};
use repsense_form::ExerciseKind;
use repsense_vbt::{Calibration, RepVelocity};

// =============================================================================
// Test Data Generators
// =============================================================================

/// Side-on squat frame with the left ankle placed for an exact knee angle.
fn squat_frame(knee_angle_deg: f32, hip_y: f32, secs: f64) -> PoseFrame {
    let c = Confidence::new(0.9).unwrap();
    let mut frame = PoseFrame::new(Timestamp::from_secs_f64(secs));

    let theta = knee_angle_deg.to_radians();
    let left_ankle = (0.4 + 0.2 * theta.sin(), 0.5 - 0.2 * theta.cos());

    let points = [
        (JointName::Neck, 0.5, 0.12),
        (JointName::LeftShoulder, 0.45, 0.12),
        (JointName::RightShoulder, 0.6, 0.1),
        (JointName::LeftHip, 0.4, hip_y),
        (JointName::RightHip, 0.6, 0.3),
        (JointName::LeftKnee, 0.4, 0.5),
        (JointName::RightKnee, 0.6, 0.5),
        (JointName::LeftAnkle, left_ankle.0, left_ankle.1),
        (JointName::RightAnkle, 0.6, 0.7),
    ];
    for (joint, x, y) in points {
        frame.set_keypoint(Keypoint::new(joint, x, y, c));
    }
    frame
}

/// One full rep at 30 fps, dwelling the given number of frames at each
/// waypoint, with a gently moving hip so velocity tracking stays busy.
fn rep_cycle(frames_per_waypoint: usize) -> Vec<PoseFrame> {
    let waypoints = [170.0_f32, 140.0, 70.0, 140.0, 170.0];
    let mut frames = Vec::with_capacity(waypoints.len() * frames_per_waypoint);
    let mut index = 0usize;

    for &angle in &waypoints {
        for _ in 0..frames_per_waypoint {
            let hip_y = 0.3 + 0.05 * (index as f32 * 0.3).sin();
            frames.push(squat_frame(angle, hip_y, index as f64 / 30.0));
            index += 1;
        }
    }
    frames
}

fn configured_engine() -> SessionEngine {
    let mut engine = SessionEngine::default();
    engine.configure(ExerciseKind::BackSquat, Calibration::default());
    engine
}

fn synthetic_rep(number: u32) -> RepEvent {
    RepEvent {
        rep_number: number,
        rom_degrees: 95.0 + (number % 5) as f32,
        duration_secs: 2.1,
        eccentric_secs: 1.3,
        concentric_secs: 0.8,
        form_score: 90.0,
        bar_path_deviation: 0.08,
        issues: Vec::new(),
        velocity: RepVelocity {
            mean_concentric_mps: 0.62,
            peak_concentric_mps: 0.84,
            mean_eccentric_mps: 0.41,
        },
        completed_at: Timestamp::new(i64::from(number) * 3, 0),
    }
}

// =============================================================================
// Frame Pipeline Benchmarks
// =============================================================================

fn bench_process_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_frame");

    // Steady state: the athlete holds the top position.
    let mut steady = configured_engine();
    let top = squat_frame(170.0, 0.3, 0.0);
    group.throughput(Throughput::Elements(1));
    group.bench_function("steady_top", |b| {
        b.iter(|| steady.process_frame(black_box(&top)).unwrap())
    });

    // Full rep cycles at different dwell lengths.
    for dwell in [3usize, 5, 8] {
        let frames = rep_cycle(dwell);

        group.throughput(Throughput::Elements(frames.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("full_rep", format!("{}f_dwell", dwell)),
            &frames,
            |b, frames| {
                b.iter(|| {
                    let mut engine = configured_engine();
                    for frame in frames {
                        black_box(engine.process_frame(black_box(frame)).unwrap());
                    }
                    engine.rep_count()
                })
            },
        );
    }

    // The validity-gate fast path.
    let mut gate = configured_engine();
    let empty = PoseFrame::new(Timestamp::from_secs_f64(0.0));
    group.throughput(Throughput::Elements(1));
    group.bench_function("rejected_frame", |b| {
        b.iter(|| gate.process_frame(black_box(&empty)).unwrap())
    });

    group.finish();
}

// =============================================================================
// Summary and Snapshot Benchmarks
// =============================================================================

fn bench_set_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_summary");

    for rep_count in [5u32, 20, 50] {
        let mut log = RepLog::new(256);
        for n in 1..=rep_count {
            log.push(synthetic_rep(n));
        }

        group.throughput(Throughput::Elements(u64::from(rep_count)));
        group.bench_with_input(
            BenchmarkId::new("summarize", format!("{}_reps", rep_count)),
            &log,
            |b, log| b.iter(|| log.summarize(1, ExerciseKind::BackSquat, black_box(0.1))),
        );
    }

    // Concurrent-reader view of the live state.
    let mut engine = configured_engine();
    for frame in rep_cycle(5) {
        let _ = engine.process_frame(&frame);
    }

    group.bench_function("snapshot_read", |b| b.iter(|| black_box(engine.snapshot())));

    group.finish();
}

// =============================================================================
// Criterion Groups and Main
// =============================================================================

criterion_group!(
    name = frame_benches;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_millis(500))
        .measurement_time(std::time::Duration::from_secs(2));
    targets = bench_process_frame
);

criterion_group!(
    name = summary_benches;
    config = Criterion::default()
        .warm_up_time(std::time::Duration::from_millis(300))
        .measurement_time(std::time::Duration::from_secs(1));
    targets = bench_set_summary
);

criterion_main!(frame_benches, summary_benches);
