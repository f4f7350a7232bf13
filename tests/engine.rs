//! Threaded engine tests
//!
//! Runs the engine on its audio thread between in-memory endpoints, so no
//! audio hardware is needed.

#[path = "helpers/mod.rs"]
mod helpers;

use helpers::{
    assert_has_audio, generate_sine, identity_config, wait_until, FailingSource, LoopingSource,
    SharedSink, SCENARIO_BLOCK_SIZE, SCENARIO_SAMPLE_RATE,
};
use shiftline::prelude::*;
use std::time::Duration;

const PACE: Duration = Duration::from_millis(1);

fn identity_engine() -> ShiftEngine {
    ShiftEngine::builder()
        .config(identity_config())
        .build()
        .expect("Failed to build engine")
}

fn tone() -> Vec<f32> {
    generate_sine(100.0, SCENARIO_SAMPLE_RATE as f64, SCENARIO_BLOCK_SIZE)
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = ShiftEngine::builder().block_size(0).build();
    assert!(matches!(
        result,
        Err(Error::Core(shiftline::core::Error::InvalidParameter(_)))
    ));

    let result = ShiftEngine::builder()
        .sample_rate(8_000)
        .cutoff(5_000.0)
        .build();
    assert!(result.is_err());

    let result = ShiftEngine::builder().filter(FilterFamily::Iir, 40).build();
    assert!(result.is_err());
}

#[test]
fn test_builder_sets_mode_and_parameters() {
    let engine = ShiftEngine::builder()
        .sample_rate(8_000)
        .block_size(256)
        .dynamic(750.0, 3.0)
        .cutoff(1_500.0)
        .underrun_fallback(UnderrunFallback::RepeatLast)
        .build()
        .unwrap();

    let config = engine.config();
    assert_eq!(config.shift_mode, ShiftMode::Dynamic);
    assert_eq!(config.underrun_fallback, UnderrunFallback::RepeatLast);
    assert_eq!(
        engine.parameters().snapshot(),
        ShiftParameters::new(750.0, 3.0, 1_500.0)
    );
    assert!(!engine.is_running());
    assert!(engine.metrics().is_none());
}

#[test]
fn test_start_with_runs_until_stopped() {
    let mut engine = identity_engine();
    let sink = SharedSink::default();

    engine
        .start_with(LoopingSource::new(tone(), PACE), sink.clone())
        .unwrap();
    assert!(engine.is_running());

    assert!(
        wait_until(2_000, || sink.samples().len() >= 5 * SCENARIO_BLOCK_SIZE),
        "engine produced no audio"
    );
    assert!(engine.metrics().unwrap().blocks_processed() >= 5);

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert!(sink.was_flushed());

    let out = sink.samples();
    assert_eq!(out.len() % SCENARIO_BLOCK_SIZE, 0);
    assert_has_audio(&out, 0.5);
}

#[test]
fn test_start_twice_is_rejected() {
    let mut engine = identity_engine();
    engine
        .start_with(LoopingSource::new(tone(), PACE), SharedSink::default())
        .unwrap();

    let second = engine.start_with(LoopingSource::new(tone(), PACE), SharedSink::default());
    assert!(matches!(second, Err(Error::InvalidState(_))));

    engine.stop().unwrap();

    // Startable again once stopped
    engine
        .start_with(LoopingSource::new(tone(), PACE), SharedSink::default())
        .unwrap();
    engine.stop().unwrap();
}

#[test]
fn test_parameters_shared_with_audio_thread() {
    let mut engine = identity_engine();
    let sink = SharedSink::default();
    engine
        .start_with(LoopingSource::new(vec![1.0; 10], PACE), sink.clone())
        .unwrap();

    assert!(wait_until(2_000, || !sink.samples().is_empty()));
    engine.parameters().set_amplitude(250.0);
    let handle = engine.handle().unwrap();
    assert_eq!(handle.parameters().snapshot().amplitude_hz, 250.0);

    // A constant input only stays constant while the shift is zero
    assert!(wait_until(2_000, || {
        sink.samples().iter().any(|s| (s - 1.0).abs() > 0.1)
    }));
    engine.stop().unwrap();
}

#[test]
fn test_device_error_surfaces_on_stop() {
    let mut engine = identity_engine();
    engine
        .start_with(FailingSource::new(tone(), 2), SharedSink::default())
        .unwrap();

    assert!(wait_until(2_000, || !engine.is_running()));
    let err = engine.stop().unwrap_err();
    assert!(err.is_device_error(), "unexpected error: {err}");
}

#[test]
fn test_drop_stops_engine() {
    let sink = SharedSink::default();
    {
        let mut engine = identity_engine();
        engine
            .start_with(LoopingSource::new(tone(), PACE), sink.clone())
            .unwrap();
        assert!(wait_until(2_000, || !sink.samples().is_empty()));
    }
    assert!(sink.was_flushed());
}
