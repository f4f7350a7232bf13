//! Test helpers and fixtures for shiftline integration tests
//!
//! Scripted capture/playback doubles and signal generators, so pipeline
//! behaviour can be driven one block at a time without audio hardware.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Exact operations (pass-through, identity shift)
//! - `DSP_EPSILON` (1e-4): DSP processing (filters, block-split comparisons)
//! - `PERCEPTUAL_EPSILON` (0.001): Perceptual equivalence (-60dB)
//! - `SILENCE_THRESHOLD` (0.0001): Silence detection (-80dB)

#![allow(dead_code)]

pub mod tolerances;

use shiftline::core::{AudioBlock, Capture, CaptureSource, PlaybackSink, Submit};
use shiftline::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Small deterministic stream: fs = 1000 Hz, 100-sample blocks.
pub const SCENARIO_SAMPLE_RATE: u32 = 1_000;
pub const SCENARIO_BLOCK_SIZE: usize = 100;

/// Static 0 Hz shift with the filter disabled (cutoff at Nyquist).
pub fn identity_config() -> ShiftConfig {
    ShiftConfig {
        sample_rate_hz: SCENARIO_SAMPLE_RATE,
        block_size: SCENARIO_BLOCK_SIZE,
        shift_mode: ShiftMode::Static,
        initial_amplitude_hz: 0.0,
        initial_mod_freq_hz: 0.0,
        initial_cutoff_hz: SCENARIO_SAMPLE_RATE as f32 / 2.0,
        ..Default::default()
    }
}

/// Started controller for `config`.
pub fn running_controller(config: ShiftConfig) -> PipelineController {
    let mut controller = PipelineController::new(config).expect("Failed to create controller");
    controller.start().expect("Failed to start controller");
    controller
}

/// Generate a test signal: sine wave at given frequency for specified samples.
pub fn generate_sine(frequency: f64, sample_rate: f64, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            (2.0 * std::f64::consts::PI * frequency * t).sin() as f32
        })
        .collect()
}

/// Generate white noise (random samples in -1..1).
pub fn generate_noise(num_samples: usize, seed: u64) -> Vec<f32> {
    // Simple LCG for reproducible "random" noise
    let mut rng = seed;
    (0..num_samples)
        .map(|_| {
            rng = rng.wrapping_mul(6364136223846793005).wrapping_add(1);
            ((rng >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect()
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

/// Check if two signals are approximately equal within tolerance.
pub fn signals_approx_equal(a: &[f32], b: &[f32], tolerance: f32) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tolerance)
}

/// Assert that a signal is approximately silent (all values near zero).
pub fn assert_silence(samples: &[f32], tolerance: f32) {
    let max = peak(samples);
    assert!(
        max <= tolerance,
        "Expected silence, but peak amplitude was {}",
        max
    );
}

/// Assert that a signal has content (not silent).
pub fn assert_has_audio(samples: &[f32], min_rms: f32) {
    let r = rms(samples);
    assert!(
        r >= min_rms,
        "Expected audio content with RMS >= {}, but RMS was {}",
        min_rms,
        r
    );
}

/// Capture source that fails with a device error on the given call.
pub struct FailingSource {
    inner: MemorySource,
    fail_at: usize,
    calls: usize,
}

impl FailingSource {
    pub fn new(signal: Vec<f32>, fail_at: usize) -> Self {
        Self {
            inner: MemorySource::new(signal),
            fail_at,
            calls: 0,
        }
    }
}

impl CaptureSource for FailingSource {
    fn next_block(
        &mut self,
        block: &mut AudioBlock,
        timeout: Duration,
    ) -> shiftline::core::Result<Capture> {
        let call = self.calls;
        self.calls += 1;
        if call == self.fail_at {
            return Err(shiftline::core::Error::Device("capture device unplugged".into()));
        }
        self.inner.next_block(block, timeout)
    }
}

/// Sink whose output stays readable after it has been moved to the audio thread.
#[derive(Clone, Default)]
pub struct SharedSink {
    samples: Arc<Mutex<Vec<f32>>>,
    flushed: Arc<Mutex<bool>>,
}

impl SharedSink {
    pub fn samples(&self) -> Vec<f32> {
        self.samples.lock().unwrap().clone()
    }

    pub fn was_flushed(&self) -> bool {
        *self.flushed.lock().unwrap()
    }
}

impl PlaybackSink for SharedSink {
    fn submit_block(&mut self, block: &AudioBlock) -> shiftline::core::Result<Submit> {
        self.samples.lock().unwrap().extend_from_slice(block);
        Ok(Submit::Accepted)
    }

    fn flush(&mut self) -> shiftline::core::Result<()> {
        *self.flushed.lock().unwrap() = true;
        Ok(())
    }
}

/// Capture source that never runs dry: loops over a signal, pacing blocks in real time.
pub struct LoopingSource {
    signal: Vec<f32>,
    cursor: usize,
    pace: Duration,
}

impl LoopingSource {
    pub fn new(signal: Vec<f32>, pace: Duration) -> Self {
        Self {
            signal,
            cursor: 0,
            pace,
        }
    }
}

impl CaptureSource for LoopingSource {
    fn next_block(
        &mut self,
        block: &mut AudioBlock,
        _timeout: Duration,
    ) -> shiftline::core::Result<Capture> {
        std::thread::sleep(self.pace);
        for sample in block.iter_mut() {
            *sample = self.signal[self.cursor % self.signal.len()];
            self.cursor += 1;
        }
        Ok(Capture::Ready)
    }
}

/// Poll until `condition` holds or `max_wait_ms` elapses.
pub fn wait_until(max_wait_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    let timeout = Duration::from_millis(max_wait_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}
