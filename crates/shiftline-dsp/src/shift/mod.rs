//! Frequency shifting by phase modulation.
//!
//! Each sample is multiplied by `cos θ(n)` where θ accumulates the shift
//! frequency. The accumulated phase ([`PhaseState`]) is carried from one block
//! to the next, so a signal processed in blocks matches the same signal
//! processed in one pass.
//!
//! | Mode | Shift | Phase |
//! |---|---|---|
//! | `Static` | `amplitude_hz` | `θ(n) = θ0 + 2π f n / fs` |
//! | `Dynamic` | `amplitude_hz · sin(2π mod_freq_hz · t)` | running sum of `2π f(t_n) / fs` |
//! | `FftBin` | `amplitude_hz`, rounded to whole bins | none (block-local) |

mod fft_bin;
mod phase;

pub use phase::PhaseState;

use crate::{Error, Result};
use fft_bin::FftBinRotator;
use shiftline_core::{SampleClock, ShiftMode, ShiftParameters};
use std::f64::consts::TAU;

/// Stateful frequency shifter for one stream.
pub struct FrequencyShifter {
    mode: ShiftMode,
    sample_rate: f64,
    block_size: usize,
    phase: PhaseState,
    rotator: Option<FftBinRotator>,
}

impl FrequencyShifter {
    /// Build a shifter, planning the FFT up front in bin-rotation mode.
    pub fn new(mode: ShiftMode, sample_rate: f64, block_size: usize) -> Result<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "sample rate must be positive, got {sample_rate}"
            )));
        }
        if block_size == 0 {
            return Err(Error::InvalidParameter("block size must be non-zero".into()));
        }

        let rotator = match mode {
            ShiftMode::FftBin => Some(FftBinRotator::new(block_size)),
            ShiftMode::Static | ShiftMode::Dynamic => None,
        };

        Ok(Self {
            mode,
            sample_rate,
            block_size,
            phase: PhaseState::default(),
            rotator,
        })
    }

    pub fn mode(&self) -> ShiftMode {
        self.mode
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Phase that the next block starts from.
    pub fn phase(&self) -> PhaseState {
        self.phase
    }

    pub fn set_phase(&mut self, phase: PhaseState) {
        self.phase = phase;
    }

    /// Zero the carried phase (stream restart).
    pub fn reset(&mut self) {
        self.phase.reset();
    }

    /// Shift one block.
    ///
    /// `clock` positions the block in absolute stream time; it is read, not
    /// advanced. Static and dynamic modes accept any length; bin rotation
    /// needs exactly `block_size` samples.
    pub fn process(
        &mut self,
        params: &ShiftParameters,
        clock: &SampleClock,
        input: &[f32],
        output: &mut [f32],
    ) -> Result<()> {
        if input.len() != output.len() {
            return Err(Error::InvalidParameter(format!(
                "input length {} does not match output length {}",
                input.len(),
                output.len()
            )));
        }

        match self.mode {
            ShiftMode::Static => self.shift_static(params.amplitude_hz as f64, input, output),
            ShiftMode::Dynamic => self.shift_dynamic(params, clock, input, output),
            ShiftMode::FftBin => {
                let block_size = self.block_size;
                let sample_rate = self.sample_rate;
                let rotator = self.rotator.as_mut().ok_or_else(|| {
                    Error::InvalidParameter("bin rotation was not planned".into())
                })?;
                if input.len() != block_size {
                    return Err(Error::InvalidParameter(format!(
                        "bin rotation needs blocks of {block_size} samples, got {}",
                        input.len()
                    )));
                }
                rotator.process(params.amplitude_hz as f64, sample_rate, input, output);
            }
        }
        Ok(())
    }

    fn shift_static(&mut self, shift_hz: f64, input: &[f32], output: &mut [f32]) {
        let step = TAU * shift_hz / self.sample_rate;
        let start = self.phase.radians();

        for (n, (x, y)) in input.iter().zip(output.iter_mut()).enumerate() {
            let theta = start + step * n as f64;
            *y = (*x as f64 * theta.cos()) as f32;
        }

        self.phase.store(start + step * input.len() as f64);
    }

    fn shift_dynamic(
        &mut self,
        params: &ShiftParameters,
        clock: &SampleClock,
        input: &[f32],
        output: &mut [f32],
    ) {
        let depth = TAU * params.amplitude_hz as f64 / self.sample_rate;
        let rate = TAU * params.mod_freq_hz as f64;
        let mut theta = self.phase.radians();

        for (n, (x, y)) in input.iter().zip(output.iter_mut()).enumerate() {
            theta += depth * (rate * clock.time_at(n)).sin();
            *y = (*x as f64 * theta.cos()) as f32;
        }

        self.phase.store(theta);
    }
}
