//! Builder for configuring and constructing a `ShiftEngine`.

use crate::{Result, ShiftEngine};
use shiftline_core::{FilterFamily, ShiftConfig, ShiftMode, UnderrunFallback};
use std::path::Path;

/// Starts from [`ShiftConfig::default`] (44.1 kHz, 4096-sample blocks, order-3
/// FIR at 1 kHz, dynamic shift of 500 Hz swept at 2 Hz).
///
/// # Example
///
/// ```
/// use shiftline::prelude::*;
///
/// let engine = ShiftEngine::builder()
///     .sample_rate(48_000)
///     .block_size(1_024)
///     .filter(FilterFamily::Iir, 6)
///     .cutoff(2_000.0)
///     .static_shift(300.0)
///     .build()
///     .unwrap();
///
/// assert_eq!(engine.parameters().snapshot().amplitude_hz, 300.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ShiftEngineBuilder {
    config: ShiftConfig,
}

impl ShiftEngineBuilder {
    /// Replace the whole configuration.
    pub fn config(mut self, config: ShiftConfig) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.config(ShiftConfig::from_path(path)?))
    }

    /// Default: 44100
    pub fn sample_rate(mut self, hz: u32) -> Self {
        self.config.sample_rate_hz = hz;
        self
    }

    /// Default: 4096
    pub fn block_size(mut self, samples: usize) -> Self {
        self.config.block_size = samples;
        self
    }

    pub fn filter(mut self, family: FilterFamily, order: usize) -> Self {
        self.config.filter_family = family;
        self.config.filter_order = order;
        self
    }

    /// Initial anti-aliasing cutoff. Nyquist disables the filter.
    pub fn cutoff(mut self, hz: f32) -> Self {
        self.config.initial_cutoff_hz = hz;
        self
    }

    /// Constant shift.
    pub fn static_shift(mut self, hz: f32) -> Self {
        self.config.shift_mode = ShiftMode::Static;
        self.config.initial_amplitude_hz = hz;
        self
    }

    /// Shift swept as `amplitude_hz · sin(2π mod_freq_hz · t)`.
    pub fn dynamic(mut self, amplitude_hz: f32, mod_freq_hz: f32) -> Self {
        self.config.shift_mode = ShiftMode::Dynamic;
        self.config.initial_amplitude_hz = amplitude_hz;
        self.config.initial_mod_freq_hz = mod_freq_hz;
        self
    }

    /// Whole-bin spectrum rotation by `hz`.
    pub fn fft_bin(mut self, hz: f32) -> Self {
        self.config.shift_mode = ShiftMode::FftBin;
        self.config.initial_amplitude_hz = hz;
        self
    }

    pub fn underrun_fallback(mut self, fallback: UnderrunFallback) -> Self {
        self.config.underrun_fallback = fallback;
        self
    }

    pub fn input_device(mut self, index: usize) -> Self {
        self.config.input_device = Some(index);
        self
    }

    pub fn output_device(mut self, index: usize) -> Self {
        self.config.output_device = Some(index);
        self
    }

    pub fn build(self) -> Result<ShiftEngine> {
        ShiftEngine::new(self.config)
    }
}
