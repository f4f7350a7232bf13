//! Stream configuration.

use crate::parameter::{ShiftParameters, MIN_CUTOFF_HZ};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const MIN_SAMPLE_RATE_HZ: u32 = 1_000;
pub const MAX_SAMPLE_RATE_HZ: u32 = 384_000;
pub const MAX_BLOCK_SIZE: usize = 65_536;
pub const MAX_FIR_ORDER: usize = 1_024;
/// Direct-form Butterworth sections lose precision quickly past this.
pub const MAX_IIR_ORDER: usize = 12;

/// Anti-aliasing filter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    /// Windowed-sinc, linear phase, no feedback.
    #[default]
    Fir,
    /// Butterworth, feedback path, steeper per order.
    Iir,
}

/// How the shift frequency is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Constant shift of `amplitude_hz`.
    Static,
    /// Shift of `amplitude_hz * sin(2π mod_freq_hz t)`.
    #[default]
    Dynamic,
    /// Spectrum rotation by whole FFT bins. Block-local, no phase continuity.
    FftBin,
}

/// What the controller emits when capture misses its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderrunFallback {
    #[default]
    Silence,
    RepeatLast,
}

/// Configuration for one shifting stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub sample_rate_hz: u32,
    pub block_size: usize,
    pub filter_order: usize,
    pub filter_family: FilterFamily,
    pub initial_cutoff_hz: f32,
    pub initial_amplitude_hz: f32,
    pub initial_mod_freq_hz: f32,
    pub shift_mode: ShiftMode,
    pub underrun_fallback: UnderrunFallback,
    /// Capture device index (`None` = host default).
    pub input_device: Option<usize>,
    /// Playback device index (`None` = host default).
    pub output_device: Option<usize>,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44_100,
            block_size: 4_096,
            filter_order: 3,
            filter_family: FilterFamily::Fir,
            initial_cutoff_hz: 1_000.0,
            initial_amplitude_hz: 500.0,
            initial_mod_freq_hz: 2.0,
            shift_mode: ShiftMode::Dynamic,
            underrun_fallback: UnderrunFallback::Silence,
            input_device: None,
            output_device: None,
        }
    }
}

impl ShiftConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_SAMPLE_RATE_HZ..=MAX_SAMPLE_RATE_HZ).contains(&self.sample_rate_hz) {
            return Err(Error::InvalidParameter(format!(
                "sample_rate_hz {} out of range ({MIN_SAMPLE_RATE_HZ}-{MAX_SAMPLE_RATE_HZ} Hz)",
                self.sample_rate_hz
            )));
        }

        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidParameter(format!(
                "block_size {} out of range (1-{MAX_BLOCK_SIZE})",
                self.block_size
            )));
        }

        let max_order = match self.filter_family {
            FilterFamily::Fir => MAX_FIR_ORDER,
            FilterFamily::Iir => MAX_IIR_ORDER,
        };
        if self.filter_order == 0 || self.filter_order > max_order {
            return Err(Error::InvalidParameter(format!(
                "filter_order {} out of range (1-{max_order}) for {:?}",
                self.filter_order, self.filter_family
            )));
        }

        let nyquist = self.nyquist_hz();
        if !self.initial_cutoff_hz.is_finite()
            || self.initial_cutoff_hz < MIN_CUTOFF_HZ
            || self.initial_cutoff_hz > nyquist
        {
            return Err(Error::InvalidParameter(format!(
                "initial_cutoff_hz {} out of range ({MIN_CUTOFF_HZ}-{nyquist} Hz)",
                self.initial_cutoff_hz
            )));
        }

        if !self.initial_amplitude_hz.is_finite() || self.initial_amplitude_hz < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "initial_amplitude_hz {} must be finite and non-negative",
                self.initial_amplitude_hz
            )));
        }

        if !self.initial_mod_freq_hz.is_finite() || self.initial_mod_freq_hz < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "initial_mod_freq_hz {} must be finite and non-negative",
                self.initial_mod_freq_hz
            )));
        }

        Ok(())
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate_hz as f64
    }

    pub fn nyquist_hz(&self) -> f32 {
        self.sample_rate_hz as f32 * 0.5
    }

    /// Real-time budget for one block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate())
    }

    pub fn initial_parameters(&self) -> ShiftParameters {
        ShiftParameters::new(
            self.initial_amplitude_hz,
            self.initial_mod_freq_hz,
            self.initial_cutoff_hz,
        )
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
