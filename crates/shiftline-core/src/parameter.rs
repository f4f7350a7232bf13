//! Control-rate shift parameters and the lock-free store that carries them
//! from a control surface to the audio thread.
//!
//! The control side writes whole snapshots (or patches one field); the audio
//! side reads one snapshot per block. Writes never fail: out-of-range values
//! are clamped.
//!
//! | Field | Range after clamping |
//! |---|---|
//! | `amplitude_hz` | `>= 0` (non-finite → 0) |
//! | `mod_freq_hz` | `>= 0` (non-finite → 0) |
//! | `cutoff_hz` | `[MIN_CUTOFF_HZ, nyquist]` (non-finite → nyquist) |
//!
//! A cutoff equal to Nyquist disables the anti-aliasing filter.
//!
//! # Example
//!
//! ```
//! use shiftline_core::{ParameterStore, ShiftParameters};
//!
//! let store = ParameterStore::new(ShiftParameters::new(500.0, 2.0, 1000.0), 44_100);
//! store.set_cutoff(90_000.0);
//! assert_eq!(store.snapshot().cutoff_hz, 22_050.0);
//! ```

use crate::ShiftConfig;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lowest accepted cutoff; anything at or below zero clamps here.
pub const MIN_CUTOFF_HZ: f32 = 1.0;

/// One self-consistent set of shift parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftParameters {
    /// Peak shift in Hz (the constant shift in static and FFT-bin modes).
    pub amplitude_hz: f32,
    /// Rate of the sinusoidal shift sweep in dynamic mode.
    pub mod_freq_hz: f32,
    /// Anti-aliasing lowpass cutoff.
    pub cutoff_hz: f32,
}

impl ShiftParameters {
    pub fn new(amplitude_hz: f32, mod_freq_hz: f32, cutoff_hz: f32) -> Self {
        Self {
            amplitude_hz,
            mod_freq_hz,
            cutoff_hz,
        }
    }

    /// Clamp every field into its documented range.
    pub fn clamped(self, nyquist_hz: f32) -> Self {
        Self {
            amplitude_hz: non_negative(self.amplitude_hz),
            mod_freq_hz: non_negative(self.mod_freq_hz),
            cutoff_hz: if self.cutoff_hz.is_finite() {
                self.cutoff_hz.clamp(MIN_CUTOFF_HZ, nyquist_hz)
            } else {
                nyquist_hz
            },
        }
    }

    /// Cutoff at (or above) Nyquist means no anti-aliasing filter.
    pub fn filter_disabled(&self, nyquist_hz: f32) -> bool {
        self.cutoff_hz >= nyquist_hz
    }
}

#[inline]
fn non_negative(value: f32) -> f32 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

/// Single-slot, last-write-wins parameter exchange.
///
/// Readers never lock: [`snapshot`](Self::snapshot) is an `ArcSwap` load and a
/// copy. Writers publish a fresh `Arc` and bump [`version`](Self::version).
#[derive(Debug)]
pub struct ParameterStore {
    current: ArcSwap<ShiftParameters>,
    version: AtomicU64,
    nyquist_hz: f32,
}

impl ParameterStore {
    pub fn new(initial: ShiftParameters, sample_rate_hz: u32) -> Self {
        let nyquist_hz = sample_rate_hz as f32 * 0.5;
        Self {
            current: ArcSwap::from_pointee(initial.clamped(nyquist_hz)),
            version: AtomicU64::new(0),
            nyquist_hz,
        }
    }

    pub fn from_config(config: &ShiftConfig) -> Self {
        Self::new(config.initial_parameters(), config.sample_rate_hz)
    }

    /// Replace all parameters.
    pub fn set(&self, params: ShiftParameters) {
        let clamped = params.clamped(self.nyquist_hz);
        if clamped != params {
            tracing::debug!(?params, ?clamped, "shift parameters clamped");
        }
        self.current.store(Arc::new(clamped));
        self.version.fetch_add(1, Ordering::Release);
    }

    pub fn set_amplitude(&self, amplitude_hz: f32) {
        self.update(|p| p.amplitude_hz = amplitude_hz);
    }

    pub fn set_mod_freq(&self, mod_freq_hz: f32) {
        self.update(|p| p.mod_freq_hz = mod_freq_hz);
    }

    pub fn set_cutoff(&self, cutoff_hz: f32) {
        self.update(|p| p.cutoff_hz = cutoff_hz);
    }

    fn update(&self, patch: impl Fn(&mut ShiftParameters)) {
        let nyquist_hz = self.nyquist_hz;
        self.current.rcu(|current| {
            let mut next = **current;
            patch(&mut next);
            next.clamped(nyquist_hz)
        });
        self.version.fetch_add(1, Ordering::Release);
    }

    /// Copy of the latest parameters. RT-safe.
    #[inline]
    pub fn snapshot(&self) -> ShiftParameters {
        **self.current.load()
    }

    /// Number of writes since creation.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub fn nyquist_hz(&self) -> f32 {
        self.nyquist_hz
    }
}
