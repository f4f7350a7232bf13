//! DSP building blocks for shiftline: anti-aliasing lowpass design, stateful
//! block filtering, and phase-continuous frequency shifting.
//!
//! Everything here is allocation-free once constructed, so it can run on the
//! audio thread. Filters compute in `f64`; block I/O is `f32`.
//!
//! ```
//! use shiftline_core::{FilterFamily, SampleClock, ShiftMode, ShiftParameters};
//! use shiftline_dsp::{design_lowpass, FilterState, FrequencyShifter};
//!
//! let coeffs = design_lowpass(1_000.0, 44_100.0, 6, FilterFamily::Iir).unwrap();
//! let mut filter = FilterState::new(coeffs.order());
//! let mut shifter = FrequencyShifter::new(ShiftMode::Static, 44_100.0, 256).unwrap();
//!
//! let input = vec![0.25f32; 256];
//! let mut output = vec![0.0f32; 256];
//! let params = ShiftParameters::new(500.0, 0.0, 1_000.0);
//!
//! shifter.process(&params, &SampleClock::new(44_100.0), &input, &mut output).unwrap();
//! filter.process_in_place(&coeffs, &mut output).unwrap();
//! ```

mod error;
pub use error::{Error, Result};

pub mod filter;
pub use filter::{
    design_lowpass, min_fir_order, Biquad, DelayLine, FilterCoefficients, FilterDesigner,
    FilterState,
};

pub mod shift;
pub use shift::{FrequencyShifter, PhaseState};
