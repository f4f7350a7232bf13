//! Anti-aliasing lowpass filters.
//!
//! - [`design_lowpass`] / [`FilterDesigner`]: coefficients for a cutoff
//! - [`FilterState`]: applies coefficients block by block, keeping history
//!   across block boundaries

mod coefficients;
mod delay_line;
mod design;
mod state;

pub use coefficients::{Biquad, FilterCoefficients};
pub use delay_line::DelayLine;
pub use design::{design_lowpass, min_fir_order, FilterDesigner};
pub use state::FilterState;
