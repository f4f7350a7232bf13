//! Tolerance constants for pipeline tests.
//!
//! Different operations require different precision levels.

/// Floating point rounding errors (pass-through, identity shift).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// DSP processing tolerance (filters, shifted signals compared across block splits).
pub const DSP_EPSILON: f32 = 1e-4;

/// Audio perceptual tolerance (~-60dB, inaudible differences).
pub const PERCEPTUAL_EPSILON: f32 = 0.001;

/// Silence threshold (~-80dB).
/// Values below this are considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Phase continuity tolerance in radians.
pub const PHASE_EPSILON: f64 = 1e-6;
