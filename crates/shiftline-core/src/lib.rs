//! Real-time runtime for the shiftline frequency shifting engine.
//!
//! # Primary API
//!
//! - [`ShiftConfig`]: stream configuration (rate, block size, filter, shift mode)
//! - [`ParameterStore`]: lock-free control-rate parameter exchange
//! - [`SampleClock`]: monotonic sample counter for absolute stream time
//! - [`AudioBlock`]: fixed-length mono block, allocated once per stream
//! - [`CaptureSource`] / [`PlaybackSink`]: block I/O seams
//! - [`PipelineMetrics`]: underrun and load counters
//!
//! # Feature-gated APIs
//!
//! - `"device"`: CPAL capture/playback streams (enabled by default)
//!
//! # Example
//!
//! ```
//! use shiftline_core::{ParameterStore, ShiftConfig, ShiftParameters};
//!
//! let config = ShiftConfig::default();
//! let params = ParameterStore::from_config(&config);
//!
//! // Control thread
//! params.set(ShiftParameters::new(800.0, 2.0, 1200.0));
//!
//! // Audio thread, once per block
//! let snapshot = params.snapshot();
//! assert_eq!(snapshot.amplitude_hz, 800.0);
//! ```

pub mod error;
pub use error::{Error, Result};

mod config;
pub use config::{
    FilterFamily, ShiftConfig, ShiftMode, UnderrunFallback, MAX_BLOCK_SIZE, MAX_FIR_ORDER,
    MAX_IIR_ORDER, MAX_SAMPLE_RATE_HZ, MIN_SAMPLE_RATE_HZ,
};

pub(crate) mod lockfree;
pub use lockfree::{AtomicFlag, AtomicFloat};

pub mod parameter;
pub use parameter::{ParameterStore, ShiftParameters, MIN_CUTOFF_HZ};

mod clock;
pub use clock::SampleClock;

mod block;
pub use block::AudioBlock;

pub mod io;
pub use io::{
    Capture, CaptureSource, MemorySink, MemorySource, PlaybackSink, RingCapture, RingPlayback,
    Submit,
};

pub mod metrics;
pub use metrics::{MetricsSnapshot, PipelineMetrics};

#[cfg(feature = "device")]
pub mod device;
