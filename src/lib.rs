//! # shiftline - Real-time Frequency Shifting
//!
//! Streams audio block by block through a phase-continuous frequency shifter
//! and an anti-aliasing lowpass, under real-time deadlines.
//!
//! ## Architecture
//!
//! shiftline is an umbrella crate that coordinates:
//! - **shiftline-core** - Configuration, parameter store, sample clock, block I/O, CPAL devices, metrics
//! - **shiftline-dsp** - Lowpass design and filtering, frequency shifter
//!
//! and adds the pipeline controller (state machine, underrun and backpressure
//! handling) plus a threaded live engine.
//!
//! ## Quick Start
//!
//! ```
//! use shiftline::prelude::*;
//!
//! let config = ShiftConfig {
//!     sample_rate_hz: 1_000,
//!     block_size: 100,
//!     shift_mode: ShiftMode::Static,
//!     initial_amplitude_hz: 50.0,
//!     initial_cutoff_hz: 200.0,
//!     ..Default::default()
//! };
//!
//! let mut controller = PipelineController::new(config).unwrap();
//! let mut source = MemorySource::new(vec![0.5; 300]);
//! let mut sink = MemorySink::new();
//!
//! controller.start().unwrap();
//! for _ in 0..3 {
//!     controller.tick(&mut source, &mut sink).unwrap();
//! }
//! controller.request_stop();
//! controller.run(&mut source, &mut sink).unwrap();
//!
//! assert_eq!(sink.samples().len(), 300);
//! assert_eq!(controller.state(), PipelineState::Idle);
//! ```
//!
//! ## Feature Flags
//!
//! - `device` (default) - CPAL capture and playback for [`ShiftEngine::start`]

/// Re-export of shiftline-core for direct access
pub use shiftline_core as core;
/// Re-export of shiftline-dsp for direct access
pub use shiftline_dsp as dsp;

pub use shiftline_core::{
    AudioBlock, Capture, CaptureSource, FilterFamily, MemorySink, MemorySource, MetricsSnapshot,
    ParameterStore, PipelineMetrics, PlaybackSink, SampleClock, ShiftConfig, ShiftMode,
    ShiftParameters, Submit, UnderrunFallback,
};
pub use shiftline_dsp::{
    design_lowpass, FilterCoefficients, FilterDesigner, FilterState, FrequencyShifter, PhaseState,
};

mod error;
pub use error::{Error, Result};

pub mod fsm;
pub use fsm::{PipelineEvent, PipelineFsm, PipelineState, TransitionResult};

mod controller;
pub use controller::{ControllerHandle, PipelineController, TickOutcome};

mod control;
pub use control::ControlCommand;

mod engine;
pub use engine::ShiftEngine;

mod builder;
pub use builder::ShiftEngineBuilder;

pub mod prelude {
    pub use crate::{
        ControlCommand, ControllerHandle, Error, FilterFamily, MemorySink, MemorySource,
        ParameterStore, PipelineController, PipelineState, Result, ShiftConfig, ShiftEngine,
        ShiftEngineBuilder, ShiftMode, ShiftParameters, TickOutcome, UnderrunFallback,
    };
}
