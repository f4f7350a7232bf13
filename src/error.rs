//! Centralized error type for the shiftline umbrella crate.
//!
//! Wraps the runtime and DSP errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] shiftline_core::Error),

    #[error("DSP: {0}")]
    Dsp(#[from] shiftline_dsp::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Audio thread panicked")]
    WorkerPanicked,

    #[error("Invalid command: {0}")]
    Command(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for capture/playback failures.
    pub fn is_device_error(&self) -> bool {
        matches!(self, Error::Core(e) if e.is_device_error())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
