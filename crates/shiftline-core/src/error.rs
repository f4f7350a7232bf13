//! Error types for shiftline-core.

use thiserror::Error;

/// Error type for shiftline-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Device error: {0}")]
    Device(String),

    #[cfg(feature = "device")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "device")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to pause audio stream")]
    PauseStream(#[from] cpal::PauseStreamError),

    #[cfg(feature = "device")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "device")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),

    #[error("Invalid config file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for capture/playback failures (as opposed to setup errors).
    pub fn is_device_error(&self) -> bool {
        match self {
            Error::Device(_) => true,
            #[cfg(feature = "device")]
            Error::DeviceNotAvailable(_)
            | Error::BuildStream(_)
            | Error::PlayStream(_)
            | Error::PauseStream(_)
            | Error::DevicesError(_)
            | Error::DeviceNameError(_) => true,
            _ => false,
        }
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_classification() {
        assert!(Error::Device("input stream closed".into()).is_device_error());
        assert!(!Error::InvalidParameter("order".into()).is_device_error());
    }
}
