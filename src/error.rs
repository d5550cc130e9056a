//! Error types for buffer ingestion, output devices, and the engine.

use thiserror::Error;

/// A decoded buffer that does not satisfy the [`SampleBuffer`] invariant.
///
/// [`SampleBuffer`]: crate::SampleBuffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Sample rate must be positive.
    #[error("Sample rate must be greater than zero")]
    ZeroSampleRate,

    /// At least one channel is required.
    #[error("Buffer has no channels")]
    NoChannels,

    /// A channel has a different length than channel 0.
    #[error("Channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    /// Flat sample data does not divide evenly into channels.
    #[error("{samples} samples cannot be split into {channels} channels")]
    UnevenLength { samples: usize, channels: usize },
}

/// Errors raised by an output device while opening a connection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// No output device available
    #[error("No audio output device available")]
    NoDevice,

    /// Device refused or could not report a usable configuration
    #[error("Failed to get device config: {0}")]
    Config(String),

    /// Failed to build the output stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuild(String),

    /// Failed to start the output stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlay(String),

    /// Device is present but currently unusable (busy, permission denied)
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),
}

/// Errors reported by [`PlaybackEngine`] operations.
///
/// [`PlaybackEngine`]: crate::PlaybackEngine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Rejected buffer at ingestion.
    #[error("Invalid sample buffer: {0}")]
    Buffer(#[from] BufferError),

    /// The output device could not be acquired.
    #[error("Output device error: {0}")]
    Device(#[from] DeviceError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
