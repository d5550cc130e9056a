// src/lib.rs
//
// Library entry point. Records are trimmed of leading/trailing silence
// and played back (optionally reversed, looped, sped up, attenuated)
// through a single output connection.

mod bounds;
mod config;
mod engine;
mod error;
mod params;
mod sample_buffer;
mod transform;

pub mod device;

#[cfg(feature = "ios")]
pub mod ffi;

// Re-export key types for Rust consumers
pub use bounds::{
    BoundsDetector, DEFAULT_PADDING_SAMPLES, DEFAULT_SILENCE_THRESHOLD, TrimWindow, detect_bounds,
};
pub use config::{EngineConfig, StopPolicy};
pub use device::{Completion, ConnectionId, OfflineDevice, OutputDevice, RenderRequest};
pub use engine::{EngineState, PlaybackEngine, PlaybackStatus};
pub use error::{BufferError, DeviceError, EngineError, Result};
pub use params::{MIN_SPEED, ParamRange, ParamUnit, PlaybackParameters};
pub use sample_buffer::SampleBuffer;
pub use transform::transform;

#[cfg(feature = "cpal")]
pub use device::CpalDevice;
