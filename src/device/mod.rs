// src/device/mod.rs
//
// Output device boundary.
//
// The engine treats a device as a capability that can open one render
// connection for a buffer at a given rate and gain, close it again, and
// report natural end-of-buffer through a completion channel. Completions
// are delivered asynchronously: a device may post one after the engine
// already closed the connection, so the engine filters them by id.

mod offline;
mod voice;

#[cfg(feature = "cpal")]
mod cpal_output;

pub use offline::OfflineDevice;
pub use voice::PlaybackVoice;

#[cfg(feature = "cpal")]
pub use cpal_output::CpalDevice;

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc::Sender,
};

use crate::error::DeviceError;
use crate::sample_buffer::SampleBuffer;

/// Identifies one device connection. Never reused within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

/// Notification that a connection reached the end of its buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub connection: ConnectionId,
}

/// Sending side of the completion channel handed to devices.
pub type CompletionSender = Sender<Completion>;

/// Lock-free playhead shared between a render connection and the engine.
///
/// Holds the frame position inside the rendered buffer, stored as f64 bits
/// (no AtomicF64 in std).
#[derive(Debug)]
pub struct Playhead {
    frame_bits: AtomicU64,
}

impl Playhead {
    pub fn new() -> Self {
        Self {
            frame_bits: AtomicU64::new(0.0_f64.to_bits()),
        }
    }

    #[inline]
    pub fn frame(&self) -> f64 {
        f64::from_bits(self.frame_bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set_frame(&self, frame: f64) {
        self.frame_bits.store(frame.to_bits(), Ordering::Relaxed);
    }
}

impl Default for Playhead {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a device needs to open a render connection.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Id the completion notification must carry.
    pub connection: ConnectionId,

    /// Buffer to render, from its first frame.
    pub buffer: Arc<SampleBuffer>,

    /// Playback rate multiplier. Applied while reading, never to the data.
    pub rate: f32,

    /// Linear gain applied in the signal path.
    pub gain: f32,

    /// Position readback for the engine.
    pub playhead: Arc<Playhead>,

    /// Where to post the end-of-buffer notification.
    pub completion: CompletionSender,
}

/// An audio output that renders one buffer per connection.
pub trait OutputDevice {
    /// Open a connection and start rendering `request.buffer`.
    ///
    /// On error nothing may be left open.
    fn open(&mut self, request: RenderRequest) -> Result<ConnectionId, DeviceError>;

    /// Close a connection.
    ///
    /// Output for the connection must be silent once this returns, even if
    /// the underlying teardown finishes later. Closing an unknown or
    /// already finished connection is a no-op.
    fn close(&mut self, connection: ConnectionId);
}

impl<D: OutputDevice + ?Sized> OutputDevice for Box<D> {
    fn open(&mut self, request: RenderRequest) -> Result<ConnectionId, DeviceError> {
        (**self).open(request)
    }

    fn close(&mut self, connection: ConnectionId) {
        (**self).close(connection)
    }
}
