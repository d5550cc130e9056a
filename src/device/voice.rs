// src/device/voice.rs
//
// The render path of one connection: reads a buffer at a playback rate,
// applies gain, and writes interleaved frames to an output block.
// Narrower sources are repeated across output channels; wider sources are
// averaged down.

use std::sync::Arc;

use super::{ConnectionId, Playhead, RenderRequest};
use crate::sample_buffer::SampleBuffer;

/// One active playback of a buffer.
///
/// Rate is a read-position increment, so the stored samples are never
/// resampled; fractional positions are linearly interpolated.
#[derive(Debug)]
pub struct PlaybackVoice {
    connection: ConnectionId,
    buffer: Arc<SampleBuffer>,
    /// Read position in source frames.
    position: f64,
    /// Source frames advanced per output frame.
    step: f64,
    gain: f32,
    playhead: Arc<Playhead>,
    active: bool,
}

impl PlaybackVoice {
    /// Build a voice for `request` rendering at `output_sample_rate`.
    ///
    /// A buffer recorded at a different rate than the output plays at its
    /// own pitch scaled by `request.rate`.
    pub fn new(request: &RenderRequest, output_sample_rate: u32) -> Self {
        let rate_ratio = request.buffer.sample_rate() as f64 / output_sample_rate.max(1) as f64;
        let step = request.rate.max(0.0) as f64 * rate_ratio;
        Self {
            connection: request.connection,
            buffer: Arc::clone(&request.buffer),
            position: 0.0,
            step,
            gain: request.gain,
            playhead: Arc::clone(&request.playhead),
            // A voice that cannot advance is finished from the start.
            active: !request.buffer.is_empty() && step > 0.0,
        }
    }

    #[inline]
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Mix one block into `output` (interleaved, `output_channels` wide).
    ///
    /// Returns `true` once the end of the buffer has been reached.
    pub fn process(&mut self, output: &mut [f32], output_channels: usize) -> bool {
        if !self.active {
            return true;
        }
        if output_channels == 0 {
            return false;
        }

        let frames = self.buffer.len();
        let src_channels = self.buffer.channel_count();

        for out_frame in output.chunks_exact_mut(output_channels) {
            let index = self.position as usize;
            if index >= frames {
                self.active = false;
                break;
            }
            let next = (index + 1).min(frames - 1);
            let frac = (self.position - index as f64) as f32;

            for (ch, sample) in out_frame.iter_mut().enumerate() {
                let value = if src_channels > output_channels {
                    // Average every source channel folded onto this output
                    let folded = (ch..src_channels).step_by(output_channels);
                    let count = folded.len();
                    let sum: f32 = folded.map(|src| self.read(src, index, next, frac)).sum();
                    sum / count as f32
                } else {
                    self.read(ch % src_channels, index, next, frac)
                };
                *sample += value * self.gain;
            }

            self.position += self.step;
        }

        if self.position as usize >= frames {
            self.active = false;
        }
        self.playhead.set_frame(self.position.min(frames as f64));

        !self.active
    }

    #[inline]
    fn read(&self, channel: usize, index: usize, next: usize, frac: f32) -> f32 {
        let data = self.buffer.channel(channel);
        data[index] + (data[next] - data[index]) * frac
    }
}
