// src/sample_buffer.rs

use crate::error::BufferError;

/// Decoded multi-channel audio, immutable once built.
///
/// Samples are stored planar in one allocation: channel `c` occupies
/// `data[c * frames..(c + 1) * frames]`. Derived buffers (trimmed,
/// reversed) are always new instances; the source stays valid so it can
/// be re-derived when playback parameters change.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    sample_rate: u32,
    channels: usize,
    frames: usize,
    data: Vec<f32>,
}

impl SampleBuffer {
    /// Build from one sample vector per channel.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, BufferError> {
        if channels.is_empty() {
            return Err(BufferError::NoChannels);
        }
        let frames = channels[0].len();
        if let Some((index, ch)) = channels.iter().enumerate().find(|(_, c)| c.len() != frames) {
            return Err(BufferError::ChannelLengthMismatch {
                channel: index,
                expected: frames,
                actual: ch.len(),
            });
        }

        let mut data = Vec::with_capacity(frames * channels.len());
        for ch in &channels {
            data.extend_from_slice(ch);
        }
        Self::from_planar(sample_rate, channels.len(), data)
    }

    /// Build from planar data already laid out channel after channel.
    pub fn from_planar(
        sample_rate: u32,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, BufferError> {
        if sample_rate == 0 {
            return Err(BufferError::ZeroSampleRate);
        }
        if channels == 0 {
            return Err(BufferError::NoChannels);
        }
        if data.len() % channels != 0 {
            return Err(BufferError::UnevenLength {
                samples: data.len(),
                channels,
            });
        }
        Ok(Self {
            sample_rate,
            channels,
            frames: data.len() / channels,
            data,
        })
    }

    /// Build from interleaved data (`L0 R0 L1 R1 ...`), as most decoders
    /// hand it over.
    pub fn from_interleaved(
        sample_rate: u32,
        channels: usize,
        interleaved: &[f32],
    ) -> Result<Self, BufferError> {
        if channels == 0 {
            return Err(BufferError::NoChannels);
        }
        if interleaved.len() % channels != 0 {
            return Err(BufferError::UnevenLength {
                samples: interleaved.len(),
                channels,
            });
        }

        let frames = interleaved.len() / channels;
        let mut data = vec![0.0; interleaved.len()];
        for (frame, chunk) in interleaved.chunks_exact(channels).enumerate() {
            for (ch, &sample) in chunk.iter().enumerate() {
                data[ch * frames + frame] = sample;
            }
        }
        Self::from_planar(sample_rate, channels, data)
    }

    /// New buffer with this buffer's rate and channel count.
    ///
    /// `data` must be planar with a length divisible by the channel count.
    pub(crate) fn derive(&self, data: Vec<f32>) -> Self {
        debug_assert_eq!(data.len() % self.channels, 0);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            frames: data.len() / self.channels,
            data,
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// Samples per channel.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Duration in seconds (`len / sample_rate`).
    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn channel(&self, ch: usize) -> &[f32] {
        let start = ch * self.frames;
        &self.data[start..start + self.frames]
    }

    /// Iterate channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> + '_ {
        (0..self.channels).map(move |ch| self.channel(ch))
    }
}
