// src/bounds.rs
//
// Silence trimming.
//
// Finds the playable region of a recording by scanning every channel for
// the first and last sample above a silence threshold, then widening the
// region by a fixed padding so onsets and tails are not cut abruptly.

use crate::sample_buffer::SampleBuffer;

/// Default absolute amplitude below which a sample counts as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

/// Default number of samples kept before the first and after the last
/// loud sample.
pub const DEFAULT_PADDING_SAMPLES: usize = 1000;

/// The detected non-silent region of a buffer.
///
/// Stored as frame indices (`start` inclusive, `end` exclusive) together
/// with the sample rate they were measured at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    start: usize,
    end: usize,
    sample_rate: u32,
}

impl TrimWindow {
    /// Window covering the whole buffer.
    pub fn full(buffer: &SampleBuffer) -> Self {
        Self {
            start: 0,
            end: buffer.len(),
            sample_rate: buffer.sample_rate(),
        }
    }

    #[inline]
    pub fn start_frame(&self) -> usize {
        self.start
    }

    #[inline]
    pub fn end_frame(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn start_seconds(&self) -> f64 {
        self.start as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn end_seconds(&self) -> f64 {
        self.end as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn duration_seconds(&self) -> f64 {
        self.end_seconds() - self.start_seconds()
    }

    /// Frame range of this window inside `buffer`, clamped to its length.
    ///
    /// Frames are reused directly when the rates match; otherwise they are
    /// re-derived from the window's time in seconds.
    pub fn frame_range(&self, buffer: &SampleBuffer) -> (usize, usize) {
        let len = buffer.len();
        let (start, end) = if self.sample_rate == buffer.sample_rate() {
            (self.start, self.end)
        } else {
            let rate = buffer.sample_rate() as f64;
            (
                (self.start_seconds() * rate).round() as usize,
                (self.end_seconds() * rate).round() as usize,
            )
        };
        let end = end.min(len);
        (start.min(end), end)
    }
}

/// Scans buffers for their trimmed playable window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsDetector {
    pub silence_threshold: f32,
    pub padding_samples: usize,
}

impl Default for BoundsDetector {
    fn default() -> Self {
        Self {
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            padding_samples: DEFAULT_PADDING_SAMPLES,
        }
    }
}

impl BoundsDetector {
    pub fn new(silence_threshold: f32, padding_samples: usize) -> Self {
        Self {
            silence_threshold,
            padding_samples,
        }
    }

    /// Compute the trimmed window of `buffer`.
    ///
    /// The start is the latest padded onset across channels and the end is
    /// the earliest padded offset, so every channel has shown activity
    /// inside the window. A channel with no sample above the threshold does
    /// not narrow the window. If nothing is loud, or the per-channel bounds
    /// do not overlap, the full buffer is returned.
    pub fn detect(&self, buffer: &SampleBuffer) -> TrimWindow {
        let len = buffer.len();
        let threshold = self.silence_threshold;

        let mut start = 0;
        let mut end = len;
        let mut any_loud = false;

        for data in buffer.channels() {
            let Some(first) = data.iter().position(|s| s.abs() > threshold) else {
                continue;
            };
            any_loud = true;
            start = start.max(first.saturating_sub(self.padding_samples));

            // Guaranteed to find a sample since `first` exists.
            if let Some(last) = data.iter().rposition(|s| s.abs() > threshold) {
                end = end.min(last.saturating_add(self.padding_samples).min(len));
            }
        }

        if !any_loud || start >= end {
            return TrimWindow::full(buffer);
        }

        TrimWindow {
            start,
            end,
            sample_rate: buffer.sample_rate(),
        }
    }
}

/// Detect bounds with the default threshold (0.01) and padding (1000).
pub fn detect_bounds(buffer: &SampleBuffer) -> TrimWindow {
    BoundsDetector::default().detect(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mono(sample_rate: u32, samples: Vec<f32>) -> SampleBuffer {
        SampleBuffer::from_channels(sample_rate, vec![samples]).unwrap()
    }

    #[test]
    fn test_single_onset_with_padding() {
        let buffer = mono(1000, vec![0.0, 0.0, 0.5, 0.0, 0.0]);
        let window = BoundsDetector::new(0.01, 1).detect(&buffer);

        assert_eq!(window.start_frame(), 1);
        assert_eq!(window.end_frame(), 3);
        assert_relative_eq!(window.start_seconds(), 0.001);
        assert_relative_eq!(window.end_seconds(), 0.003);
    }

    #[test]
    fn test_silent_buffer_gives_full_window() {
        let buffer = mono(8000, vec![0.005, -0.01, 0.0, 0.009]);
        let window = detect_bounds(&buffer);

        assert_eq!(window, TrimWindow::full(&buffer));
        assert_relative_eq!(window.start_seconds(), 0.0);
        assert_relative_eq!(window.end_seconds(), buffer.duration_seconds());
    }

    #[test]
    fn test_padding_clamped_to_buffer() {
        let buffer = mono(100, vec![0.0, 0.3, 0.0, -0.4, 0.0]);
        let window = BoundsDetector::new(0.01, 1000).detect(&buffer);

        assert_eq!(window.start_frame(), 0);
        assert_eq!(window.end_frame(), 5);
    }

    #[test]
    fn test_latest_onset_and_earliest_offset_across_channels() {
        let mut left = vec![0.0; 20];
        let mut right = vec![0.0; 20];
        left[4] = 0.5;
        left[15] = 0.5;
        right[8] = -0.5;
        right[12] = 0.5;

        let buffer = SampleBuffer::from_channels(1000, vec![left, right]).unwrap();
        let window = BoundsDetector::new(0.01, 2).detect(&buffer);

        // left: [2, 17), right: [6, 14) -> latest start, earliest end
        assert_eq!(window.start_frame(), 6);
        assert_eq!(window.end_frame(), 14);
    }

    #[test]
    fn test_silent_channel_does_not_narrow() {
        let mut left = vec![0.0; 10];
        left[5] = 0.9;
        let right = vec![0.0; 10];

        let buffer = SampleBuffer::from_channels(1000, vec![left, right]).unwrap();
        let window = BoundsDetector::new(0.01, 1).detect(&buffer);

        assert_eq!((window.start_frame(), window.end_frame()), (4, 6));
    }

    #[test]
    fn test_disjoint_channels_fall_back_to_full() {
        let mut left = vec![0.0; 10];
        let mut right = vec![0.0; 10];
        left[1] = 0.5;
        right[8] = 0.5;

        let buffer = SampleBuffer::from_channels(1000, vec![left, right]).unwrap();
        let window = BoundsDetector::new(0.01, 0).detect(&buffer);

        assert_eq!(window, TrimWindow::full(&buffer));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let buffer = mono(1000, vec![0.0, 0.01, -0.01, 0.0]);
        let window = BoundsDetector::new(0.01, 0).detect(&buffer);
        assert_eq!(window, TrimWindow::full(&buffer));
    }

    #[test]
    fn test_window_always_within_buffer() {
        let patterns: [&[f32]; 5] = [
            &[],
            &[0.7],
            &[0.0, 0.0, 0.0],
            &[1.0, 0.0, 0.0, 0.0, -1.0],
            &[0.0, 0.02, 0.0, 0.0, 0.0, 0.0, 0.0],
        ];

        for samples in patterns {
            let buffer = mono(44100, samples.to_vec());
            for padding in [0, 1, 3, 1000] {
                let window = BoundsDetector::new(0.01, padding).detect(&buffer);
                assert!(window.start_seconds() >= 0.0);
                assert!(window.start_seconds() <= window.end_seconds());
                assert!(window.end_seconds() <= buffer.duration_seconds());
            }
        }
    }

    #[test]
    fn test_frame_range_across_sample_rates() {
        let measured = mono(1000, vec![0.0, 0.0, 0.5, 0.0, 0.0]);
        let window = BoundsDetector::new(0.01, 1).detect(&measured);

        let doubled = mono(2000, vec![0.0; 10]);
        assert_eq!(window.frame_range(&doubled), (2, 6));

        let short = mono(1000, vec![0.0; 2]);
        assert_eq!(window.frame_range(&short), (1, 2));
    }
}
