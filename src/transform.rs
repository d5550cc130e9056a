// src/transform.rs
//
// Derives the buffer that is actually rendered: the trimmed region of a
// source buffer, optionally with each channel played backwards.

use crate::bounds::TrimWindow;
use crate::sample_buffer::SampleBuffer;

/// Copy the windowed region of `buffer` into a new buffer, reversing the
/// sample order of every channel when `reverse` is set.
///
/// Channel order is untouched, so channels stay aligned frame for frame.
/// The result has the source's sample rate and channel count and a length
/// equal to the windowed region.
pub fn transform(buffer: &SampleBuffer, window: &TrimWindow, reverse: bool) -> SampleBuffer {
    let (start, end) = window.frame_range(buffer);
    let frames = end - start;

    let mut data = Vec::with_capacity(frames * buffer.channel_count());
    for channel in buffer.channels() {
        let region = &channel[start..end];
        if reverse {
            data.extend(region.iter().rev());
        } else {
            data.extend_from_slice(region);
        }
    }

    buffer.derive(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::BoundsDetector;

    fn stereo() -> SampleBuffer {
        SampleBuffer::from_channels(1000, vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0]])
            .unwrap()
    }

    #[test]
    fn test_reverse_keeps_channel_pairing() {
        let buffer = stereo();
        let reversed = transform(&buffer, &TrimWindow::full(&buffer), true);

        assert_eq!(reversed.channel(0), &[3.0, 2.0, 1.0]);
        assert_eq!(reversed.channel(1), &[30.0, 20.0, 10.0]);
        assert_eq!(reversed.sample_rate(), 1000);
        assert_eq!(reversed.channel_count(), 2);
    }

    #[test]
    fn test_straight_copy_of_window() {
        let samples = vec![0.0, 0.0, 0.5, 0.25, 0.0, 0.0];
        let buffer = SampleBuffer::from_channels(1000, vec![samples]).unwrap();
        let window = BoundsDetector::new(0.01, 1).detect(&buffer);
        let trimmed = transform(&buffer, &window, false);

        // Onset at 2, last loud sample at 3: [2 - 1, 3 + 1) = [1, 4)
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed.channel(0), &[0.0, 0.5, 0.25]);
        // Source untouched
        assert_eq!(buffer.len(), 6);
    }

    #[test]
    fn test_double_reverse_is_identity() {
        let left: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).sin()).collect();
        let right: Vec<f32> = (0..64).map(|i| (i as f32 * 0.11).cos() * 0.5).collect();
        let buffer = SampleBuffer::from_channels(48000, vec![left, right]).unwrap();
        let window = BoundsDetector::new(0.2, 3).detect(&buffer);

        let once = transform(&buffer, &window, true);
        let twice = transform(&once, &TrimWindow::full(&once), true);
        let straight = transform(&buffer, &window, false);

        assert_eq!(twice, straight);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let buffer = stereo();
        let window = TrimWindow::full(&buffer);
        assert_eq!(transform(&buffer, &window, true), transform(&buffer, &window, true));
    }

    #[test]
    fn test_empty_region() {
        let buffer = SampleBuffer::from_channels(1000, vec![vec![], vec![]]).unwrap();
        let out = transform(&buffer, &TrimWindow::full(&buffer), true);
        assert!(out.is_empty());
        assert_eq!(out.channel_count(), 2);
    }
}
