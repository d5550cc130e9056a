// src/device/offline.rs
//
// Pull-rendered output device. Nothing is sent to hardware; the owner
// asks for blocks explicitly. Used by tests and the demo binary, and by
// hosts that already run their own audio callback.

use super::{
    Completion, CompletionSender, ConnectionId, OutputDevice, PlaybackVoice, RenderRequest,
};
use crate::error::DeviceError;

struct OfflineConnection {
    voice: PlaybackVoice,
    completion: CompletionSender,
}

/// Output device rendered on demand with [`OfflineDevice::render`].
pub struct OfflineDevice {
    sample_rate: u32,
    channels: usize,
    connections: Vec<OfflineConnection>,
    available: bool,
    opened: usize,
    max_concurrent: usize,
}

impl OfflineDevice {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            connections: Vec::with_capacity(1),
            available: true,
            opened: 0,
            max_concurrent: 0,
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Simulate the output becoming unavailable (or available again).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }

    /// Total connections opened since creation.
    pub fn opened_total(&self) -> usize {
        self.opened
    }

    /// Highest number of connections that were ever open at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Render `frames` interleaved frames from all open connections.
    ///
    /// Connections that reach the end of their buffer are released and
    /// their completion is posted.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let mut output = vec![0.0; frames * self.channels];
        self.render_into(&mut output);
        output
    }

    /// Render into an existing interleaved block, overwriting it.
    pub fn render_into(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let channels = self.channels;

        self.connections.retain_mut(|conn| {
            if !conn.voice.process(output, channels) {
                return true;
            }
            // Engine may already be gone; nothing to notify then.
            let _ = conn.completion.send(Completion {
                connection: conn.voice.connection(),
            });
            false
        });
    }
}

impl OutputDevice for OfflineDevice {
    fn open(&mut self, request: RenderRequest) -> Result<ConnectionId, DeviceError> {
        if !self.available {
            return Err(DeviceError::Unavailable("offline device disabled".into()));
        }

        let voice = PlaybackVoice::new(&request, self.sample_rate);
        self.connections.push(OfflineConnection {
            voice,
            completion: request.completion,
        });
        self.opened += 1;
        self.max_concurrent = self.max_concurrent.max(self.connections.len());

        log::debug!(
            "Offline connection {:?} opened ({} frames @ {:.2}x, gain {:.2})",
            request.connection,
            request.buffer.len(),
            request.rate,
            request.gain
        );
        Ok(request.connection)
    }

    fn close(&mut self, connection: ConnectionId) {
        self.connections.retain(|conn| conn.voice.connection() != connection);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, mpsc};

    use super::*;
    use crate::device::Playhead;
    use crate::sample_buffer::SampleBuffer;

    fn request(id: u64, samples: Vec<f32>, tx: &CompletionSender) -> RenderRequest {
        RenderRequest {
            connection: ConnectionId(id),
            buffer: Arc::new(SampleBuffer::from_channels(1000, vec![samples]).unwrap()),
            rate: 1.0,
            gain: 1.0,
            playhead: Arc::new(Playhead::new()),
            completion: tx.clone(),
        }
    }

    #[test]
    fn test_completion_posted_at_end() {
        let (tx, rx) = mpsc::channel();
        let mut device = OfflineDevice::new(1000, 1);
        device.open(request(7, vec![0.5; 3], &tx)).unwrap();

        let block = device.render(2);
        assert_eq!(block, vec![0.5, 0.5]);
        assert!(rx.try_recv().is_err());

        device.render(2);
        assert_eq!(rx.try_recv().unwrap(), Completion { connection: ConnectionId(7) });
        assert_eq!(device.open_connections(), 0);
    }

    #[test]
    fn test_close_silences_immediately() {
        let (tx, rx) = mpsc::channel();
        let mut device = OfflineDevice::new(1000, 2);
        device.open(request(1, vec![0.5; 100], &tx)).unwrap();

        device.close(ConnectionId(1));
        assert!(device.render(16).iter().all(|&s| s == 0.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_stereo_recording_audible_on_mono_output() {
        let (tx, _rx) = mpsc::channel();
        let mut device = OfflineDevice::new(1000, 1);
        let mut req = request(1, vec![0.0, 0.0], &tx);
        req.buffer = Arc::new(
            SampleBuffer::from_channels(1000, vec![vec![0.0, 0.0], vec![0.5, 0.5]]).unwrap(),
        );
        device.open(req).unwrap();

        assert_eq!(device.render(2), vec![0.25, 0.25]);
    }

    #[test]
    fn test_unavailable_device_fails() {
        let (tx, _rx) = mpsc::channel();
        let mut device = OfflineDevice::new(1000, 1);
        device.set_available(false);

        let err = device.open(request(1, vec![0.5; 4], &tx)).unwrap_err();
        assert!(matches!(err, DeviceError::Unavailable(_)));
        assert_eq!(device.open_connections(), 0);
        assert_eq!(device.opened_total(), 0);
    }
}
