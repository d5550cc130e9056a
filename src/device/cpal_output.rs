// src/device/cpal_output.rs
//
// Hardware output through cpal. Each connection is its own output stream
// on the default device; the stream's callback owns the PlaybackVoice.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use super::{Completion, CompletionSender, ConnectionId, OutputDevice, PlaybackVoice, RenderRequest};
use crate::error::DeviceError;

/// A live stream plus the flag its callback checks before producing audio.
struct CpalConnection {
    id: ConnectionId,
    stream: Stream,
    muted: Arc<AtomicBool>,
}

/// Output device backed by the host's default cpal output.
///
/// Streams are not `Send` on every platform, so neither is this device;
/// keep it on the thread that owns the engine.
pub struct CpalDevice {
    device_name: Option<String>,
    connections: Vec<CpalConnection>,
}

impl CpalDevice {
    /// Use the default output device of the default host.
    pub fn new() -> Self {
        Self {
            device_name: None,
            connections: Vec::with_capacity(1),
        }
    }

    /// Use the output device whose name matches `name`.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            connections: Vec::with_capacity(1),
        }
    }

    /// Names of the available output devices.
    pub fn list_devices() -> Result<Vec<String>, DeviceError> {
        let devices = cpal::default_host()
            .output_devices()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    fn find_device(&self) -> Result<cpal::Device, DeviceError> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(name) => host
                .output_devices()
                .map_err(|e| DeviceError::Unavailable(e.to_string()))?
                .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                .ok_or(DeviceError::NoDevice),
            None => host.default_output_device().ok_or(DeviceError::NoDevice),
        }
    }
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for CpalDevice {
    fn open(&mut self, request: RenderRequest) -> Result<ConnectionId, DeviceError> {
        let device = self.find_device()?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device
            .default_output_config()
            .map_err(|e| DeviceError::Config(e.to_string()))?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        let muted = Arc::new(AtomicBool::new(false));
        let voice = PlaybackVoice::new(&request, config.sample_rate.0);
        let completion = request.completion.clone();

        let stream = match sample_format {
            SampleFormat::F32 => {
                build_stream::<f32>(&device, &config, voice, completion, Arc::clone(&muted))
            }
            SampleFormat::I16 => {
                build_stream::<i16>(&device, &config, voice, completion, Arc::clone(&muted))
            }
            SampleFormat::U16 => {
                build_stream::<u16>(&device, &config, voice, completion, Arc::clone(&muted))
            }
            other => Err(DeviceError::Config(format!("Unsupported sample format: {other}"))),
        }?;

        stream
            .play()
            .map_err(|e| DeviceError::StreamPlay(e.to_string()))?;

        log::info!(
            "Output stream on {}: {} channels, {}Hz, rate {:.2}x, gain {:.2}",
            device_name,
            config.channels,
            config.sample_rate.0,
            request.rate,
            request.gain
        );

        self.connections.push(CpalConnection {
            id: request.connection,
            stream,
            muted,
        });
        Ok(request.connection)
    }

    fn close(&mut self, connection: ConnectionId) {
        let Some(index) = self.connections.iter().position(|c| c.id == connection) else {
            return;
        };
        let conn = self.connections.swap_remove(index);

        // Mute first so the callback emits silence even if pause/drop lags.
        conn.muted.store(true, Ordering::Release);
        if let Err(e) = conn.stream.pause() {
            log::warn!("Failed to pause stream for {:?}: {}", connection, e);
        }
        drop(conn.stream);
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        for conn in &self.connections {
            conn.muted.store(true, Ordering::Release);
        }
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut voice: PlaybackVoice,
    completion: CompletionSender,
    muted: Arc<AtomicBool>,
) -> Result<Stream, DeviceError>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels = config.channels as usize;

    // Grows on the first callback, then stable
    let mut scratch = Vec::<f32>::new();
    let mut notified = false;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                if scratch.len() < data.len() {
                    scratch.resize(data.len(), 0.0);
                }
                let block = &mut scratch[..data.len()];
                block.fill(0.0);

                if !muted.load(Ordering::Acquire) && voice.process(block, channels) && !notified {
                    notified = true;
                    let _ = completion.send(Completion {
                        connection: voice.connection(),
                    });
                }

                for (sample, &value) in data.iter_mut().zip(block.iter()) {
                    *sample = T::from_sample(value);
                }
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )
        .map_err(|e| DeviceError::StreamBuild(e.to_string()))
}
