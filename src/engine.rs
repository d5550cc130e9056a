// src/engine.rs

use std::sync::{
    Arc,
    mpsc::{self, Receiver, Sender, TryRecvError},
};

use log::{debug, info, warn};

use crate::bounds::TrimWindow;
use crate::config::{EngineConfig, StopPolicy};
use crate::device::{Completion, ConnectionId, OutputDevice, Playhead, RenderRequest};
use crate::error::Result;
use crate::params::PlaybackParameters;
use crate::sample_buffer::SampleBuffer;
use crate::transform::transform;

/// Lifecycle of the engine's playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    /// Nothing has played since the buffer was loaded.
    #[default]
    Idle,

    /// A device connection is rendering.
    Playing,

    /// Playback ended by `stop()` or by reaching the end without looping.
    Stopped,
}

/// The one active rendering instance.
#[derive(Debug)]
struct PlaybackSession {
    connection: ConnectionId,
    buffer: Arc<SampleBuffer>,
    playhead: Arc<Playhead>,
}

/// Read-only engine state for UI display.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub status: PlaybackStatus,
    pub speed: f32,
    pub gain: f32,
    pub reverse: bool,
    pub looping: bool,
    /// Detected playable region of the loaded buffer.
    pub window: Option<TrimWindow>,
    /// Playhead inside the rendered region, in seconds.
    pub position_seconds: f64,
}

/// Playback state machine.
///
/// Owns the loaded recording, its trim window, the playback parameters,
/// and at most one device connection. All calls are synchronous; the
/// device reports end-of-buffer through a channel that the owner drains
/// with [`PlaybackEngine::poll`].
pub struct PlaybackEngine<D: OutputDevice> {
    config: EngineConfig,
    device: D,
    params: PlaybackParameters,

    /// Decoded recording, never mutated.
    source: Option<Arc<SampleBuffer>>,
    window: Option<TrimWindow>,

    session: Option<PlaybackSession>,
    status: PlaybackStatus,
    next_connection: u64,

    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
}

impl<D: OutputDevice> PlaybackEngine<D> {
    pub fn new(device: D) -> Self {
        Self::with_config(device, EngineConfig::default())
    }

    /// Engine on `device`. The config's ranges are normalized first.
    pub fn with_config(device: D, config: EngineConfig) -> Self {
        let config = config.normalized();
        let (completion_tx, completion_rx) = mpsc::channel();
        let params = PlaybackParameters::from_ranges(&config.speed, &config.gain);
        Self {
            config,
            device,
            params,
            source: None,
            window: None,
            session: None,
            status: PlaybackStatus::Idle,
            next_connection: 1,
            completion_tx,
            completion_rx,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Recording ingestion
    // ═══════════════════════════════════════════════════════════════════

    /// Take a freshly decoded recording.
    ///
    /// Any playback of the previous recording is torn down, the trim window
    /// is computed once, and the engine returns to Idle.
    pub fn load(&mut self, buffer: SampleBuffer) {
        self.teardown();

        let window = self.config.detector().detect(&buffer);
        info!(
            "Loaded {} ch @ {}Hz, {:.3}s; trimmed to {:.3}s..{:.3}s",
            buffer.channel_count(),
            buffer.sample_rate(),
            buffer.duration_seconds(),
            window.start_seconds(),
            window.end_seconds()
        );

        self.source = Some(Arc::new(buffer));
        self.window = Some(window);
        self.status = PlaybackStatus::Idle;
    }

    /// Drop the loaded recording, stopping playback first.
    pub fn clear(&mut self) {
        self.teardown();
        self.source = None;
        self.window = None;
        self.status = PlaybackStatus::Idle;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Transport
    // ═══════════════════════════════════════════════════════════════════

    /// Start playback of the trimmed recording with the current parameters.
    ///
    /// Returns `Ok(false)` without doing anything when no recording is
    /// loaded (or its trimmed region is empty). Any existing connection is
    /// closed before the new one is opened. If the device cannot be opened
    /// the error is returned and no session is left behind.
    pub fn play(&mut self) -> Result<bool> {
        let (Some(source), Some(window)) = (&self.source, &self.window) else {
            debug!("play() ignored: no recording loaded");
            return Ok(false);
        };

        let buffer = Arc::new(transform(source, window, self.params.reverse));
        if buffer.is_empty() {
            debug!("play() ignored: trimmed region is empty");
            return Ok(false);
        }

        if self.teardown() {
            self.status = PlaybackStatus::Stopped;
        }

        let connection = ConnectionId(self.next_connection);
        self.next_connection += 1;
        let playhead = Arc::new(Playhead::new());

        let request = RenderRequest {
            connection,
            buffer: Arc::clone(&buffer),
            rate: self.params.speed,
            gain: self.params.gain,
            playhead: Arc::clone(&playhead),
            completion: self.completion_tx.clone(),
        };

        if let Err(e) = self.device.open(request) {
            warn!("Failed to open output: {}", e);
            return Err(e.into());
        }

        debug!(
            "Playing {:?}: {} frames, speed {:.2}, gain {:.2}, reverse {}, loop {}",
            connection,
            buffer.len(),
            self.params.speed,
            self.params.gain,
            self.params.reverse,
            self.params.looping
        );

        self.session = Some(PlaybackSession {
            connection,
            buffer,
            playhead,
        });
        self.status = PlaybackStatus::Playing;
        Ok(true)
    }

    /// Stop playback and release the device connection.
    ///
    /// The connection is silenced before this returns, so the status is
    /// reported as Stopped right away. A no-op unless Playing.
    pub fn stop(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }

        self.teardown();
        self.status = PlaybackStatus::Stopped;

        if self.config.stop_policy == StopPolicy::ResetFlags {
            self.params.reverse = false;
            self.params.looping = false;
        }
        info!("Playback stopped");
    }

    /// Stop when playing, play otherwise.
    pub fn toggle(&mut self) -> Result<bool> {
        if self.is_playing() {
            self.stop();
            Ok(true)
        } else {
            self.play()
        }
    }

    /// Apply pending device notifications.
    ///
    /// A completion only counts if it belongs to the current session and
    /// the engine is still Playing; notifications that arrive after a stop
    /// or restart are discarded. Returns the error of a failed loop
    /// restart, after which the engine is Stopped.
    pub fn poll(&mut self) -> Result<()> {
        loop {
            let completion = match self.completion_rx.try_recv() {
                Ok(c) => c,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return Ok(()),
            };
            self.handle_completion(completion)?;
        }
    }

    fn handle_completion(&mut self, completion: Completion) -> Result<()> {
        let current = self.session.as_ref().map(|s| s.connection);
        if self.status != PlaybackStatus::Playing || current != Some(completion.connection) {
            debug!("Discarding stale completion for {:?}", completion.connection);
            return Ok(());
        }

        if self.params.looping {
            debug!("Looping: restarting after {:?}", completion.connection);
            return self.restart();
        }

        self.teardown();
        self.status = PlaybackStatus::Stopped;
        info!("Playback finished");
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Parameters
    // ═══════════════════════════════════════════════════════════════════

    /// Set the playback speed, clamped to the configured range.
    ///
    /// Restarts playback when Playing, since rate is bound when the
    /// connection opens.
    pub fn set_speed(&mut self, value: f32) -> Result<()> {
        self.params.speed = self.config.speed.clamp(value);
        self.restart_if_playing()
    }

    /// Set the output gain, clamped to the configured range.
    ///
    /// Restarts playback when Playing.
    pub fn set_gain(&mut self, value: f32) -> Result<()> {
        self.params.gain = self.config.gain.clamp(value);
        self.restart_if_playing()
    }

    /// Enable reverse playback. Rejected while Playing; returns whether the
    /// value was applied.
    pub fn set_reverse(&mut self, value: bool) -> bool {
        if self.is_playing() {
            debug!("set_reverse({}) rejected while playing", value);
            return false;
        }
        self.params.reverse = value;
        true
    }

    /// Enable looping. Rejected while Playing; returns whether the value
    /// was applied.
    pub fn set_loop(&mut self, value: bool) -> bool {
        if self.is_playing() {
            debug!("set_loop({}) rejected while playing", value);
            return false;
        }
        self.params.looping = value;
        true
    }

    fn restart_if_playing(&mut self) -> Result<()> {
        if self.is_playing() {
            self.restart()?;
        }
        Ok(())
    }

    /// Close the current connection and play again from the start.
    fn restart(&mut self) -> Result<()> {
        self.teardown();
        self.status = PlaybackStatus::Stopped;
        self.play().map(|_| ())
    }

    /// Close the current connection, if any. Returns whether one was open.
    fn teardown(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                self.device.close(session.connection);
                true
            }
            None => false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Readback
    // ═══════════════════════════════════════════════════════════════════

    #[inline]
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    #[inline]
    pub fn params(&self) -> &PlaybackParameters {
        &self.params
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Trim window of the loaded recording.
    #[inline]
    pub fn window(&self) -> Option<TrimWindow> {
        self.window
    }

    /// The loaded recording.
    pub fn source(&self) -> Option<&SampleBuffer> {
        self.source.as_deref()
    }

    /// Buffer currently being rendered (trimmed, possibly reversed).
    pub fn rendered_buffer(&self) -> Option<&SampleBuffer> {
        self.session.as_ref().map(|s| s.buffer.as_ref())
    }

    /// Position inside the rendered region, in seconds of source audio.
    pub fn position_seconds(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.playhead.frame() / s.buffer.sample_rate() as f64)
            .unwrap_or(0.0)
    }

    /// Snapshot for the UI.
    pub fn state(&self) -> EngineState {
        EngineState {
            status: self.status,
            speed: self.params.speed,
            gain: self.params.gain,
            reverse: self.params.reverse,
            looping: self.params.looping,
            window: self.window,
            position_seconds: self.position_seconds(),
        }
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: OutputDevice> Drop for PlaybackEngine<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
