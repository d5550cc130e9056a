// C-compatible FFI bindings for Swift/iOS integration.
//
// Safety requirements:
// - All pointers must be non-null unless documented otherwise
// - All handles must be created by this module and not fabricated
// - Caller must call the corresponding _destroy function for each _create
// - A handle must only be used from the thread that created it

use std::ffi::c_char;

use crate::config::EngineConfig;
use crate::device::CpalDevice;
use crate::engine::{EngineState, PlaybackEngine, PlaybackStatus};
use crate::sample_buffer::SampleBuffer;

use log::{LevelFilter, error, info};
use oslog::OsLogger;

// Logger subsystem identifier
const LOG_SUBSYSTEM: &str = "com.trimloop.engine";

/// Return code: the call did something.
pub const TRIMLOOP_OK: i32 = 1;
/// Return code: precondition not met, nothing happened.
pub const TRIMLOOP_NOOP: i32 = 0;
/// Return code: the call failed (invalid buffer or output device error).
pub const TRIMLOOP_ERROR: i32 = -1;

// ═══════════════════════════════════════════════════════════════════════════
// Logger Initialization
// ═══════════════════════════════════════════════════════════════════════════

/// Initialize the oslog logger.
///
/// Call once at application startup before any other function. Records
/// appear in Console.app and Xcode's debug console.
#[unsafe(no_mangle)]
pub extern "C" fn trimloop_init_logger() {
    OsLogger::new(LOG_SUBSYSTEM)
        .level_filter(LevelFilter::Debug)
        .init()
        .ok();
}

// ═══════════════════════════════════════════════════════════════════════════
// Opaque Handle / Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Opaque handle to a playback engine on the default output device.
pub struct TrimloopEngine {
    inner: PlaybackEngine<CpalDevice>,
}

/// Engine state for UI display.
#[repr(C)]
pub struct TrimloopReadback {
    /// 0 = idle, 1 = playing, 2 = stopped
    pub status: u8,
    pub speed: f32,
    pub gain: f32,
    pub reverse: bool,
    pub looping: bool,
    pub has_window: bool,
    pub window_start: f64,
    pub window_end: f64,
    pub position: f64,
}

impl From<EngineState> for TrimloopReadback {
    fn from(s: EngineState) -> Self {
        Self {
            status: match s.status {
                PlaybackStatus::Idle => 0,
                PlaybackStatus::Playing => 1,
                PlaybackStatus::Stopped => 2,
            },
            speed: s.speed,
            gain: s.gain,
            reverse: s.reverse,
            looping: s.looping,
            has_window: s.window.is_some(),
            window_start: s.window.map(|w| w.start_seconds()).unwrap_or(0.0),
            window_end: s.window.map(|w| w.end_seconds()).unwrap_or(0.0),
            position: s.position_seconds,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Creation
// ═══════════════════════════════════════════════════════════════════════════

/// Create an engine with the default configuration.
///
/// Returns an opaque pointer that must be freed with `trimloop_destroy`.
#[unsafe(no_mangle)]
pub extern "C" fn trimloop_create() -> *mut TrimloopEngine {
    let engine = PlaybackEngine::with_config(CpalDevice::new(), EngineConfig::default());
    Box::into_raw(Box::new(TrimloopEngine { inner: engine }))
}

/// Create an engine bound to a named output device.
///
/// # Safety
/// `device_name` must be a valid null-terminated UTF-8 string or NULL
/// (NULL selects the default device).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_create_with_device(
    device_name: *const c_char,
) -> *mut TrimloopEngine {
    let device = if device_name.is_null() {
        CpalDevice::new()
    } else {
        match unsafe { std::ffi::CStr::from_ptr(device_name) }.to_str() {
            Ok(name) => CpalDevice::with_device_name(name),
            Err(_) => CpalDevice::new(),
        }
    };
    let engine = PlaybackEngine::with_config(device, EngineConfig::default());
    Box::into_raw(Box::new(TrimloopEngine { inner: engine }))
}

/// Destroy an engine, stopping playback.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_destroy(engine: *mut TrimloopEngine) {
    if !engine.is_null() {
        unsafe { drop(Box::from_raw(engine)) };
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Recording Ingestion
// ═══════════════════════════════════════════════════════════════════════════

/// Load a decoded recording given as planar samples
/// (`channels * frames` floats, channel after channel).
///
/// # Safety
/// `samples` must point to `channels * frames` readable floats.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_load_planar(
    engine: *mut TrimloopEngine,
    sample_rate: u32,
    channels: u32,
    frames: u32,
    samples: *const f32,
) -> i32 {
    if engine.is_null() || samples.is_null() {
        return TRIMLOOP_ERROR;
    }
    let len = channels as usize * frames as usize;
    let data = unsafe { std::slice::from_raw_parts(samples, len) }.to_vec();

    match SampleBuffer::from_planar(sample_rate, channels as usize, data) {
        Ok(buffer) => {
            unsafe { (*engine).inner.load(buffer) };
            TRIMLOOP_OK
        }
        Err(e) => {
            error!("trimloop_load_planar: {}", e);
            TRIMLOOP_ERROR
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Transport
// ═══════════════════════════════════════════════════════════════════════════

/// Start playback. Returns OK, NOOP (nothing loaded) or ERROR (device).
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_play(engine: *mut TrimloopEngine) -> i32 {
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    match unsafe { (*engine).inner.play() } {
        Ok(true) => TRIMLOOP_OK,
        Ok(false) => TRIMLOOP_NOOP,
        Err(e) => {
            error!("trimloop_play: {}", e);
            TRIMLOOP_ERROR
        }
    }
}

/// Stop playback.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_stop(engine: *mut TrimloopEngine) {
    if engine.is_null() {
        return;
    }
    unsafe { (*engine).inner.stop() };
}

/// Handle pending end-of-buffer notifications. Call from the UI run loop
/// (e.g. a display link).
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_poll(engine: *mut TrimloopEngine) -> i32 {
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    match unsafe { (*engine).inner.poll() } {
        Ok(()) => TRIMLOOP_OK,
        Err(e) => {
            error!("trimloop_poll: loop restart failed: {}", e);
            TRIMLOOP_ERROR
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Parameters
// ═══════════════════════════════════════════════════════════════════════════

/// Set playback speed (clamped). Restarts playback if playing.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_set_speed(engine: *mut TrimloopEngine, value: f32) -> i32 {
    info!("trimloop_set_speed: {}", value);
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    match unsafe { (*engine).inner.set_speed(value) } {
        Ok(()) => TRIMLOOP_OK,
        Err(e) => {
            error!("trimloop_set_speed: {}", e);
            TRIMLOOP_ERROR
        }
    }
}

/// Set output gain (clamped). Restarts playback if playing.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_set_gain(engine: *mut TrimloopEngine, value: f32) -> i32 {
    info!("trimloop_set_gain: {}", value);
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    match unsafe { (*engine).inner.set_gain(value) } {
        Ok(()) => TRIMLOOP_OK,
        Err(e) => {
            error!("trimloop_set_gain: {}", e);
            TRIMLOOP_ERROR
        }
    }
}

/// Enable or disable reverse. Returns NOOP while playing.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_set_reverse(engine: *mut TrimloopEngine, value: bool) -> i32 {
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    if unsafe { (*engine).inner.set_reverse(value) } {
        TRIMLOOP_OK
    } else {
        TRIMLOOP_NOOP
    }
}

/// Enable or disable looping. Returns NOOP while playing.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_set_loop(engine: *mut TrimloopEngine, value: bool) -> i32 {
    if engine.is_null() {
        return TRIMLOOP_ERROR;
    }
    if unsafe { (*engine).inner.set_loop(value) } {
        TRIMLOOP_OK
    } else {
        TRIMLOOP_NOOP
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Readback
// ═══════════════════════════════════════════════════════════════════════════

/// Current engine state. A null handle reads as idle defaults.
///
/// # Safety
/// `engine` must be a valid pointer returned by `trimloop_create` or NULL.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn trimloop_readback(engine: *const TrimloopEngine) -> TrimloopReadback {
    if engine.is_null() {
        return TrimloopReadback {
            status: 0,
            speed: 1.0,
            gain: 1.0,
            reverse: false,
            looping: false,
            has_window: false,
            window_start: 0.0,
            window_end: 0.0,
            position: 0.0,
        };
    }
    unsafe { (*engine).inner.state() }.into()
}
