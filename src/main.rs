// src/main.rs

use trimloop::{
    BufferError, EngineConfig, EngineError, OfflineDevice, PlaybackEngine, SampleBuffer,
};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_FRAMES: usize = 256;

/// ===============================
/// Stand-in recording
/// ===============================

/// Half a second of silence, a one second 440 Hz tone, half a second of
/// silence; stereo with the right channel at half level.
fn synth_recording() -> Result<SampleBuffer, BufferError> {
    let silence = SAMPLE_RATE as usize / 2;
    let tone = SAMPLE_RATE as usize;

    let mut left = vec![0.0f32; silence * 2 + tone];
    for (i, sample) in left[silence..silence + tone].iter_mut().enumerate() {
        let t = i as f32 / SAMPLE_RATE as f32;
        *sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5;
    }
    let right: Vec<f32> = left.iter().map(|s| s * 0.5).collect();

    SampleBuffer::from_channels(SAMPLE_RATE, vec![left, right])
}

/// Render blocks until the engine leaves Playing or `max_blocks` is hit.
/// Returns (frames rendered, peak level).
fn run_offline(
    engine: &mut PlaybackEngine<OfflineDevice>,
    max_blocks: usize,
) -> (usize, f32) {
    let mut frames = 0;
    let mut peak = 0.0f32;

    for _ in 0..max_blocks {
        if !engine.is_playing() {
            break;
        }
        let block = engine.device_mut().render(BLOCK_FRAMES);
        peak = block.iter().fold(peak, |p, s| p.max(s.abs()));
        frames += BLOCK_FRAMES;

        if let Err(e) = engine.poll() {
            println!("Loop restart failed: {e}");
            break;
        }
    }
    (frames, peak)
}

/// ===============================
/// Main
/// ===============================

fn main() -> Result<(), EngineError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("Starting engine sanity test…");

    let device = OfflineDevice::new(SAMPLE_RATE, 2);
    let mut engine = PlaybackEngine::with_config(device, EngineConfig::default());

    // Nothing loaded yet: benign no-op
    match engine.play() {
        Ok(started) => println!("play() before load -> started: {started}"),
        Err(e) => println!("play() before load failed: {e}"),
    }

    engine.load(synth_recording()?);
    if let Some(window) = engine.window() {
        println!(
            "Trim window: {:.3}s .. {:.3}s ({:.3}s)",
            window.start_seconds(),
            window.end_seconds(),
            window.duration_seconds()
        );
    }

    // --------------------------------
    // Plain playback
    // --------------------------------
    engine.play()?;
    let (frames, peak) = run_offline(&mut engine, 10_000);
    println!(
        "Normal: {} frames, peak {:.3}, status {:?}",
        frames,
        peak,
        engine.status()
    );

    // --------------------------------
    // Double speed, half gain, reversed
    // --------------------------------
    engine.set_reverse(true);
    engine.set_speed(2.0)?;
    engine.set_gain(0.5)?;
    engine.play()?;
    let (frames, peak) = run_offline(&mut engine, 10_000);
    println!(
        "Reverse 2x @ 0.5: {} frames, peak {:.3}, status {:?}",
        frames,
        peak,
        engine.status()
    );

    // --------------------------------
    // Looping, stopped by hand
    // --------------------------------
    engine.set_loop(true);
    engine.play()?;
    let (frames, _) = run_offline(&mut engine, 1_000);
    engine.stop();
    engine.poll()?;
    println!(
        "Loop: {} frames over {} connections (max concurrent {}), status {:?}",
        frames,
        engine.device().opened_total(),
        engine.device().max_concurrent(),
        engine.status()
    );

    #[cfg(feature = "cpal")]
    play_on_hardware()?;

    println!("Sanity test completed.");
    Ok(())
}

/// Play the recording once, then a short loop, on the default output.
#[cfg(feature = "cpal")]
fn play_on_hardware() -> Result<(), EngineError> {
    use std::time::{Duration, Instant};
    use trimloop::CpalDevice;

    match CpalDevice::list_devices() {
        Ok(names) => println!("Output devices: {}", names.join(", ")),
        Err(e) => println!("Could not list output devices: {e}"),
    }

    let mut engine = PlaybackEngine::new(CpalDevice::new());
    engine.load(synth_recording()?);

    match engine.play() {
        Ok(_) => println!("Playing on default output device"),
        Err(e) => {
            println!("No hardware playback: {e}");
            return Ok(());
        }
    }

    let started = Instant::now();
    while engine.is_playing() && started.elapsed() < Duration::from_secs(5) {
        std::thread::sleep(Duration::from_millis(16));
        if let Err(e) = engine.poll() {
            println!("poll failed: {e}");
            break;
        }
    }

    engine.set_loop(true);
    engine.set_speed(1.5)?;
    engine.play()?;
    let started = Instant::now();
    while started.elapsed() < Duration::from_secs(3) {
        std::thread::sleep(Duration::from_millis(16));
        engine.poll()?;
    }
    engine.stop();

    println!("Hardware playback finished: {:?}", engine.status());
    Ok(())
}
