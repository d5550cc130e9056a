// src/config.rs
//
// Engine configuration.

use crate::bounds::{BoundsDetector, DEFAULT_PADDING_SAMPLES, DEFAULT_SILENCE_THRESHOLD};
use crate::params::{MIN_SPEED, ParamRange};

/// What `stop()` does with the reverse/loop flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// Flags survive a stop; the next `play()` uses them again.
    #[default]
    PreserveFlags,

    /// Flags return to off on every explicit stop.
    ResetFlags,
}

/// Configuration for a [`PlaybackEngine`].
///
/// [`PlaybackEngine`]: crate::PlaybackEngine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Allowed speed range (default 0.4x - 2.0x).
    pub speed: ParamRange,

    /// Allowed gain range (default 0.0 - 1.0).
    pub gain: ParamRange,

    /// Absolute amplitude below which a sample counts as silence.
    pub silence_threshold: f32,

    /// Samples kept around detected sound when trimming.
    pub padding_samples: usize,

    /// Flag handling on explicit stop.
    pub stop_policy: StopPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            speed: ParamRange::speed(),
            gain: ParamRange::gain(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            padding_samples: DEFAULT_PADDING_SAMPLES,
            stop_policy: StopPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Speed bounds, reordered if swapped and floored at [`MIN_SPEED`].
    pub fn with_speed_range(mut self, min: f32, max: f32) -> Self {
        self.speed = self.speed.range(min, max);
        self.normalized()
    }

    /// Gain bounds, reordered if swapped and floored at 0.
    pub fn with_gain_range(mut self, min: f32, max: f32) -> Self {
        self.gain = self.gain.range(min, max);
        self.normalized()
    }

    /// Put both ranges in order and keep speed above zero and gain
    /// non-negative. Applied by the engine to any config it is given.
    pub fn normalized(mut self) -> Self {
        let (min, max) = (self.speed.min, self.speed.max);
        self.speed = self.speed.range(min.max(MIN_SPEED), max.max(MIN_SPEED));
        let (min, max) = (self.gain.min, self.gain.max);
        self.gain = self.gain.range(min.max(0.0), max.max(0.0));
        self
    }

    pub fn with_silence_threshold(mut self, threshold: f32) -> Self {
        self.silence_threshold = threshold;
        self
    }

    pub fn with_padding(mut self, samples: usize) -> Self {
        self.padding_samples = samples;
        self
    }

    pub fn with_stop_policy(mut self, policy: StopPolicy) -> Self {
        self.stop_policy = policy;
        self
    }

    /// Detector using this config's threshold and padding.
    pub fn detector(&self) -> BoundsDetector {
        BoundsDetector::new(self.silence_threshold, self.padding_samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swapped_speed_range_reordered() {
        let config = EngineConfig::default().with_speed_range(2.0, 0.4);
        assert_eq!((config.speed.min, config.speed.max), (0.4, 2.0));
    }

    #[test]
    fn test_speed_range_floored_above_zero() {
        let config = EngineConfig::default().with_speed_range(0.0, 2.0);
        assert_eq!(config.speed.min, MIN_SPEED);
        assert_eq!(config.speed.clamp(0.0), MIN_SPEED);

        let config = EngineConfig::default().with_speed_range(-1.0, -0.5);
        assert_eq!((config.speed.min, config.speed.max), (MIN_SPEED, MIN_SPEED));
    }

    #[test]
    fn test_normalized_fixes_hand_built_ranges() {
        let mut config = EngineConfig::default();
        config.speed.min = 0.0;
        config.gain.min = 1.0;
        config.gain.max = -1.0;

        let config = config.normalized();
        assert_eq!(config.speed.min, MIN_SPEED);
        assert_eq!((config.gain.min, config.gain.max), (0.0, 1.0));
    }
}
