// src/params.rs
//
// Playback parameters and the range metadata used to clamp them.

use std::fmt;

/// Lowest playback rate any speed range may allow. A rate of zero would
/// never reach the end of the buffer.
pub const MIN_SPEED: f32 = 0.1;

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ParamUnit {
    #[default]
    None,
    /// Playback rate multiplier
    Ratio,
    /// Percentage (0-100)
    Percent,
}

impl fmt::Display for ParamUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamUnit::None => Ok(()),
            ParamUnit::Ratio => write!(f, "x"),
            ParamUnit::Percent => write!(f, "%"),
        }
    }
}

/// Range metadata for a continuous playback parameter.
///
/// Used by the engine to clamp incoming values and by a UI to
/// build its sliders.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRange {
    /// Human-readable name
    pub name: String,

    /// Minimum value
    pub min: f32,

    /// Maximum value
    pub max: f32,

    /// Default value
    pub default: f32,

    /// Slider step (0 = continuous)
    pub step: f32,

    /// Unit for display
    pub unit: ParamUnit,
}

impl ParamRange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0.0,
            max: 1.0,
            default: 0.0,
            step: 0.0,
            unit: ParamUnit::None,
        }
    }

    /// Playback speed: 0.4x to 2.0x in steps of 0.1.
    pub fn speed() -> Self {
        Self::new("Speed")
            .range(0.4, 2.0)
            .default(1.0)
            .step(0.1)
            .unit(ParamUnit::Ratio)
    }

    /// Linear output gain: 0.0 to 1.0 in steps of 0.01.
    pub fn gain() -> Self {
        Self::new("Volume")
            .range(0.0, 1.0)
            .default(1.0)
            .step(0.01)
            .unit(ParamUnit::Percent)
    }

    /// Set the bounds. Swapped bounds are put in order; NaN bounds are
    /// ignored.
    pub fn range(mut self, min: f32, max: f32) -> Self {
        if min.is_nan() || max.is_nan() {
            return self;
        }
        self.min = min.min(max);
        self.max = min.max(max);
        self
    }

    pub fn default(mut self, value: f32) -> Self {
        self.default = value;
        self
    }

    pub fn step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn unit(mut self, unit: ParamUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Clamp a value to the valid range. NaN falls back to the default.
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        let value = if value.is_nan() { self.default } else { value };
        value.max(self.min).min(self.max)
    }

    /// Format a value for display.
    pub fn format(&self, value: f32) -> String {
        match self.unit {
            ParamUnit::Percent => format!("{:.0}{}", value * 100.0, self.unit),
            ParamUnit::Ratio => format!("{:.1}{}", value, self.unit),
            ParamUnit::None => format!("{:.2}", value),
        }
    }
}

/// Configuration read by the engine each time playback starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackParameters {
    /// Play the trimmed region backwards.
    pub reverse: bool,

    /// Restart automatically at the end of the region.
    pub looping: bool,

    /// Playback rate multiplier (already clamped).
    pub speed: f32,

    /// Linear amplitude multiplier (already clamped).
    pub gain: f32,
}

impl PlaybackParameters {
    /// Defaults taken from the given ranges, flags off.
    pub fn from_ranges(speed: &ParamRange, gain: &ParamRange) -> Self {
        Self {
            reverse: false,
            looping: false,
            speed: speed.clamp(speed.default),
            gain: gain.clamp(gain.default),
        }
    }
}

impl Default for PlaybackParameters {
    fn default() -> Self {
        Self::from_ranges(&ParamRange::speed(), &ParamRange::gain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_clamped() {
        let speed = ParamRange::speed();
        assert_eq!(speed.clamp(3.0), 2.0);
        assert_eq!(speed.clamp(0.1), 0.4);
        assert_eq!(speed.clamp(1.3), 1.3);
        assert_eq!(speed.clamp(f32::NAN), 1.0);
    }

    #[test]
    fn test_inverted_range_is_reordered() {
        let speed = ParamRange::speed().range(2.0, 0.4);
        assert_eq!((speed.min, speed.max), (0.4, 2.0));
        assert_eq!(speed.clamp(5.0), 2.0);

        let unchanged = ParamRange::gain().range(f32::NAN, 0.5);
        assert_eq!((unchanged.min, unchanged.max), (0.0, 1.0));
    }

    #[test]
    fn test_clamp_tolerates_hand_built_inverted_bounds() {
        let mut gain = ParamRange::gain();
        gain.min = 1.0;
        gain.max = 0.0;
        // No panic; result stays finite
        assert!(gain.clamp(0.5).is_finite());
        assert!(gain.clamp(f32::NAN).is_finite());
    }

    #[test]
    fn test_format() {
        assert_eq!(ParamRange::gain().format(0.5), "50%");
        assert_eq!(ParamRange::speed().format(1.5), "1.5x");
    }

    #[test]
    fn test_default_parameters() {
        let params = PlaybackParameters::default();
        assert!(!params.reverse);
        assert!(!params.looping);
        assert_eq!(params.speed, 1.0);
        assert_eq!(params.gain, 1.0);
    }
}
