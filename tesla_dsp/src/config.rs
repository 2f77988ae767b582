//! Runtime representation of the pipeline settings.
//!
//! The firmware keeps its settings as constants and builds a [`PipelineConfig`] out of them at
//! boot, so a bad combination is caught by [`PipelineConfig::validate`] before any timer runs.
use fugit::{HertzU32, RateExtU32};

use crate::error::ConfigurationError;

/// Midpoint of a 12 bit converter, maps a raw sample onto `-1.0..1.0`.
pub const DEFAULT_MIDSCALE: f32 = 2048.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquisitionConfig {
    pub sample_rate: HertzU32,
    pub buffer_size: usize,
    pub midscale: f32,
}

impl AcquisitionConfig {
    pub fn new(sample_rate: HertzU32, buffer_size: usize) -> Result<Self, ConfigurationError> {
        let config = Self {
            sample_rate,
            buffer_size,
            midscale: DEFAULT_MIDSCALE,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_midscale(self, midscale: f32) -> Self {
        Self { midscale, ..self }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sample_rate.to_Hz() == 0 {
            return Err(ConfigurationError::ZeroRate);
        }
        check_power_of_two(self.buffer_size)?;
        if !(self.midscale > 0.0) {
            return Err(ConfigurationError::InvalidThreshold);
        }
        Ok(())
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width(&self) -> f32 {
        self.sample_rate.to_Hz() as f32 / self.buffer_size as f32
    }

    pub fn nyquist(&self) -> f32 {
        self.sample_rate.to_Hz() as f32 / 2.0
    }

    /// How many complete generations the producer hands over each second.
    pub fn generations_per_sec(&self) -> f32 {
        self.sample_rate.to_Hz() as f32 / self.buffer_size as f32
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_rate: 8_000.Hz(),
            buffer_size: 256,
            midscale: DEFAULT_MIDSCALE,
        }
    }
}

/// Acceptance rules for a spectral peak. All comparisons are strict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakThresholds {
    pub min_freq: f32,
    pub max_freq: f32,
    /// Absolute magnitude a bin has to beat.
    pub abs_floor: f32,
    /// Fraction of the strongest bin of the same pass a bin has to beat.
    pub rel_fraction: f32,
}

impl PeakThresholds {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(self.min_freq >= 0.0 && self.min_freq < self.max_freq) {
            return Err(ConfigurationError::InvalidFrequencyRange {
                min: self.min_freq,
                max: self.max_freq,
            });
        }
        if !(self.abs_floor >= 0.0) || !(0.0..=1.0).contains(&self.rel_fraction) {
            return Err(ConfigurationError::InvalidThreshold);
        }
        Ok(())
    }
}

impl Default for PeakThresholds {
    fn default() -> Self {
        Self {
            min_freq: 100.0,
            max_freq: 2_000.0,
            abs_floor: 10.0,
            rel_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisConfig {
    pub synthesis_rate: HertzU32,
}

impl SynthesisConfig {
    pub fn new(synthesis_rate: HertzU32) -> Result<Self, ConfigurationError> {
        if synthesis_rate.to_Hz() == 0 {
            return Err(ConfigurationError::ZeroRate);
        }
        Ok(Self { synthesis_rate })
    }

    pub fn rate_hz(&self) -> f32 {
        self.synthesis_rate.to_Hz() as f32
    }

    /// Oscillators at or above this frequency would alias against the tick rate.
    pub fn aliasing_limit(&self) -> f32 {
        self.rate_hz() / 2.0
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            synthesis_rate: 100.kHz(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineConfig {
    pub acquisition: AcquisitionConfig,
    pub peaks: PeakThresholds,
    pub synthesis: SynthesisConfig,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.acquisition.validate()?;
        self.peaks.validate()?;
        if self.synthesis.synthesis_rate.to_Hz() == 0 {
            return Err(ConfigurationError::ZeroRate);
        }

        let limit = self.synthesis.aliasing_limit().min(self.acquisition.nyquist());
        if self.peaks.max_freq >= limit {
            return Err(ConfigurationError::AliasingFrequency {
                frequency: self.peaks.max_freq,
                limit,
            });
        }
        Ok(())
    }
}

pub(crate) fn check_power_of_two(size: usize) -> Result<(), ConfigurationError> {
    if size.is_power_of_two() {
        Ok(())
    } else {
        Err(ConfigurationError::BufferSizeNotPowerOfTwo(size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.acquisition.bin_width(), 31.25);
        assert_eq!(config.synthesis.aliasing_limit(), 50_000.0);
    }

    #[test]
    fn rejects_non_power_of_two_buffer() {
        assert_eq!(
            AcquisitionConfig::new(8_000.Hz(), 250),
            Err(ConfigurationError::BufferSizeNotPowerOfTwo(250))
        );
        assert_eq!(
            AcquisitionConfig::new(8_000.Hz(), 0),
            Err(ConfigurationError::BufferSizeNotPowerOfTwo(0))
        );
        assert!(AcquisitionConfig::new(8_000.Hz(), 512).is_ok());
    }

    #[test]
    fn rejects_zero_rates() {
        assert_eq!(
            AcquisitionConfig::new(0.Hz(), 256),
            Err(ConfigurationError::ZeroRate)
        );
        assert_eq!(
            SynthesisConfig::new(0.Hz()),
            Err(ConfigurationError::ZeroRate)
        );
    }

    #[test]
    fn rejects_aliasing_max_frequency() {
        let config = PipelineConfig {
            synthesis: SynthesisConfig {
                synthesis_rate: 3_000.Hz(),
            },
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigurationError::AliasingFrequency {
                frequency: 2_000.0,
                limit: 1_500.0
            })
        );

        let config = PipelineConfig {
            acquisition: AcquisitionConfig::new(4_000.Hz(), 256).unwrap(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::AliasingFrequency { .. })
        ));
    }

    #[test]
    fn rejects_bad_thresholds() {
        let inverted = PeakThresholds {
            min_freq: 500.0,
            max_freq: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(ConfigurationError::InvalidFrequencyRange { .. })
        ));

        let fraction = PeakThresholds {
            rel_fraction: 1.5,
            ..Default::default()
        };
        assert_eq!(fraction.validate(), Err(ConfigurationError::InvalidThreshold));

        let floor = PeakThresholds {
            abs_floor: -1.0,
            ..Default::default()
        };
        assert_eq!(floor.validate(), Err(ConfigurationError::InvalidThreshold));
    }
}
