use core::fmt;

/// Everything that can be wrong with a pipeline configuration.
///
/// These are all caught before acquisition or synthesis starts. Runtime conditions such as a
/// dropped sample generation are counted instead of reported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigurationError {
    /// The FFT needs a power of two number of samples.
    BufferSizeNotPowerOfTwo(usize),
    /// The configured buffer size differs from the one the buffers were built with.
    BufferSizeMismatch { configured: usize, actual: usize },
    ZeroRate,
    /// A requested frequency would alias at the rate it is sampled or synthesized at.
    AliasingFrequency { frequency: f32, limit: f32 },
    InvalidFrequencyRange { min: f32, max: f32 },
    InvalidThreshold,
    /// The tick timer could not be started at the requested rate.
    TimerStart,
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferSizeNotPowerOfTwo(size) => {
                write!(f, "buffer size {} is not a power of two", size)
            }
            Self::BufferSizeMismatch { configured, actual } => write!(
                f,
                "configured for {} samples but buffers hold {}",
                configured, actual
            ),
            Self::ZeroRate => f.write_str("rate must be above 0 Hz"),
            Self::AliasingFrequency { frequency, limit } => write!(
                f,
                "frequency {} Hz aliases, must stay below {} Hz",
                frequency, limit
            ),
            Self::InvalidFrequencyRange { min, max } => {
                write!(f, "invalid frequency range {}..{} Hz", min, max)
            }
            Self::InvalidThreshold => f.write_str("magnitude thresholds out of range"),
            Self::TimerStart => f.write_str("tick timer failed to start"),
        }
    }
}
