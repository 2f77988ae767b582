//! Build time settings of the firmware. Everything here goes through
//! [`PipelineConfig::validate`] at boot before any timer is started.

use fugit::HertzU32;
use log::Level;
use tesla_dsp::{
    AcquisitionConfig, ConfigurationError, PeakThresholds, PipelineConfig, SynthesisConfig,
};

pub const LOG_LEVEL: Level = Level::Info;

pub const SAMPLE_RATE: HertzU32 = HertzU32::Hz(8_000);
/// Samples per generation, also the FFT length.
pub const FFT_SIZE: usize = 256;
pub const OSCILLATORS: usize = 5;
pub const SYNTHESIS_RATE: HertzU32 = HertzU32::kHz(100);

pub const PEAK_THRESHOLDS: PeakThresholds = PeakThresholds {
    min_freq: 100.0,
    max_freq: 2_000.0,
    abs_floor: 10.0,
    rel_fraction: 0.5,
};

pub const HEARTBEAT_PERIOD_MS: u64 = 1_000;

pub fn pipeline() -> Result<PipelineConfig, ConfigurationError> {
    let config = PipelineConfig {
        acquisition: AcquisitionConfig::new(SAMPLE_RATE, FFT_SIZE)?,
        peaks: PEAK_THRESHOLDS,
        synthesis: SynthesisConfig::new(SYNTHESIS_RATE)?,
    };
    config.validate()?;
    Ok(config)
}

pub fn log_config(config: &PipelineConfig) {
    let acquisition = &config.acquisition;
    log::info!(
        "sampling at {} Hz into {} point generations ({} Hz per bin, {} generations/s)",
        acquisition.sample_rate.to_Hz(),
        acquisition.buffer_size,
        acquisition.bin_width(),
        acquisition.generations_per_sec()
    );
    log::info!(
        "peaks between {} and {} Hz, floor {}, relative {}",
        config.peaks.min_freq,
        config.peaks.max_freq,
        config.peaks.abs_floor,
        config.peaks.rel_fraction
    );
    log::info!(
        "{} oscillators ticking at {} Hz",
        OSCILLATORS,
        config.synthesis.synthesis_rate.to_Hz()
    );
    log::info!("audio in on PA1 (ADC1 IN1), coil out on PB0");
}
