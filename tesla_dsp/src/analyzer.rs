//! Turns one generation of raw samples into a set of peak slots.
use num_complex::Complex32;

use crate::acquisition::Sample;
use crate::config::PipelineConfig;
use crate::error::ConfigurationError;
use crate::fft;
use crate::peaks::{self, PeakSlots};

/// Owns the FFT scratch space for an `N` sample window and `S` oscillator slots.
pub struct SpectrumAnalyzer<const N: usize, const S: usize> {
    config: PipelineConfig,
    scratch: [Complex32; N],
    // Only the lower half is used, `N / 2` is not expressible as an array length here.
    magnitudes: [f32; N],
    // Cleared by `analyze`, the transform runs in place and can't be repeated.
    loaded: bool,
    relative_cutoff: f32,
    passes: u32,
}

impl<const N: usize, const S: usize> SpectrumAnalyzer<N, S> {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        if config.acquisition.buffer_size != N {
            return Err(ConfigurationError::BufferSizeMismatch {
                configured: config.acquisition.buffer_size,
                actual: N,
            });
        }

        Ok(Self {
            config,
            scratch: [Complex32::new(0.0, 0.0); N],
            magnitudes: [0.0; N],
            loaded: false,
            relative_cutoff: 0.0,
            passes: 0,
        })
    }

    /// Copy a generation into the scratch buffer, centred around zero and scaled to `-1.0..1.0`.
    ///
    /// Kept separate from [`analyze`](Self::analyze) so the caller can release the sample buffer
    /// right after the copy.
    pub fn load(&mut self, samples: &[Sample; N]) {
        let midscale = self.config.acquisition.midscale;
        for (slot, sample) in self.scratch.iter_mut().zip(samples) {
            *slot = Complex32::new((*sample as f32 - midscale) / midscale, 0.0);
        }
        self.loaded = true;
    }

    /// Transform the generation passed to [`load`](Self::load) and pick the peaks.
    ///
    /// Each load is analyzed once. Without a fresh load every slot comes back empty and the
    /// pass is not counted.
    pub fn analyze(&mut self) -> PeakSlots<S> {
        if !self.loaded {
            return [None; S];
        }
        self.loaded = false;

        fft::transform(&mut self.scratch);

        let half = N / 2;
        fft::magnitudes(&self.scratch, &mut self.magnitudes[..half]);

        let thresholds = &self.config.peaks;
        self.relative_cutoff =
            peaks::global_max(&self.magnitudes[..half]) * thresholds.rel_fraction;
        self.passes = self.passes.wrapping_add(1);

        peaks::extract_top_peaks(
            &mut self.magnitudes[..half],
            thresholds,
            self.config.acquisition.sample_rate.to_Hz() as f32,
            N,
        )
    }

    pub fn process(&mut self, samples: &[Sample; N]) -> PeakSlots<S> {
        self.load(samples);
        self.analyze()
    }

    /// Cutoff the relative threshold worked out to on the last pass.
    pub fn relative_cutoff(&self) -> f32 {
        self.relative_cutoff
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
