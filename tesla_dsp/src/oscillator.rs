//! Phase accumulator square wave oscillators.
use crate::config::SynthesisConfig;
use crate::peaks::PeakSlots;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Oscillator {
    frequency: f32,
    /// Always in `0.0..1.0`.
    phase: f32,
    active: bool,
    increment: f32,
}

impl Oscillator {
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// High during the first half of each cycle.
    pub fn level(&self) -> bool {
        self.active && self.phase < 0.5
    }
}

/// A fixed set of oscillators whose outputs are OR-ed into a single pin level.
pub struct OscillatorBank<const N: usize> {
    oscillators: [Oscillator; N],
    synthesis_rate: f32,
}

impl<const N: usize> OscillatorBank<N> {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            oscillators: [Oscillator::default(); N],
            synthesis_rate: config.rate_hz(),
        }
    }

    /// Retune every slot from a peak pass.
    ///
    /// Phase is never touched, so a tone that is held across passes keeps running without a
    /// glitch. A frequency that cannot be synthesized (0 Hz, at or over half the tick rate, NaN)
    /// leaves its slot inactive.
    pub fn reconfigure(&mut self, peaks: &PeakSlots<N>) {
        let limit = self.synthesis_rate / 2.0;
        for (osc, peak) in self.oscillators.iter_mut().zip(peaks) {
            match peak {
                Some(peak) if peak.frequency > 0.0 && peak.frequency < limit => {
                    osc.frequency = peak.frequency;
                    osc.increment = peak.frequency / self.synthesis_rate;
                    osc.active = true;
                }
                _ => osc.active = false,
            }
        }
    }

    /// Advance every active oscillator by one tick and return the combined level.
    pub fn advance_and_sample(&mut self) -> bool {
        let mut level = false;
        for osc in self.oscillators.iter_mut().filter(|o| o.active) {
            osc.phase += osc.increment;
            if osc.phase >= 1.0 {
                osc.phase -= 1.0;
            }
            level |= osc.phase < 0.5;
        }
        level
    }

    pub fn active_count(&self) -> usize {
        self.oscillators.iter().filter(|o| o.active).count()
    }

    pub fn oscillators(&self) -> &[Oscillator; N] {
        &self.oscillators
    }

    pub fn synthesis_rate(&self) -> f32 {
        self.synthesis_rate
    }
}
