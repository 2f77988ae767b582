//! Hardware independent half of the Tesla coil synthesizer.
//!
//! Samples come in through a [`SampleBuffer`](acquisition::SampleBuffer), get turned into a
//! spectrum by the [`fft`] module, the loudest bins are picked by [`peaks`] and finally a bank of
//! square wave oscillators ([`oscillator`]) is driven at a fixed tick rate by the
//! [`scheduler`]. Nothing in here touches registers, so everything can be tested on the host.
#![no_std]

pub mod acquisition;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod fft;
pub mod oscillator;
pub mod peaks;
pub mod scheduler;

pub use acquisition::{Deposit, Sample, SampleBuffer};
pub use analyzer::SpectrumAnalyzer;
pub use config::{AcquisitionConfig, PeakThresholds, PipelineConfig, SynthesisConfig};
pub use error::ConfigurationError;
pub use num_complex::Complex32;
pub use oscillator::{Oscillator, OscillatorBank};
pub use peaks::{FrequencyPeak, PeakSlots};
pub use scheduler::{SchedulerState, SynthesisScheduler, TickTimer, TuningSnapshot};

#[cfg(test)]
extern crate std;
