//! Fixed rate driver for the oscillator bank.
//!
//! The tick handler owns the [`SynthesisScheduler`]. The analysis side never touches the
//! oscillators directly, it publishes a whole [`TuningSnapshot`] and the next tick adopts it in
//! one go, so a tick can never see half of a retune.
use embedded_hal::digital::{OutputPin, PinState};
use fugit::HertzU32;

use crate::config::SynthesisConfig;
use crate::error::ConfigurationError;
use crate::oscillator::OscillatorBank;
use crate::peaks::PeakSlots;

/// Something that can call back periodically, usually a hardware timer interrupt.
pub trait TickTimer {
    fn start_ticking(&mut self, rate: HertzU32) -> Result<(), ConfigurationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Latest peak pass together with a revision so the tick side can tell it apart from the one
/// it already applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningSnapshot<const N: usize> {
    peaks: PeakSlots<N>,
    revision: u32,
}

impl<const N: usize> TuningSnapshot<N> {
    pub const fn new() -> Self {
        Self {
            peaks: [None; N],
            revision: 0,
        }
    }

    pub fn publish(&mut self, peaks: PeakSlots<N>) {
        self.peaks = peaks;
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn peaks(&self) -> &PeakSlots<N> {
        &self.peaks
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }
}

impl<const N: usize> Default for TuningSnapshot<N> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SynthesisScheduler<P, const N: usize> {
    bank: OscillatorBank<N>,
    pin: P,
    config: SynthesisConfig,
    state: SchedulerState,
    applied_revision: u32,
    ticks: u32,
}

impl<P: OutputPin, const N: usize> SynthesisScheduler<P, N> {
    pub fn new(pin: P, config: SynthesisConfig) -> Self {
        Self {
            bank: OscillatorBank::new(&config),
            pin,
            config,
            state: SchedulerState::Idle,
            applied_revision: 0,
            ticks: 0,
        }
    }

    /// Start the periodic tick. Calling it again once running does nothing.
    pub fn start<T: TickTimer>(&mut self, timer: &mut T) -> Result<(), ConfigurationError> {
        if self.state == SchedulerState::Running {
            return Ok(());
        }
        timer.start_ticking(self.config.synthesis_rate)?;
        self.state = SchedulerState::Running;
        Ok(())
    }

    /// Adopt `snapshot` if it is newer than what the bank is playing.
    pub fn sync(&mut self, snapshot: &TuningSnapshot<N>) {
        if snapshot.revision != self.applied_revision {
            self.bank.reconfigure(&snapshot.peaks);
            self.applied_revision = snapshot.revision;
        }
    }

    /// One synthesis tick: a single phase advance and a single pin write.
    ///
    /// Ticks that arrive before [`start`](Self::start) are ignored and leave the pin alone.
    pub fn on_tick(&mut self) -> Result<bool, P::Error> {
        if self.state == SchedulerState::Idle {
            return Ok(false);
        }
        let level = self.bank.advance_and_sample();
        self.pin.set_state(PinState::from(level))?;
        self.ticks = self.ticks.wrapping_add(1);
        Ok(level)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn bank(&self) -> &OscillatorBank<N> {
        &self.bank
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::peaks::FrequencyPeak;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use fugit::RateExtU32;
    use std::vec::Vec;

    #[derive(Default)]
    pub(crate) struct RecordingPin {
        pub writes: Vec<bool>,
    }

    impl ErrorType for RecordingPin {
        type Error = Infallible;
    }

    impl OutputPin for RecordingPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.writes.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.writes.push(true);
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeTimer {
        pub started: Option<HertzU32>,
        pub refuse: bool,
    }

    impl TickTimer for FakeTimer {
        fn start_ticking(&mut self, rate: HertzU32) -> Result<(), ConfigurationError> {
            if self.refuse {
                return Err(ConfigurationError::TimerStart);
            }
            self.started = Some(rate);
            Ok(())
        }
    }

    fn scheduler<const N: usize>() -> SynthesisScheduler<RecordingPin, N> {
        SynthesisScheduler::new(RecordingPin::default(), SynthesisConfig::default())
    }

    #[test]
    fn idle_ignores_ticks() {
        let mut scheduler = scheduler::<2>();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert_eq!(scheduler.on_tick(), Ok(false));
        assert!(scheduler.pin.writes.is_empty());
        assert_eq!(scheduler.ticks(), 0);
    }

    #[test]
    fn start_runs_timer_at_synthesis_rate() {
        let mut scheduler = scheduler::<2>();
        let mut timer = FakeTimer::default();
        scheduler.start(&mut timer).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert_eq!(timer.started, Some(100.kHz()));

        // Already running, the timer is left alone.
        let mut other = FakeTimer::default();
        scheduler.start(&mut other).unwrap();
        assert_eq!(other.started, None);
    }

    #[test]
    fn failed_start_stays_idle() {
        let mut scheduler = scheduler::<2>();
        let mut timer = FakeTimer {
            refuse: true,
            ..Default::default()
        };
        assert_eq!(
            scheduler.start(&mut timer),
            Err(ConfigurationError::TimerStart)
        );
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn one_write_per_tick() {
        let mut scheduler = scheduler::<3>();
        scheduler.start(&mut FakeTimer::default()).unwrap();
        let mut snapshot = TuningSnapshot::new();
        snapshot.publish([
            Some(FrequencyPeak {
                frequency: 1_000.0,
                magnitude: 50.0,
            }),
            None,
            None,
        ]);
        scheduler.sync(&snapshot);

        let mut levels = Vec::new();
        for _ in 0..100 {
            levels.push(scheduler.on_tick().unwrap());
        }
        assert_eq!(scheduler.ticks(), 100);
        assert_eq!(scheduler.pin.writes, levels);
        assert!(levels.iter().any(|l| *l) && levels.iter().any(|l| !*l));
    }

    #[test]
    fn silence_keeps_pin_low() {
        let mut scheduler = scheduler::<5>();
        scheduler.start(&mut FakeTimer::default()).unwrap();
        let mut snapshot = TuningSnapshot::new();
        snapshot.publish([None; 5]);
        scheduler.sync(&snapshot);

        for _ in 0..10 {
            assert_eq!(scheduler.on_tick(), Ok(false));
        }
        assert_eq!(scheduler.pin.writes, [false; 10]);
    }

    #[test]
    fn snapshot_applied_once_per_revision() {
        let mut scheduler = scheduler::<1>();
        scheduler.start(&mut FakeTimer::default()).unwrap();
        let mut snapshot = TuningSnapshot::new();
        snapshot.publish([Some(FrequencyPeak {
            frequency: 440.0,
            magnitude: 20.0,
        })]);

        scheduler.sync(&snapshot);
        for _ in 0..37 {
            scheduler.on_tick().unwrap();
            scheduler.sync(&snapshot);
        }
        let phase = scheduler.bank().oscillators()[0].phase();
        let expected = (37.0 * 440.0 / 100_000.0_f64) as f32;
        assert!((phase - expected).abs() < 1e-5);

        snapshot.publish([None]);
        scheduler.sync(&snapshot);
        assert_eq!(scheduler.bank().active_count(), 0);
        assert_eq!(scheduler.bank().oscillators()[0].phase(), phase);
    }
}
