//! Plays a fixed 440 Hz + 660 Hz chord on PB0 with no sampling front end.
//! Handy for checking the coil driver without a signal source.

#![no_std]
#![no_main]

use panic_halt as _;

use cortex_m_rt::entry;
use stm32f4xx_hal::{pac, prelude::*};
use tesla_dsp::{FrequencyPeak, SynthesisConfig, SynthesisScheduler, TuningSnapshot};
use tesla_hardware::synth::SynthTimer;

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();

    let rcc = dp.RCC.constrain();
    let clocks = rcc
        .cfgr
        .use_hse(8.MHz())
        .sysclk(168.MHz())
        .pclk1(42.MHz())
        .freeze();

    let gpiob = dp.GPIOB.split();
    let synth_pin = gpiob.pb0.into_push_pull_output();
    let mut timer = SynthTimer::new(dp.TIM5.counter_hz(&clocks));

    let mut scheduler = SynthesisScheduler::<_, 2>::new(synth_pin, SynthesisConfig::default());

    let mut tuning = TuningSnapshot::new();
    tuning.publish([
        Some(FrequencyPeak {
            frequency: 440.0,
            magnitude: 1.0,
        }),
        Some(FrequencyPeak {
            frequency: 660.0,
            magnitude: 1.0,
        }),
    ]);
    scheduler.sync(&tuning);
    scheduler.start(&mut timer).unwrap();

    loop {
        nb::block!(timer.wait()).unwrap();
        scheduler.on_tick().unwrap();
    }
}
