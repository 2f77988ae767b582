#![no_std]

use stm32f4xx_hal::{
    pac::Peripherals,
    prelude::*,
    rcc::Clocks,
    serial::config::InvalidConfig,
};
use tesla_dsp::Sample;

pub mod led;
pub mod sampling;
pub mod serial;
pub mod synth;

use led::{ActivityLed, HeartbeatLed, OverrunLed};
use sampling::Sampling;
use serial::DebugSerialPort;
use synth::{SynthPin, SynthTimer};

/// Core clock the rest of the board is derived from.
pub const SYSCLK_HZ: u32 = 168_000_000;

pub struct TeslaHardware<const N: usize> {
    pub clocks: Clocks,
    pub activity_led: ActivityLed,
    pub overrun_led: OverrunLed,
    pub heartbeat_led: HeartbeatLed,

    pub dbg_serial: DebugSerialPort,

    pub synth_pin: SynthPin,
    pub synth_timer: SynthTimer,
    pub sampling: Sampling<N>,
}

impl<const N: usize> TeslaHardware<N> {
    /// Bring up clocks, pins and peripherals. Nothing is started yet: sampling and
    /// the synthesis timer wait for their `start` calls.
    pub fn init(
        pac: Peripherals,
        dma_buffers: &'static mut [[Sample; N]; 2],
    ) -> Result<Self, InvalidConfig> {
        // set DBGMCU to allow wfi in idle while a probe is attached
        pac.DBGMCU.cr.modify(|_, w| {
            w.dbg_sleep().set_bit();
            w.dbg_standby().set_bit();
            w.dbg_stop().set_bit()
        });
        // enabling the dma1 clock keeps one AHB bus master active, which prevents SRAM from reading as 0's
        // https://github.com/probe-rs/probe-rs/issues/350#issuecomment-740550519
        pac.RCC.ahb1enr.modify(|_, w| w.dma1en().enabled());

        let rcc = pac.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(8.MHz())
            .sysclk(SYSCLK_HZ.Hz())
            .pclk1(42.MHz())
            .freeze();

        let gpioa = pac.GPIOA.split();
        let gpiob = pac.GPIOB.split();
        let gpiod = pac.GPIOD.split();

        // Status LED's
        let activity_led = gpiod.pd12.into_push_pull_output();
        let overrun_led = gpiod.pd14.into_push_pull_output();
        let heartbeat_led = gpiod.pd15.into_push_pull_output();

        let debug_tx_pin = gpioa.pa9.into_alternate();
        let dbg_serial = pac.USART1.tx(debug_tx_pin, 115200.bps(), &clocks)?;

        let mut synth_pin = gpiob.pb0.into_push_pull_output();
        synth_pin.set_low();
        let synth_timer = SynthTimer::new(pac.TIM5.counter_hz(&clocks));

        let sampling = Sampling::new(
            pac.ADC1,
            gpioa.pa1.into_analog(),
            pac.DMA2,
            pac.TIM3.counter_hz(&clocks),
            dma_buffers,
        );

        Ok(Self {
            clocks,
            activity_led,
            overrun_led,
            heartbeat_led,
            dbg_serial,
            synth_pin,
            synth_timer,
            sampling,
        })
    }
}
