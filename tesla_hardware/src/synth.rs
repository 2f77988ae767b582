use fugit::HertzU32;
use stm32f4xx_hal::{
    ClearFlags, Listen,
    gpio::{Output, PushPull, PB0},
    pac::TIM5,
    timer::{CounterHz, Error, Event, Flag},
};
use tesla_dsp::{ConfigurationError, TickTimer};

/// Drives the interrupter input of the coil driver.
pub type SynthPin = PB0<Output<PushPull>>;

/// TIM5 update interrupt as the synthesis tick source.
pub struct SynthTimer(CounterHz<TIM5>);

impl SynthTimer {
    pub fn new(mut counter: CounterHz<TIM5>) -> Self {
        counter.listen(Event::Update);
        Self(counter)
    }

    /// Clear the update flag, first thing in the TIM5 handler.
    pub fn acknowledge(&mut self) {
        self.0.clear_flags(Flag::Update);
    }

    /// Poll for the next update without an interrupt handler.
    pub fn wait(&mut self) -> nb::Result<(), Error> {
        self.0.wait()
    }
}

impl TickTimer for SynthTimer {
    fn start_ticking(&mut self, rate: HertzU32) -> Result<(), ConfigurationError> {
        self.0.start(rate).map_err(|_| ConfigurationError::TimerStart)
    }
}
