use stm32f4xx_hal::gpio::{Output, PushPull, PD12, PD14, PD15};

/// Lit while at least one oscillator is sounding.
pub type ActivityLed = PD12<Output<PushPull>>;
/// Latched on the first dropped sample generation.
pub type OverrunLed = PD14<Output<PushPull>>;
pub type HeartbeatLed = PD15<Output<PushPull>>;
