//! Audio capture: TIM3 update events trigger ADC1, and DMA2 stream 0 moves every
//! conversion into a buffer. A transfer-complete interrupt fires once per
//! generation.

use stm32f4xx_hal::{
    adc::{
        config::{
            AdcConfig, Dma, ExternalTrigger, Resolution, SampleTime, Scan, Sequence, TriggerMode,
        },
        Adc,
    },
    dma::{config::DmaConfig, DMAError, PeripheralToMemory, Stream0, StreamsTuple, Transfer},
    gpio::{Analog, PA1},
    pac::{ADC1, DMA2, TIM3},
    timer::CounterHz,
};
use tesla_dsp::{AcquisitionConfig, ConfigurationError, Sample};

pub type AudioInPin = PA1<Analog>;

pub type SampleTransfer<const N: usize> =
    Transfer<Stream0<DMA2>, 0, Adc<ADC1>, PeripheralToMemory, &'static mut [Sample; N]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingError {
    /// The stream was still busy when the interrupt asked for the buffer.
    NotReady,
    /// DMA flagged an overrun or a short buffer.
    Transfer,
}

pub struct Sampling<const N: usize> {
    transfer: SampleTransfer<N>,
    spare: Option<&'static mut [Sample; N]>,
    trigger: CounterHz<TIM3>,
    _pin: AudioInPin,
}

impl<const N: usize> Sampling<N> {
    pub fn new(
        adc1: ADC1,
        pin: AudioInPin,
        dma2: DMA2,
        trigger: CounterHz<TIM3>,
        buffers: &'static mut [[Sample; N]; 2],
    ) -> Self {
        let adc_config = AdcConfig::default()
            .dma(Dma::Continuous)
            .scan(Scan::Disabled)
            .resolution(Resolution::Twelve)
            .external_trigger(TriggerMode::RisingEdge, ExternalTrigger::Tim_3_trgo);
        let mut adc = Adc::adc1(adc1, true, adc_config);
        adc.configure_channel(&pin, Sequence::One, SampleTime::Cycles_112);

        let [first, second] = buffers;
        let streams = StreamsTuple::new(dma2);
        let dma_config = DmaConfig::default()
            .transfer_complete_interrupt(true)
            .memory_increment(true)
            .double_buffer(false);
        let transfer = Transfer::init_peripheral_to_memory(streams.0, adc, first, None, dma_config);

        Self {
            transfer,
            spare: Some(second),
            trigger,
            _pin: pin,
        }
    }

    /// Arm the DMA stream and start clocking conversions at the configured rate.
    pub fn start(&mut self, config: &AcquisitionConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        if config.buffer_size != N {
            return Err(ConfigurationError::BufferSizeMismatch {
                configured: config.buffer_size,
                actual: N,
            });
        }

        self.transfer.start(|adc| adc.enable());
        self.trigger
            .start(config.sample_rate)
            .map_err(|_| ConfigurationError::TimerStart)?;

        // TRGO on every update event so each period fires exactly one conversion.
        // SAFETY: TIM3 is owned by `self.trigger`; CR2 is not touched by the HAL counter.
        unsafe {
            (*TIM3::ptr()).cr2.modify(|_, w| w.mms().update());
        }
        Ok(())
    }

    /// Swap the spare buffer in and hand the finished generation to `f`.
    ///
    /// Call from the DMA2_STREAM0 interrupt. The finished buffer becomes the
    /// next spare once `f` returns.
    pub fn next_generation<R>(
        &mut self,
        f: impl FnOnce(&[Sample; N]) -> R,
    ) -> Result<R, SamplingError> {
        let Some(spare) = self.spare.take() else {
            return Err(SamplingError::NotReady);
        };

        match self.transfer.next_transfer(spare) {
            Ok((full, _)) => {
                let result = f(full);
                self.spare = Some(full);
                Ok(result)
            }
            Err(DMAError::NotReady(spare)) => {
                self.spare = Some(spare);
                Err(SamplingError::NotReady)
            }
            Err(DMAError::SmallBuffer(spare)) | Err(DMAError::Overrun(spare)) => {
                self.spare = Some(spare);
                Err(SamplingError::Transfer)
            }
        }
    }
}
