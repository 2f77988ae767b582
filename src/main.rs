#![no_std]
#![no_main]

mod config;
mod logging;

#[cfg(feature = "defmt_logger")]
use panic_probe as _;

#[cfg(all(feature = "serial_logger", not(feature = "defmt_logger")))]
use panic_halt as _;

use tesla_dsp::ConfigurationError;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Running totals the heartbeat reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub passes: u32,
    pub active: usize,
    pub dma_faults: u32,
}

/// Log a bring-up failure before going down with it.
fn checked<T>(what: &str, result: Result<T, ConfigurationError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::error!("{}: {}", what, e);
            panic!("{} failed", what);
        }
    }
}

#[rtic::app(device = stm32f4xx_hal::pac, dispatchers = [USART2, USART3])]
mod app {
    use super::*;

    use config::{FFT_SIZE, OSCILLATORS};
    use fugit::ExtU64;
    use log::{debug, info, warn};
    use rtic_monotonics::stm32::Tim2;
    use rtic_sync::{
        channel::{Receiver, Sender},
        make_channel,
    };
    use tesla_dsp::{
        peaks, Deposit, Sample, SampleBuffer, SpectrumAnalyzer, SynthesisScheduler, TuningSnapshot,
    };
    use tesla_hardware::{
        led::{ActivityLed, HeartbeatLed, OverrunLed},
        sampling::Sampling,
        synth::{SynthPin, SynthTimer},
        TeslaHardware,
    };

    /// A full channel already means a wakeup is pending.
    const READY_CAPACITY: usize = 1;

    #[shared]
    struct Shared {
        samples: SampleBuffer<FFT_SIZE>,
        tuning: TuningSnapshot<OSCILLATORS>,
        stats: Stats,
    }

    #[local]
    struct Local {
        scheduler: SynthesisScheduler<SynthPin, OSCILLATORS>,
        synth_timer: SynthTimer,
        sampling: Sampling<FFT_SIZE>,
        ready_tx: Sender<'static, (), READY_CAPACITY>,
        analyzer: SpectrumAnalyzer<FFT_SIZE, OSCILLATORS>,
        activity_led: ActivityLed,
        overrun_led: OverrunLed,
        heartbeat_led: HeartbeatLed,
    }

    #[init(local = [dma_buffers: [[Sample; FFT_SIZE]; 2] = [[0; FFT_SIZE]; 2]])]
    fn init(cx: init::Context) -> (Shared, Local) {
        let mut hw = TeslaHardware::init(cx.device, cx.local.dma_buffers).unwrap();

        #[cfg(feature = "serial_logger")]
        logging::serial_logger::init(hw.dbg_serial);
        logging::init(config::LOG_LEVEL).unwrap();

        info!("{} v{}", NAME, VERSION);

        let pipeline = checked("configuration", config::pipeline());
        config::log_config(&pipeline);

        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Tim2::start(hw.clocks.timclk1().raw(), token);

        let samples = checked("sample buffer", SampleBuffer::new());
        let analyzer = checked("analyzer", SpectrumAnalyzer::new(pipeline));

        let mut scheduler = SynthesisScheduler::new(hw.synth_pin, pipeline.synthesis);
        checked("synthesis timer", scheduler.start(&mut hw.synth_timer));
        checked("acquisition", hw.sampling.start(&pipeline.acquisition));

        let (ready_tx, ready_rx) = make_channel!((), READY_CAPACITY);
        if analyze::spawn(ready_rx).is_err() {
            panic!("analyze already running");
        }
        heartbeat::spawn().unwrap();

        (
            Shared {
                samples,
                tuning: TuningSnapshot::new(),
                stats: Stats::default(),
            },
            Local {
                scheduler,
                synth_timer: hw.synth_timer,
                sampling: hw.sampling,
                ready_tx,
                analyzer,
                activity_led: hw.activity_led,
                overrun_led: hw.overrun_led,
                heartbeat_led: hw.heartbeat_led,
            },
        )
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::wfi();
        }
    }

    #[task(binds = TIM5, priority = 4, local = [scheduler, synth_timer], shared = [tuning])]
    fn synth_tick(mut cx: synth_tick::Context) {
        cx.local.synth_timer.acknowledge();

        let scheduler = cx.local.scheduler;
        cx.shared.tuning.lock(|tuning| scheduler.sync(tuning));
        // GPIO writes can't fail
        scheduler.on_tick().ok();
    }

    #[task(binds = DMA2_STREAM0, priority = 3, local = [sampling, ready_tx], shared = [samples, stats])]
    fn sample_dma(mut cx: sample_dma::Context) {
        let sampling = cx.local.sampling;
        let swapped = cx.shared.samples.lock(|samples| {
            sampling.next_generation(|block| samples.load_generation(block))
        });

        match swapped {
            Ok(Deposit::Ready) => {
                cx.local.ready_tx.try_send(()).ok();
            }
            // counted by the sample buffer
            Ok(_) => {}
            Err(_) => cx
                .shared
                .stats
                .lock(|stats| stats.dma_faults = stats.dma_faults.wrapping_add(1)),
        }
    }

    #[task(priority = 1, local = [analyzer, activity_led, overrun_led], shared = [samples, tuning, stats])]
    async fn analyze(mut cx: analyze::Context, mut ready_rx: Receiver<'static, (), READY_CAPACITY>) {
        let analyzer = cx.local.analyzer;
        let mut last_active = 0;
        let mut reported_overruns = 0;

        while ready_rx.recv().await.is_ok() {
            let (loaded, overruns) = cx.shared.samples.lock(|samples| {
                let loaded = samples.consume(|block| analyzer.load(block)).is_some();
                (loaded, samples.overruns())
            });

            if overruns != reported_overruns {
                warn!(
                    "dropped {} sample generations",
                    overruns.wrapping_sub(reported_overruns)
                );
                reported_overruns = overruns;
                cx.local.overrun_led.set_high();
            }
            if !loaded {
                continue;
            }

            let found = analyzer.analyze();
            cx.shared.tuning.lock(|tuning| tuning.publish(found));

            for (slot, peak) in found.iter().enumerate() {
                if let Some(peak) = peak {
                    debug!(
                        "osc {}: {} Hz (magnitude {})",
                        slot, peak.frequency, peak.magnitude
                    );
                }
            }

            let active = peaks::active_count(&found);
            if active != last_active {
                info!(
                    "{}/{} oscillators active (cutoff {})",
                    active,
                    OSCILLATORS,
                    analyzer.relative_cutoff()
                );
                last_active = active;
            }
            if active > 0 {
                cx.local.activity_led.set_high();
            } else {
                cx.local.activity_led.set_low();
            }

            let passes = analyzer.passes();
            cx.shared.stats.lock(|stats| {
                stats.passes = passes;
                stats.active = active;
            });
        }
    }

    #[task(priority = 1, local = [heartbeat_led], shared = [samples, stats])]
    async fn heartbeat(mut cx: heartbeat::Context) {
        loop {
            cx.local.heartbeat_led.toggle();

            let (completed, overruns) = cx
                .shared
                .samples
                .lock(|samples| (samples.completed(), samples.overruns()));
            let stats = cx.shared.stats.lock(|stats| *stats);
            info!(
                "generations {} overruns {} passes {} active {} dma faults {}",
                completed, overruns, stats.passes, stats.active, stats.dma_faults
            );

            Tim2::delay(config::HEARTBEAT_PERIOD_MS.millis()).await;
        }
    }
}
