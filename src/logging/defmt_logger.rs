use core::fmt::Write;

use defmt::{debug, error, info, trace, warn};
use defmt_rtt as _;
use heapless::String;
use log::{Level, Metadata, Record};

/// Longer messages are cut short.
const LINE_CAPACITY: usize = 160;

struct DefmtLogger;

static DEFMT_LOGGER: DefmtLogger = DefmtLogger;

pub(super) fn get_logger() -> &'static impl log::Log {
    &DEFMT_LOGGER
}

impl log::Log for DefmtLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut line: String<LINE_CAPACITY> = String::new();
        // keeps whatever fit before the first overflowing fragment
        let _ = write!(line, "{}", record.args());

        match record.level() {
            Level::Trace => trace!("{=str}", line.as_str()),
            Level::Debug => debug!("{=str}", line.as_str()),
            Level::Info => info!("{=str}", line.as_str()),
            Level::Warn => warn!("{=str}", line.as_str()),
            Level::Error => error!("{=str}", line.as_str()),
        }
    }

    fn flush(&self) {}
}
