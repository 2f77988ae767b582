#[cfg(feature = "defmt_logger")]
mod defmt_logger;

#[cfg(feature = "serial_logger")]
pub mod serial_logger;

pub use log::Level;
use log::{Metadata, Record, SetLoggerError};

struct LoggerType;

static LOGGER: LoggerType = LoggerType;

/// Install the fan-out logger. Backends are picked with cargo features.
pub fn init(level: Level) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level.to_level_filter());
    Ok(())
}

impl log::Log for LoggerType {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            #[cfg(feature = "defmt_logger")]
            {
                let logger = defmt_logger::get_logger();
                logger.log(record);
            }

            #[cfg(feature = "serial_logger")]
            {
                let logger = serial_logger::get_logger();
                logger.log(record);
            }
        }
    }

    fn flush(&self) {
        #[cfg(feature = "defmt_logger")]
        {
            let logger = defmt_logger::get_logger();
            logger.flush();
        }

        #[cfg(feature = "serial_logger")]
        {
            let logger = serial_logger::get_logger();
            logger.flush();
        }
    }
}
