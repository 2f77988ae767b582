use core::{fmt::Write, ptr::addr_of_mut};

use log::{Level, Metadata, Record};
use tesla_hardware::serial::DebugSerialPort;

struct SerialLogger;

static SERIAL_LOGGER: SerialLogger = SerialLogger;
// Set once in init. Afterwards only priority 1 tasks log, and those never preempt each other.
static mut PORT: Option<DebugSerialPort> = None;

pub fn init(port: DebugSerialPort) {
    unsafe {
        *addr_of_mut!(PORT) = Some(port);
    }
}

pub(super) fn get_logger() -> &'static impl log::Log {
    &SERIAL_LOGGER
}

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let level = match record.metadata().level() {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        };

        let port = unsafe { &mut *addr_of_mut!(PORT) };
        if let Some(tx) = port.as_mut() {
            // a failed write only loses this line
            let _ = writeln!(tx, "{}: {}\r", level, record.args());
        }
    }

    fn flush(&self) {}
}
