use crate::QEMU_DEBUG_PORT;
use crate::sink::PortSink;
use kernel_ports::PortIo;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Writes log records as `"[LEVEL] target: message\n"` to a debug console port.
pub struct DebugConLogger<IO: PortIo> {
    io: IO,
    port: u16,
    max_level: LevelFilter,
}

impl<IO: PortIo> DebugConLogger<IO> {
    /// A logger on [`QEMU_DEBUG_PORT`].
    #[must_use]
    pub const fn new(io: IO, max_level: LevelFilter) -> Self {
        Self {
            io,
            port: QEMU_DEBUG_PORT,
            max_level,
        }
    }

    /// Log to a different port, e.g., `0xE9` for Bochs.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// The port bus the logger writes to.
    #[must_use]
    pub const fn io(&self) -> &IO {
        &self.io
    }
}

impl<IO: PortIo + Send + Sync> DebugConLogger<IO> {
    /// Install as the global logger. Call this once during early init.
    ///
    /// # Errors
    /// If a global logger was already installed.
    pub fn install(&'static self) -> Result<(), SetLoggerError> {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }
}

impl<IO: PortIo + Send + Sync> Log for DebugConLogger<IO> {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        PortSink::new(&self.io, self.port).write_args(format_args!(
            "[{}] {}: {}\n",
            record.level(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}
