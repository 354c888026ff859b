use kernel_ports::PortIo;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Mutex, PoisonError};

/// A port bus where every port is a plain byte register.
///
/// A write to port P is read back from P. All writes are journaled in order,
/// which is what a debug console on the other side of the bus would see.
pub struct RegisterFilePorts {
    registers: Box<[AtomicU8]>,
    journal: Mutex<Vec<(u16, u8)>>,
}

impl RegisterFilePorts {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: (0..=u16::MAX).map(|_| AtomicU8::new(0)).collect(),
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Preset a register without journaling it.
    #[must_use]
    pub fn with_register(self, port: u16, value: u8) -> Self {
        self.registers[usize::from(port)].store(value, Ordering::Relaxed);
        self
    }

    /// Every value written to `port`, oldest first.
    #[must_use]
    pub fn written_to(&self, port: u16) -> Vec<u8> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(p, _)| *p == port)
            .map(|&(_, v)| v)
            .collect()
    }

    /// Total number of writes across all ports.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.journal.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for RegisterFilePorts {
    fn default() -> Self {
        Self::new()
    }
}

impl PortIo for RegisterFilePorts {
    fn read_u8(&self, port: u16) -> u8 {
        self.registers[usize::from(port)].load(Ordering::Acquire)
    }

    fn write_u8(&self, port: u16, value: u8) {
        let mut journal = self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        self.registers[usize::from(port)].store(value, Ordering::Release);
        journal.push((port, value));
    }
}

impl core::fmt::Debug for RegisterFilePorts {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisterFilePorts")
            .field("writes", &self.write_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let io = RegisterFilePorts::new();
        io.write_u8(0x80, 0x5A);
        assert_eq!(io.read_u8(0x80), 0x5A);
        assert_eq!(io.read_u8(0x81), 0);
    }

    #[test]
    fn journal_keeps_order_per_port() {
        let io = RegisterFilePorts::new().with_register(0x402, 0xEE);
        io.write_u8(0x402, b'h');
        io.write_u8(0x80, 1);
        io.write_u8(0x402, b'i');
        assert_eq!(io.written_to(0x402), b"hi");
        assert_eq!(io.write_count(), 3);
    }

    #[test]
    fn covers_the_whole_port_space() {
        let io = RegisterFilePorts::new();
        io.write_u8(0xFFFF, 7);
        assert_eq!(io.read_u8(0xFFFF), 7);
    }
}
