//! # Firmware Debug Interface
//!
//! The operations a privileged debugger client issues against the machine:
//!
//! | Operation | Width | Path |
//! |-----------|-------|------|
//! | [`mem_read_byte`](FirmwareDebug::mem_read_byte) / [`mem_write_byte`](FirmwareDebug::mem_write_byte) | 1 | validated physical access |
//! | [`mem_read_word`](FirmwareDebug::mem_read_word) / [`mem_write_word`](FirmwareDebug::mem_write_word) | 2 | validated physical access |
//! | [`mem_read_dword`](FirmwareDebug::mem_read_dword) / [`mem_write_dword`](FirmwareDebug::mem_write_dword) | 4 | validated physical access |
//! | [`mem_read_mass`](FirmwareDebug::mem_read_mass) | 256 | validated, page by page |
//! | [`io_read_byte`](FirmwareDebug::io_read_byte) / [`io_write_byte`](FirmwareDebug::io_write_byte) | 1 | direct port bus |
//! | [`io_read_mass`](FirmwareDebug::io_read_mass) | 256 | direct port bus |
//!
//! Addresses arrive as raw integers, the way a driver boundary receives them.
//! Memory operations never fail: unreachable addresses read as all ones and
//! swallow writes. Port operations are not validated at all.
//!
//! ## Logging
//!
//! With the `qemu` feature (default), [`FirmwareDebug::console_logger`]
//! builds a [`DebugConLogger`] on the same port bus, so rejected windows and
//! failed mappings show up on the QEMU debug console.

#![cfg_attr(not(any(test, doctest)), no_std)]

use kernel_memory_addresses::PhysicalAddress;
use kernel_physmem::{MassBuffer, PhysicalAccessEngine, Platform};
use kernel_ports::PortIo;
use log::{LevelFilter, trace};

pub use kernel_ports::MASS_BUFFER_SIZE;
pub use kernel_qemu::DebugConLogger;

/// Physical memory and port access for one debugger.
///
/// `Sync` when both the platform and the port bus are, so one instance may
/// serve concurrent requests.
#[derive(Debug)]
pub struct FirmwareDebug<P: Platform, IO: PortIo> {
    memory: PhysicalAccessEngine<P>,
    ports: IO,
}

impl<P: Platform, IO: PortIo> FirmwareDebug<P, IO> {
    pub const fn new(platform: P, ports: IO) -> Self {
        Self {
            memory: PhysicalAccessEngine::new(platform),
            ports,
        }
    }

    #[inline]
    pub const fn memory(&self) -> &PhysicalAccessEngine<P> {
        &self.memory
    }

    #[inline]
    pub const fn ports(&self) -> &IO {
        &self.ports
    }

    /// A debug console logger writing through this instance's port bus.
    ///
    /// Leak or store it in a `static` and call
    /// [`install`](DebugConLogger::install) once.
    #[must_use]
    pub const fn console_logger(&self, max_level: LevelFilter) -> DebugConLogger<&IO> {
        DebugConLogger::new(&self.ports, max_level)
    }

    #[must_use]
    pub fn mem_read_byte(&self, addr: u64) -> u8 {
        self.memory.read_byte(PhysicalAddress::new(addr))
    }

    #[must_use]
    pub fn mem_read_word(&self, addr: u64) -> u16 {
        self.memory.read_word(PhysicalAddress::new(addr))
    }

    #[must_use]
    pub fn mem_read_dword(&self, addr: u64) -> u32 {
        self.memory.read_dword(PhysicalAddress::new(addr))
    }

    pub fn mem_write_byte(&self, addr: u64, value: u8) {
        self.memory.write_byte(PhysicalAddress::new(addr), value);
    }

    pub fn mem_write_word(&self, addr: u64, value: u16) {
        self.memory.write_word(PhysicalAddress::new(addr), value);
    }

    pub fn mem_write_dword(&self, addr: u64, value: u32) {
        self.memory.write_dword(PhysicalAddress::new(addr), value);
    }

    /// 256 bytes of physical memory starting at `addr`.
    #[must_use]
    pub fn mem_read_mass(&self, addr: u64) -> MassBuffer {
        self.memory.read_mass(PhysicalAddress::new(addr))
    }

    #[must_use]
    pub fn io_read_byte(&self, port: u16) -> u8 {
        let value = self.ports.read_u8(port);
        trace!("in  {port:#06X} = {value:#04X}");
        value
    }

    pub fn io_write_byte(&self, port: u16, value: u8) {
        trace!("out {port:#06X} <- {value:#04X}");
        self.ports.write_u8(port, value);
    }

    /// 256 consecutive ports starting at `port`, wrapping at `0xFFFF`.
    #[must_use]
    pub fn io_read_mass(&self, port: u16) -> [u8; MASS_BUFFER_SIZE] {
        kernel_ports::read_mass(&self.ports, port)
    }
}
