//! # x86 I/O Port Access
//!
//! Byte-wide access to the I/O port address space for firmware debugging.
//! The port bus is a separate 16-bit address space (`0x0000`–`0xFFFF`)
//! reached with dedicated `in`/`out` instructions, not with memory loads and
//! stores, so none of the validation or mapping of the physical memory path
//! applies here: every request goes straight to the bus.
//!
//! ## Overview
//!
//! * [`PortIo`] is the seam between callers and the hardware. The
//!   [`X86PortIo`] backend executes `in al, dx` / `out dx, al`; tests
//!   substitute a register-file double.
//! * [`read_mass`] reads [`MASS_BUFFER_SIZE`] consecutive ports into a buffer,
//!   one single-byte read per port in ascending order.
//!
//! ### Common Port Ranges
//! ```text
//! 0x0020-0x0021   Programmable Interrupt Controller (PIC) #1
//! 0x0040-0x0043   Programmable Interval Timer (PIT)
//! 0x0060-0x0064   Keyboard Controller
//! 0x0070-0x0071   CMOS/RTC
//! 0x0080          POST code
//! 0x00A0-0x00A1   PIC #2
//! 0x0CF8-0x0CFF   PCI configuration mechanism #1
//! 0x03F8-0x03FF   Serial Port #1
//! ```
//!
//! ## Safety Requirements
//!
//! Port accesses have device side effects (reading a status register may
//! acknowledge an interrupt). Creating an [`X86PortIo`] is `unsafe` because the
//! caller vouches for privilege (CPL0 or a permissive I/O bitmap); after that,
//! the firmware debugger deliberately lets its privileged user touch any port.

#![cfg_attr(not(any(test, doctest)), no_std)]

#[cfg(all(feature = "x86", any(target_arch = "x86", target_arch = "x86_64")))]
mod x86;

#[cfg(all(feature = "x86", any(target_arch = "x86", target_arch = "x86_64")))]
pub use x86::X86PortIo;

/// Length of every bulk transfer of the debug interface: the consecutive
/// ports read by [`read_mass`], and the bytes of a physical memory bulk read.
pub const MASS_BUFFER_SIZE: usize = 256;

/// Byte-wide access to an I/O port bus.
pub trait PortIo {
    /// Read one byte from `port`.
    fn read_u8(&self, port: u16) -> u8;

    /// Write one byte to `port`.
    fn write_u8(&self, port: u16, value: u8);
}

impl<T: PortIo + ?Sized> PortIo for &T {
    #[inline]
    fn read_u8(&self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    #[inline]
    fn write_u8(&self, port: u16, value: u8) {
        (**self).write_u8(port, value);
    }
}

/// Read [`MASS_BUFFER_SIZE`] bytes from `port`, `port + 1`, … in order.
///
/// The port number wraps from `0xFFFF` to `0x0000`, matching the 16-bit width
/// of the `dx` register.
///
/// ```rust
/// # use kernel_ports::{read_mass, PortIo};
/// struct Echo;
/// impl PortIo for Echo {
///     fn read_u8(&self, port: u16) -> u8 { port as u8 }
///     fn write_u8(&self, _port: u16, _value: u8) {}
/// }
/// let buf = read_mass(&Echo, 0x80);
/// assert_eq!(buf[0], 0x80);
/// assert_eq!(buf[255], 0x7F);
/// ```
#[must_use]
pub fn read_mass<IO: PortIo + ?Sized>(io: &IO, port: u16) -> [u8; MASS_BUFFER_SIZE] {
    log::trace!("port mass read at {port:#06X}");
    let mut buf = [0u8; MASS_BUFFER_SIZE];
    let mut p = port;
    for b in &mut buf {
        *b = io.read_u8(p);
        p = p.wrapping_add(1);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records the order in which ports are touched.
    struct Recorder(RefCell<Vec<u16>>);

    impl PortIo for Recorder {
        fn read_u8(&self, port: u16) -> u8 {
            self.0.borrow_mut().push(port);
            0
        }

        fn write_u8(&self, _port: u16, _value: u8) {}
    }

    #[test]
    fn mass_read_visits_ports_in_order() {
        let rec = Recorder(RefCell::new(Vec::new()));
        let _ = read_mass(&rec, 0x3F8);
        let seen = rec.0.into_inner();
        assert_eq!(seen.len(), MASS_BUFFER_SIZE);
        assert_eq!(seen[0], 0x3F8);
        assert!(seen.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn mass_read_wraps_at_top_of_port_space() {
        let rec = Recorder(RefCell::new(Vec::new()));
        let _ = read_mass(&rec, 0xFFF0);
        let seen = rec.0.into_inner();
        assert_eq!(seen[15], 0xFFFF);
        assert_eq!(seen[16], 0x0000);
        assert_eq!(seen[255], 0x00EF);
    }
}
