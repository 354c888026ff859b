use crate::PortIo;

/// [`PortIo`] backed by the x86 `in`/`out` instructions.
///
/// Zero-sized; every call issues exactly one bus cycle.
#[derive(Debug)]
pub struct X86PortIo {
    _private: (),
}

impl X86PortIo {
    /// Create a handle to the port bus.
    ///
    /// # Safety
    /// You must uphold **all** of the following for as long as the handle is used:
    /// - **Privilege:** Execute at CPL0 **or** have I/O permission (IOPL/IO bitmap)
    ///   that allows access to every port passed in. Otherwise the CPU raises `#GP`.
    /// - **Caller intent:** Reads and writes reach the device unfiltered. Writing
    ///   the wrong port can wedge the device or the system (e.g., disabling the
    ///   PIC, reprogramming timers); the caller of the debug interface owns that risk.
    /// - **Ordering:** `in`/`out` order with other I/O instructions but are **not**
    ///   general memory fences.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl PortIo for X86PortIo {
    #[inline]
    fn read_u8(&self, port: u16) -> u8 {
        // SAFETY: privilege was vouched for in `X86PortIo::new`.
        unsafe { inb(port) }
    }

    #[inline]
    fn write_u8(&self, port: u16, value: u8) {
        // SAFETY: privilege was vouched for in `X86PortIo::new`.
        unsafe { outb(port, value) }
    }
}

/// Write one byte to an I/O port. Uses `out dx, al`.
///
/// # Safety
/// Requires I/O privilege for `port`; see [`X86PortIo::new`].
#[inline]
unsafe fn outb(port: u16, val: u8) {
    unsafe {
        core::arch::asm!("out dx, al", in("dx") port, in("al") val, options(nomem, nostack, preserves_flags));
    }
}

/// Read one byte from an I/O port. Uses `in al, dx`.
///
/// # Safety
/// Requires I/O privilege for `port`; see [`X86PortIo::new`].
#[inline]
unsafe fn inb(port: u16) -> u8 {
    let mut v: u8;
    unsafe {
        core::arch::asm!("in al, dx", in("dx") port, out("al") v, options(nomem, nostack, preserves_flags));
    }
    v
}
