//! # QEMU Debug Console Logging
//!
//! A `log::Log` backend for code that has no console of its own, such as a
//! firmware debug driver running before or beneath the OS. Records are
//! written byte by byte to QEMU's debug console port.
//!
//! ## Output Mechanism
//! ```text
//! log::debug!(…)
//!     ↓
//! DebugConLogger (log::Log)
//!     ↓
//! PortSink (fmt::Write)
//!     ↓
//! PortIo::write_u8 → I/O port 0x402
//!     ↓
//! Host terminal (-debugcon stdio)
//! ```
//!
//! The port is reached through [`kernel_ports::PortIo`], the same seam the
//! debugger's port operations use, so the logger can run against a recording
//! double in tests.
//!
//! ## `enabled` Feature (default)
//!
//! When disabled, records are still formatted but nothing reaches the port.
//!
//! ## Host-Side Configuration
//! ```bash
//! qemu-system-x86_64 -kernel kernel.bin -debugcon stdio
//! qemu-system-x86_64 -kernel kernel.bin -debugcon file:debug.log
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

mod logger;
mod sink;

pub use logger::DebugConLogger;
pub use sink::PortSink;

/// The port number of QEMU's debug console.
pub const QEMU_DEBUG_PORT: u16 = 0x402;
