//! # Simulated Hardware for Host Tests
//!
//! Stand-ins for the two things the firmware debugger talks to, so the
//! physical access and port paths can be exercised with `cargo test` on a
//! development machine:
//!
//! * [`SimulatedPlatform`] implements [`kernel_physmem::Platform`] over sparse,
//!   lazily allocated 4 KiB frames. It models direct RAM, high memory and MMIO
//!   holes, counts every dynamic mapping, and can be told to fail mapping
//!   specific pages.
//! * [`RegisterFilePorts`] implements [`kernel_ports::PortIo`] as a 64 Ki-entry
//!   register file that also journals every write.
//!
//! ```rust
//! use kernel_physmem::PhysicalAccessEngine;
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_sim::SimulatedPlatform;
//!
//! let platform = SimulatedPlatform::new(0x4000_0000);
//! platform.poke(0x1000, &[0x42]);
//!
//! let engine = PhysicalAccessEngine::new(&platform);
//! assert_eq!(engine.read_byte(PhysicalAddress::new(0x1000)), 0x42);
//! ```

mod platform;
mod ports;

pub use platform::SimulatedPlatform;
pub use ports::RegisterFilePorts;
