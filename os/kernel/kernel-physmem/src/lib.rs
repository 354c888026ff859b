//! # Physical Memory Access for Firmware Debugging
//!
//! Reads and writes arbitrary physical addresses on behalf of a privileged
//! debugger, without ever letting a bad address take the caller down.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │            PhysicalAccessEngine (engine)            │
//! │    • byte / word / dword reads and writes           │
//! │    • 256-byte bulk reads, page by page              │
//! │    • sentinel reads, dropped writes on failure      │
//! └──────────────┬──────────────────────┬───────────────┘
//!                │                      │
//! ┌──────────────▼───────────┐ ┌────────▼──────────────┐
//! │  AddressValidator        │ │  PageMapper (mapper)  │
//! │  (validator)             │ │  • DirectRam alias    │
//! │  • overflow check        │ │  • HighMemory map     │
//! │  • top-of-RAM ceiling    │ │  • uncached MMIO map  │
//! └──────────────┬───────────┘ │  • per-page locks     │
//!                │             └────────┬──────────────┘
//! ┌──────────────▼──────────────────────▼───────────────┐
//! │         PlatformInfo / Platform (platform)          │
//! │    memory map facts and mapping primitives          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation runs validate → map → access → unmap on the caller's
//! context. The [`Mapping`] guard releases in `Drop`, so there is no path,
//! including unwinding, that leaves a page mapped.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kernel_memory_addresses::PhysicalAddress;
//! use kernel_physmem::PhysicalAccessEngine;
//!
//! let engine = PhysicalAccessEngine::new(platform);
//! engine.write_word(PhysicalAddress::new(0x2000), 0xBEEF);
//! assert_eq!(engine.read_word(PhysicalAddress::new(0x2000)), 0xBEEF);
//!
//! // Beyond the top of RAM: all ones, no error.
//! assert_eq!(engine.read_dword(PhysicalAddress::new(0x3FFF_FFFE)), 0xFFFF_FFFF);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

pub mod engine;
mod error;
pub mod info;
pub mod mapper;
mod mass_buffer;
pub mod platform;
mod scalar;
pub mod validator;
mod window;

pub use engine::PhysicalAccessEngine;
pub use error::{AccessError, MapError, WindowError};
pub use mapper::{Mapping, MemoryClass, PageMapper};
pub use mass_buffer::MassBuffer;
pub use platform::{Platform, PlatformInfo};
pub use scalar::Scalar;
pub use validator::{check_window, is_window_safe};
pub use window::{AccessWindow, PageChunks};
