//! # Physical Access Engine
//!
//! The byte / word / double-word / 256-byte operations of the debug
//! interface. Every operation is one self-contained pass of
//!
//! ```text
//! validate window ──► acquire mapping ──► load / store ──► release mapping
//!        │                   │
//!        └── rejected ───────┴── failed ──► sentinel read / dropped write
//! ```
//!
//! A word or double word whose last byte falls into the next page is served
//! through one mapping per page, bytes moved in address order.
//!
//! Failures are absorbed here: reads return all ones of their width, writes
//! do nothing, and the reason is logged. Nothing is returned to the caller
//! that it would have to handle, and nothing panics on a bad address.

use crate::error::{AccessError, MapError};
use crate::mapper::{Mapping, MemoryClass, PageMapper};
use crate::mass_buffer::MassBuffer;
use crate::platform::Platform;
use crate::scalar::Scalar;
use crate::validator::check_window;
use crate::window::AccessWindow;
use kernel_memory_addresses::PhysicalAddress;
use log::{debug, trace};

/// Reads and writes physical memory through scoped mappings.
#[derive(Debug)]
pub struct PhysicalAccessEngine<P: Platform> {
    mapper: PageMapper<P>,
}

impl<P: Platform> PhysicalAccessEngine<P> {
    pub const fn new(platform: P) -> Self {
        Self {
            mapper: PageMapper::new(platform),
        }
    }

    #[inline]
    pub const fn mapper(&self) -> &PageMapper<P> {
        &self.mapper
    }

    #[inline]
    pub const fn platform(&self) -> &P {
        self.mapper.platform()
    }

    /// Validate `window`, then map it.
    ///
    /// A window that straddles a page boundary is mapped as two pieces, one
    /// per page, both held for the duration of the access.
    fn map(&self, window: AccessWindow) -> Result<Span<'_, P>, AccessError> {
        check_window(self.mapper.platform(), window)?;
        if window.fits_in_page::<P::Granule>() {
            return Ok(Span::Page(self.mapper.acquire(window)?));
        }

        let mut chunks = window.page_chunks::<P::Granule>();
        match (chunks.next(), chunks.next(), chunks.next()) {
            (Some(head), Some(tail), None) => {
                let (head, tail) = self.mapper.acquire_pair(head, tail)?;
                Ok(Span::Straddle { head, tail })
            }
            _ => Err(MapError::CrossesPageBoundary {
                addr: window.base(),
                len: window.len(),
            }
            .into()),
        }
    }

    /// Read a `T` at `addr`, or `T::SENTINEL` if the window is unreachable.
    #[must_use]
    pub fn read<T: Scalar>(&self, addr: PhysicalAddress) -> T {
        let window = AccessWindow::new(addr, T::WIDTH as u64);
        match self.map(window) {
            Ok(span) => {
                let value = span.load::<T>();
                trace!("read {window:?} ({}) = {value:#X?}", span.class());
                value
            }
            Err(e) => {
                debug!("read {window:?} returns sentinel: {e}");
                T::SENTINEL
            }
        }
    }

    /// Write `value` at `addr`; silently dropped if the window is unreachable.
    ///
    /// A write straddling two pages stores nothing unless both pages map.
    pub fn write<T: Scalar>(&self, addr: PhysicalAddress, value: T) {
        let window = AccessWindow::new(addr, T::WIDTH as u64);
        match self.map(window) {
            Ok(span) => {
                span.store(value);
                trace!("wrote {value:#X?} to {window:?} ({})", span.class());
            }
            Err(e) => debug!("write to {window:?} dropped: {e}"),
        }
    }

    #[inline]
    #[must_use]
    pub fn read_byte(&self, addr: PhysicalAddress) -> u8 {
        self.read(addr)
    }

    #[inline]
    #[must_use]
    pub fn read_word(&self, addr: PhysicalAddress) -> u16 {
        self.read(addr)
    }

    #[inline]
    #[must_use]
    pub fn read_dword(&self, addr: PhysicalAddress) -> u32 {
        self.read(addr)
    }

    #[inline]
    pub fn write_byte(&self, addr: PhysicalAddress, value: u8) {
        self.write(addr, value);
    }

    #[inline]
    pub fn write_word(&self, addr: PhysicalAddress, value: u16) {
        self.write(addr, value);
    }

    #[inline]
    pub fn write_dword(&self, addr: PhysicalAddress, value: u32) {
        self.write(addr, value);
    }

    /// Read 256 bytes starting at `addr`, in address order.
    ///
    /// The whole window is validated up front; a rejected window yields an
    /// all-ones buffer. The copy then proceeds one page at a time, each page
    /// through its own mapping, so a window straddling a page boundary never
    /// reads past what is mapped. Pages that cannot be mapped read as `0xFF`.
    #[must_use]
    pub fn read_mass(&self, addr: PhysicalAddress) -> MassBuffer {
        let window = AccessWindow::mass(addr);
        let mut buf = MassBuffer::sentinel();

        if let Err(e) = check_window(self.mapper.platform(), window) {
            debug!("mass read {window:?} returns sentinel: {e}");
            return buf;
        }

        let mut filled = 0;
        for chunk in window.page_chunks::<P::Granule>() {
            #[allow(clippy::cast_possible_truncation)]
            let n = chunk.len() as usize; // at most the whole buffer
            let out = &mut buf[filled..filled + n];
            match self.mapper.acquire(chunk) {
                Ok(mapping) => {
                    mapping.read_into(out);
                    trace!("mass read {chunk:?} ({})", mapping.class());
                }
                Err(e) => debug!("mass read {chunk:?} left as sentinel: {e}"),
            }
            filled += n;
        }

        buf
    }
}

/// The mappings behind one scalar access.
enum Span<'m, P: Platform> {
    Page(Mapping<'m, P>),
    /// Bytes `[0, head.len())` live in `head`, the rest in `tail`.
    Straddle {
        head: Mapping<'m, P>,
        tail: Mapping<'m, P>,
    },
}

impl<P: Platform> Span<'_, P> {
    const fn class(&self) -> MemoryClass {
        match self {
            Self::Page(m) | Self::Straddle { head: m, .. } => m.class(),
        }
    }

    fn load<T: Scalar>(&self) -> T {
        match self {
            Self::Page(m) => m.read::<T>().unwrap_or(T::SENTINEL),
            Self::Straddle { head, tail } => {
                let mut bytes = [0u8; 8];
                let split = head.read_into(&mut bytes[..T::WIDTH]);
                tail.read_into(&mut bytes[split..T::WIDTH]);
                T::from_ne_prefix(bytes)
            }
        }
    }

    fn store<T: Scalar>(&self, value: T) {
        match self {
            Self::Page(m) => {
                m.write(value);
            }
            Self::Straddle { head, tail } => {
                let bytes = value.to_ne_prefix();
                let split = head.write_from(&bytes[..T::WIDTH]);
                tail.write_from(&bytes[split..T::WIDTH]);
            }
        }
    }
}
