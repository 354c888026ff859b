//! # Page Mapping
//!
//! Turns a physical window into a pointer the CPU can dereference, for the
//! duration of exactly one access.
//!
//! ## Memory Classes
//!
//! The page containing the window is classified once, and that class decides
//! how the page is mapped *and* how it is released:
//!
//! | Class | Acquire | Release | Page lock |
//! |-------|---------|---------|-----------|
//! | [`MemoryClass::DirectRam`] | fixed alias via [`Platform::direct_alias`] | nothing | no |
//! | [`MemoryClass::HighMemory`] | [`Platform::map_high_page`] | [`Platform::unmap_high_page`] | yes |
//! | [`MemoryClass::Mmio`] | [`Platform::map_device_page`] (uncached, one page) | [`Platform::unmap_device_page`] at the page base | yes |
//!
//! Release happens in [`Drop`] for [`Mapping`], so early returns and
//! unwinding release just like the normal path. The class is recorded in the
//! mapping at acquire time; release never re-queries the platform.
//!
//! ## Serialization
//!
//! Dynamic mappings (high memory and MMIO) hold the stripe of a
//! [`PageLocks`] table for their page frame from acquire to release, so two
//! callers never map and unmap the same page concurrently. Direct RAM takes no lock.
//!
//! The platform's map and unmap primitives run while the stripe is held, so
//! they must not block or sleep.

use crate::error::MapError;
use crate::info::PAGE_LOCK_STRIPES;
use crate::platform::Platform;
use crate::scalar::{self, Scalar};
use crate::window::AccessWindow;
use core::fmt;
use core::ptr::NonNull;
use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress, PhysicalPage};
use kernel_sync::{PageLockGuard, PageLocks};
use log::{debug, trace, warn};

/// How a physical page is reached from the CPU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemoryClass {
    /// RAM inside the direct map; always reachable through a fixed alias.
    DirectRam,
    /// RAM outside the direct map; needs a temporary page mapping.
    HighMemory,
    /// Not RAM; needs an uncached device mapping.
    Mmio,
}

impl MemoryClass {
    /// Whether mappings of this class are created and torn down per access.
    #[inline]
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        match self {
            Self::DirectRam => false,
            Self::HighMemory | Self::Mmio => true,
        }
    }
}

impl fmt::Display for MemoryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DirectRam => "direct RAM",
            Self::HighMemory => "high memory",
            Self::Mmio => "MMIO",
        })
    }
}

/// Produces scoped [`Mapping`]s over a [`Platform`].
pub struct PageMapper<P: Platform> {
    platform: P,
    locks: PageLocks<PAGE_LOCK_STRIPES>,
}

impl<P: Platform> PageMapper<P> {
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            locks: PageLocks::new(),
        }
    }

    #[inline]
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// Decide how the frame is reached. Exactly one class applies.
    #[must_use]
    pub fn classify(&self, pfn: PageFrameNumber) -> MemoryClass {
        if !self.platform.page_is_ram(pfn) {
            MemoryClass::Mmio
        } else if self.platform.page_is_high_memory(pfn) {
            MemoryClass::HighMemory
        } else {
            MemoryClass::DirectRam
        }
    }

    /// Map `window` for a single access, without waiting for its page lock.
    ///
    /// The window must lie within one page; the mapping covers exactly
    /// `[window.base(), window.end())` and is released when dropped.
    ///
    /// High-memory and MMIO mappings hold a lock stripe shared by every
    /// `PAGE_LOCK_STRIPES`-th frame. If that stripe is already held, whether
    /// by another context or by a [`Mapping`] the caller still has alive,
    /// the call fails with [`MapError::PageBusy`] instead of waiting. Drop one
    /// mapping before acquiring the next.
    ///
    /// # Errors
    /// - [`MapError::CrossesPageBoundary`] if the window is empty or its last
    ///   byte lies in a different page than its first.
    /// - [`MapError::PageBusy`] if the page's lock stripe is held.
    /// - [`MapError::HighMemoryUnavailable`] if the platform reports a high-memory
    ///   frame but cannot map it.
    /// - [`MapError::DeviceMapFailed`] if the uncached device mapping fails.
    pub fn try_acquire(&self, window: AccessWindow) -> Result<Mapping<'_, P>, MapError> {
        self.map_window(window, LockWait::Fail)
    }

    /// Like [`try_acquire`](Self::try_acquire), but spins until the page's
    /// lock stripe is free.
    ///
    /// The caller must not hold another mapping, except through
    /// [`acquire_pair`](Self::acquire_pair).
    pub(crate) fn acquire(&self, window: AccessWindow) -> Result<Mapping<'_, P>, MapError> {
        self.map_window(window, LockWait::Spin)
    }

    /// Map two windows in adjacent pages and hold both mappings at once.
    ///
    /// Lock stripes are taken in ascending stripe order, so concurrent pair
    /// acquisitions cannot deadlock against each other or against single ones.
    pub(crate) fn acquire_pair(
        &self,
        head: AccessWindow,
        tail: AccessWindow,
    ) -> Result<(Mapping<'_, P>, Mapping<'_, P>), MapError> {
        let stripe = |w: AccessWindow| {
            PageLocks::<PAGE_LOCK_STRIPES>::stripe_of(w.base().pfn::<P::Granule>().as_u64())
        };

        if stripe(head) <= stripe(tail) {
            let head = self.acquire(head)?;
            let tail = self.acquire(tail)?;
            Ok((head, tail))
        } else {
            let tail = self.acquire(tail)?;
            let head = self.acquire(head)?;
            Ok((head, tail))
        }
    }

    fn map_window(
        &self,
        window: AccessWindow,
        wait: LockWait,
    ) -> Result<Mapping<'_, P>, MapError> {
        if window.is_empty() || !window.fits_in_page::<P::Granule>() {
            return Err(MapError::CrossesPageBoundary {
                addr: window.base(),
                len: window.len(),
            });
        }

        let (page, offset) = window.base().split::<P::Granule>();
        let pfn = page.pfn();
        let class = self.classify(pfn);

        #[allow(clippy::cast_possible_truncation)]
        let len = window.len() as usize; // at most one page

        let (ptr, lock) = match class {
            MemoryClass::DirectRam => (self.platform.direct_alias(window.base()), None),
            MemoryClass::HighMemory => {
                let lock = self.lock_page(pfn, wait)?;
                let Some(base) = self.platform.map_high_page(pfn) else {
                    warn!("high-memory frame {pfn} reported as RAM but could not be mapped");
                    return Err(MapError::HighMemoryUnavailable { pfn });
                };
                // SAFETY: the platform maps the whole frame; offset < page size.
                (unsafe { base.add(offset.as_usize()) }, Some(lock))
            }
            MemoryClass::Mmio => {
                let lock = self.lock_page(pfn, wait)?;
                let Some(base) = self.platform.map_device_page(page) else {
                    debug!("uncached mapping of {page} failed");
                    return Err(MapError::DeviceMapFailed { page: page.base() });
                };
                // SAFETY: the platform maps one full page; offset < page size.
                (unsafe { base.add(offset.as_usize()) }, Some(lock))
            }
        };

        trace!("mapped {window:?} as {class}");
        Ok(Mapping {
            platform: &self.platform,
            class,
            page,
            addr: window.base(),
            ptr,
            len,
            _lock: lock,
        })
    }

    fn lock_page(
        &self,
        pfn: PageFrameNumber,
        wait: LockWait,
    ) -> Result<PageLockGuard<'_>, MapError> {
        match wait {
            LockWait::Spin => Ok(self.locks.lock(pfn.as_u64())),
            LockWait::Fail => self
                .locks
                .try_lock(pfn.as_u64())
                .ok_or(MapError::PageBusy { pfn }),
        }
    }
}

/// What to do when a page's lock stripe is already held.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum LockWait {
    Spin,
    Fail,
}

impl<P: Platform + fmt::Debug> fmt::Debug for PageMapper<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageMapper")
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

/// A live alias of a physical window, valid until dropped.
///
/// Obtained from [`PageMapper::try_acquire`]. Never outlives the access it was
/// created for: it borrows the mapper, and is neither `Send` nor `Clone`.
#[must_use = "the mapping is released as soon as it is dropped"]
pub struct Mapping<'m, P: Platform> {
    platform: &'m P,
    class: MemoryClass,
    page: PhysicalPage<P::Granule>,
    addr: PhysicalAddress,
    /// Points at `addr`, not at the page base.
    ptr: NonNull<u8>,
    len: usize,
    /// Dropped after `Drop::drop` has released the mapping.
    _lock: Option<PageLockGuard<'m>>,
}

impl<P: Platform> Mapping<'_, P> {
    #[inline]
    #[must_use]
    pub const fn class(&self) -> MemoryClass {
        self.class
    }

    /// Physical address the mapping starts at.
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> PhysicalAddress {
        self.addr
    }

    #[inline]
    #[must_use]
    pub const fn page(&self) -> PhysicalPage<P::Granule> {
        self.page
    }

    /// Number of mapped bytes starting at [`addr`](Self::addr).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Load a `T` from the start of the mapping.
    ///
    /// `None` if `T` is wider than the mapping.
    #[inline]
    #[must_use]
    pub fn read<T: Scalar>(&self) -> Option<T> {
        if T::WIDTH > self.len {
            return None;
        }
        // SAFETY: `len` bytes at `ptr` are mapped until `self` is dropped.
        Some(unsafe { scalar::load::<T>(self.ptr) })
    }

    /// Store a `T` at the start of the mapping.
    ///
    /// Returns `false`, without touching memory, if `T` is wider than the mapping.
    #[inline]
    pub fn write<T: Scalar>(&self, value: T) -> bool {
        if T::WIDTH > self.len {
            return false;
        }
        // SAFETY: `len` bytes at `ptr` are mapped until `self` is dropped.
        unsafe { scalar::store::<T>(self.ptr, value) };
        true
    }

    /// Copy mapped bytes into `out`, one volatile byte load at a time in
    /// address order. Returns the number of bytes copied.
    pub fn read_into(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.len);
        for (i, b) in out.iter_mut().take(n).enumerate() {
            // SAFETY: i < len, and `len` bytes at `ptr` are mapped.
            *b = unsafe { self.ptr.add(i).read_volatile() };
        }
        n
    }

    /// Copy `bytes` into the mapping, one volatile byte store at a time in
    /// address order. Returns the number of bytes copied.
    pub fn write_from(&self, bytes: &[u8]) -> usize {
        let n = bytes.len().min(self.len);
        for (i, &b) in bytes.iter().take(n).enumerate() {
            // SAFETY: i < len, and `len` bytes at `ptr` are mapped.
            unsafe { self.ptr.add(i).write_volatile(b) };
        }
        n
    }

    /// Start of the page this mapping lives in, in the mapped address space.
    fn page_base(&self) -> NonNull<u8> {
        let offset = self.addr.offset::<P::Granule>();
        // SAFETY: `ptr` was produced as page base + offset.
        unsafe { self.ptr.sub(offset.as_usize()) }
    }
}

impl<P: Platform> Drop for Mapping<'_, P> {
    fn drop(&mut self) {
        match self.class {
            MemoryClass::DirectRam => {}
            MemoryClass::HighMemory => {
                // SAFETY: the base was returned by `map_high_page` for this frame
                // and is not used after this point.
                unsafe { self.platform.unmap_high_page(self.page.pfn(), self.page_base()) }
            }
            MemoryClass::Mmio => {
                // SAFETY: the base was returned by `map_device_page` for this page
                // and is not used after this point.
                unsafe { self.platform.unmap_device_page(self.page, self.page_base()) }
            }
        }
        trace!("released {} mapping of {}", self.class, self.addr);
    }
}

impl<P: Platform> fmt::Debug for Mapping<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("class", &self.class)
            .field("addr", &self.addr)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}
