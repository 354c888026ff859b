//! # Platform Seam
//!
//! The physical access layer never consults global kernel state. Everything
//! it needs to know about the machine, and every mapping primitive it uses,
//! comes through these two traits so a test double can stand in for the
//! real memory map.
//!
//! | Need | Trait method |
//! |------|--------------|
//! | Top of installed RAM (window ceiling) | [`PlatformInfo::top_of_ram`] |
//! | "Is frame N backed by RAM?" | [`PlatformInfo::page_is_ram`] |
//! | "Is frame N outside the direct map?" | [`PlatformInfo::page_is_high_memory`] |
//! | Fixed alias of directly mapped RAM | [`Platform::direct_alias`] |
//! | Temporary high-memory mapping | [`Platform::map_high_page`] / [`Platform::unmap_high_page`] |
//! | Uncached one-page device mapping | [`Platform::map_device_page`] / [`Platform::unmap_device_page`] |

use core::ptr::NonNull;
use kernel_memory_addresses::{PageFrameNumber, PageSize, PhysicalAddress, PhysicalPage};

/// Read-only facts about the machine's physical memory map.
///
/// Queried on every access; implementations should answer from state that is
/// already at hand (no allocation, no sleeping).
pub trait PlatformInfo {
    /// Page granularity of the platform's memory map and mapping facility.
    type Granule: PageSize;

    /// Physical address of the top of installed RAM.
    ///
    /// Access windows must end strictly below this address.
    fn top_of_ram(&self) -> PhysicalAddress;

    /// Whether the frame is backed by general-purpose RAM.
    fn page_is_ram(&self, pfn: PageFrameNumber) -> bool;

    /// Whether a RAM frame lies outside the directly mapped region.
    ///
    /// Only consulted for frames where [`page_is_ram`](Self::page_is_ram) holds.
    fn page_is_high_memory(&self, pfn: PageFrameNumber) -> bool;
}

/// Mapping primitives of the host platform.
///
/// # Safety
/// Implementors guarantee, for every pointer they hand out:
/// - [`direct_alias`](Self::direct_alias) for an address in a frame that is RAM
///   and not high memory returns a pointer valid for volatile reads and writes
///   from that address to the end of its page, for as long as `self` lives.
/// - [`map_high_page`](Self::map_high_page) returns the base of a mapping of
///   the whole frame, valid for volatile reads and writes until the matching
///   [`unmap_high_page`](Self::unmap_high_page).
/// - [`map_device_page`](Self::map_device_page) returns the base of an
///   uncached mapping of exactly one page, valid for volatile reads and
///   writes until the matching [`unmap_device_page`](Self::unmap_device_page).
/// - If `Self: Sync`, all methods may be called concurrently.
///
/// The map and unmap methods are called while a spin lock is held, possibly
/// with another spin lock waiting behind it. They must not block, sleep or
/// wait for another context; a facility that may sleep has to fail with
/// `None` instead.
pub unsafe trait Platform: PlatformInfo {
    /// Fixed virtual alias of a directly mapped RAM address.
    fn direct_alias(&self, addr: PhysicalAddress) -> NonNull<u8>;

    /// Temporarily map a high-memory frame; `None` if no mapping is available.
    fn map_high_page(&self, pfn: PageFrameNumber) -> Option<NonNull<u8>>;

    /// Release a mapping obtained from [`map_high_page`](Self::map_high_page).
    ///
    /// # Safety
    /// `base` must be the pointer returned for `pfn`, not yet released, and
    /// must not be used afterwards.
    unsafe fn unmap_high_page(&self, pfn: PageFrameNumber, base: NonNull<u8>);

    /// Map one page of non-RAM space uncached; `None` if the facility fails
    /// (e.g., address-space exhaustion).
    fn map_device_page(&self, page: PhysicalPage<Self::Granule>) -> Option<NonNull<u8>>;

    /// Tear down a mapping obtained from [`map_device_page`](Self::map_device_page).
    ///
    /// # Safety
    /// `base` must be the page-aligned pointer returned for `page`, not yet
    /// released, and must not be used afterwards.
    unsafe fn unmap_device_page(&self, page: PhysicalPage<Self::Granule>, base: NonNull<u8>);
}

impl<T: PlatformInfo + ?Sized> PlatformInfo for &T {
    type Granule = T::Granule;

    #[inline]
    fn top_of_ram(&self) -> PhysicalAddress {
        (**self).top_of_ram()
    }

    #[inline]
    fn page_is_ram(&self, pfn: PageFrameNumber) -> bool {
        (**self).page_is_ram(pfn)
    }

    #[inline]
    fn page_is_high_memory(&self, pfn: PageFrameNumber) -> bool {
        (**self).page_is_high_memory(pfn)
    }
}

// SAFETY: forwards to `T`, which upholds the contract.
unsafe impl<T: Platform + ?Sized> Platform for &T {
    #[inline]
    fn direct_alias(&self, addr: PhysicalAddress) -> NonNull<u8> {
        (**self).direct_alias(addr)
    }

    #[inline]
    fn map_high_page(&self, pfn: PageFrameNumber) -> Option<NonNull<u8>> {
        (**self).map_high_page(pfn)
    }

    #[inline]
    unsafe fn unmap_high_page(&self, pfn: PageFrameNumber, base: NonNull<u8>) {
        unsafe { (**self).unmap_high_page(pfn, base) }
    }

    #[inline]
    fn map_device_page(&self, page: PhysicalPage<Self::Granule>) -> Option<NonNull<u8>> {
        (**self).map_device_page(page)
    }

    #[inline]
    unsafe fn unmap_device_page(&self, page: PhysicalPage<Self::Granule>, base: NonNull<u8>) {
        unsafe { (**self).unmap_device_page(page, base) }
    }
}
