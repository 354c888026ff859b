//! # Physical Memory Address Types
//!
//! Strongly typed wrappers for the raw physical addresses that the firmware
//! debug path receives from its caller, and for the page-granular values the
//! platform's mapping facility works in.
//!
//! ## Overview
//!
//! | Concept | Generic | Description |
//! |----------|----------|-------------|
//! | [`PhysicalAddress`] | – | A raw 64-bit physical address (RAM or MMIO). |
//! | [`PhysicalPage<S>`] | [`S: PageSize`](PageSize) | The page-aligned base of the page of size `S` containing an address. |
//! | [`PageOffset<S>`] | [`S: PageSize`](PageSize) | The offset of an address within its page of size `S`. |
//! | [`PageFrameNumber`] | – | Address shifted right by the page shift; the key of memory-map queries. |
//!
//! ## Page Sizes
//!
//! - [`Size4K`]: 4 KiB pages, the granule of every supported platform
//!
//! ## Typical Usage
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let pa = PhysicalAddress::new(0x0000_0000_3FFF_FFFE);
//!
//! // Split into page base and in-page offset.
//! let (page, off) = pa.split::<Size4K>();
//! assert_eq!(page.base().as_u64(), 0x3FFF_F000);
//! assert_eq!(off.as_u64(), 0xFFE);
//! assert_eq!(off.remaining(), 2);
//! assert_eq!(page.pfn().as_u64(), 0x3FFFF);
//!
//! // Windows near the top of the address space are checked, never wrapped.
//! assert!(PhysicalAddress::MAX.checked_add(1).is_none());
//! ```
//!
//! ## Design Notes
//!
//! - The types are `#[repr(transparent)]` and implement `Copy`, `Eq`, `Ord`, and
//!   `Hash`, making them suitable as map keys.
//! - All alignment and offset calculations are `const fn`.
//! - The phantom marker `S` enforces the page size at the type level.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_frame_number;
mod page_offset;
mod page_size;
mod physical_address;
mod physical_page;

pub use page_frame_number::PageFrameNumber;
pub use page_offset::PageOffset;
pub use page_size::{PageSize, Size4K};
pub use physical_address::PhysicalAddress;
pub use physical_page::PhysicalPage;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_4k() {
        let a = PhysicalAddress::new(0x1234_5678_9ABC_DEF0);
        let (p, o) = a.split::<Size4K>();
        assert_eq!(p.base().as_u64(), 0x1234_5678_9ABC_D000);
        assert_eq!(o.as_u64(), 0xEF0);
        assert_eq!(o.as_usize(), 0xEF0);
        assert_eq!(p.base().as_u64() | o.as_u64(), a.as_u64());
    }

    #[test]
    fn pfn_round_trips_through_page() {
        let a = PhysicalAddress::new(0x0000_0001_2345_6789);
        let pfn = a.pfn::<Size4K>();
        assert_eq!(pfn.as_u64(), 0x0012_3456);
        assert_eq!(PhysicalPage::<Size4K>::from_pfn(pfn), a.page::<Size4K>());
        assert_eq!(a.page::<Size4K>().pfn(), pfn);
    }

    #[test]
    fn checked_add_detects_overflow() {
        assert_eq!(
            PhysicalAddress::new(0x1000).checked_add(0x100),
            Some(PhysicalAddress::new(0x1100))
        );
        assert!(PhysicalAddress::new(u64::MAX - 3).checked_add(4).is_none());
        assert_eq!(
            PhysicalAddress::new(u64::MAX - 4).checked_add(4),
            Some(PhysicalAddress::MAX)
        );
    }

    #[test]
    fn topmost_page() {
        let top = PhysicalAddress::MAX.page::<Size4K>();
        assert_eq!(top.base().as_u64(), 0xFFFF_FFFF_FFFF_F000);
        assert_eq!(top.pfn().as_u64(), 0x000F_FFFF_FFFF_FFFF);
        assert_eq!(PhysicalAddress::MAX.offset::<Size4K>().remaining(), 1);
    }

    #[test]
    fn remaining_counts_to_the_page_end() {
        assert_eq!(PhysicalAddress::new(0x2FF0).offset::<Size4K>().remaining(), 0x10);
        assert_eq!(PhysicalAddress::new(0x3000).offset::<Size4K>().remaining(), 0x1000);
        assert_eq!(
            PhysicalAddress::new(0x12345).page::<Size4K>(),
            PhysicalAddress::new(0x12000).page::<Size4K>()
        );
    }

    #[test]
    fn formatting() {
        let a = PhysicalAddress::new(0x1000);
        assert_eq!(format!("{a}"), "0x0000000000001000");
        assert_eq!(format!("{a:?}"), "PA(0x0000000000001000)");
        assert_eq!(format!("{:?}", a.pfn::<Size4K>()), "PFN(0x1)");
        assert_eq!(format!("{}", a.page::<Size4K>()), "0x0000000000001000/4K");
    }
}
