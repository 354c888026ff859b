//! # Access Layout Constants

/// Window length of a byte access.
pub const WIDTH_BYTE: u64 = 1;

/// Window length of a word access.
pub const WIDTH_WORD: u64 = 2;

/// Window length of a double-word access.
pub const WIDTH_DWORD: u64 = 4;

/// Window length of a bulk read, and the size of a [`MassBuffer`](crate::MassBuffer).
///
/// Shared with the bulk port read, so both halves of the interface transfer
/// the same number of bytes.
pub use kernel_ports::MASS_BUFFER_SIZE;

/// Number of stripes in the per-page lock table of a [`PageMapper`](crate::PageMapper).
///
/// Only high-memory and device mappings take a stripe, and only for the
/// duration of one access.
pub const PAGE_LOCK_STRIPES: usize = 64;

const _: () = {
    assert!(MASS_BUFFER_SIZE.is_power_of_two());
    // adjacent frames never share a stripe
    assert!(PAGE_LOCK_STRIPES > 1);
};
