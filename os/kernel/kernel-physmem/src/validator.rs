//! # Address Window Validation
//!
//! The coarse bounds check that runs before every physical access. It only
//! looks at the window's upper bound: the window must not wrap the address
//! space and must end strictly below the top of installed RAM. Addresses
//! below that ceiling that are not RAM (MMIO holes) pass here and are
//! routed to an uncached mapping by the [`PageMapper`](crate::PageMapper).
//!
//! Two comparisons, no platform calls other than the top-of-RAM query, so
//! it is cheap enough to run on every byte access.

use crate::error::WindowError;
use crate::platform::PlatformInfo;
use crate::window::AccessWindow;
use kernel_memory_addresses::PhysicalAddress;

/// Check `window` against the platform's top of RAM.
///
/// Returns the exclusive end of the window.
///
/// # Errors
/// - [`WindowError::Overflow`] if `base + len` does not fit the address type.
/// - [`WindowError::BeyondTopOfRam`] if `base + len` is at or beyond the top of RAM.
pub fn check_window<I>(platform: &I, window: AccessWindow) -> Result<PhysicalAddress, WindowError>
where
    I: PlatformInfo + ?Sized,
{
    let end = window.end().ok_or(WindowError::Overflow {
        base: window.base(),
        len: window.len(),
    })?;

    let top = platform.top_of_ram();
    if end >= top {
        return Err(WindowError::BeyondTopOfRam { end, top });
    }

    Ok(end)
}

/// Whether `[base, base + window_length)` is within the broadly safe region.
#[inline]
#[must_use]
pub fn is_window_safe<I>(platform: &I, base: PhysicalAddress, window_length: u64) -> bool
where
    I: PlatformInfo + ?Sized,
{
    check_window(platform, AccessWindow::new(base, window_length)).is_ok()
}
