use crate::info::{MASS_BUFFER_SIZE, WIDTH_BYTE, WIDTH_DWORD, WIDTH_WORD};
use core::fmt;
use core::marker::PhantomData;
use kernel_memory_addresses::{PageSize, PhysicalAddress};

/// A physical base address plus the number of bytes an access will touch.
///
/// The window is the half-open range `[base, base + len)`. Construction never
/// fails; whether the window may be touched is decided by
/// [`check_window`](crate::validator::check_window).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct AccessWindow {
    base: PhysicalAddress,
    len: u64,
}

impl AccessWindow {
    #[inline]
    #[must_use]
    pub const fn new(base: PhysicalAddress, len: u64) -> Self {
        Self { base, len }
    }

    #[inline]
    #[must_use]
    pub const fn byte(base: PhysicalAddress) -> Self {
        Self::new(base, WIDTH_BYTE)
    }

    #[inline]
    #[must_use]
    pub const fn word(base: PhysicalAddress) -> Self {
        Self::new(base, WIDTH_WORD)
    }

    #[inline]
    #[must_use]
    pub const fn dword(base: PhysicalAddress) -> Self {
        Self::new(base, WIDTH_DWORD)
    }

    /// The window of a 256-byte bulk read.
    #[inline]
    #[must_use]
    pub const fn mass(base: PhysicalAddress) -> Self {
        Self::new(base, MASS_BUFFER_SIZE as u64)
    }

    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        self.base
    }

    #[inline]
    #[must_use]
    pub const fn len(self) -> u64 {
        self.len
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Exclusive end of the window, or `None` if it leaves the address space.
    #[inline]
    #[must_use]
    pub const fn end(self) -> Option<PhysicalAddress> {
        self.base.checked_add(self.len)
    }

    /// Whether the whole window lies in the page of size `S` containing `base`.
    #[inline]
    #[must_use]
    pub const fn fits_in_page<S: PageSize>(self) -> bool {
        self.len <= self.base.offset::<S>().remaining()
    }

    /// Split the window at page boundaries of size `S`, in address order.
    ///
    /// Every yielded window is non-empty and lies within one page. A window
    /// that leaves the address space is cut at its top.
    ///
    /// ```rust
    /// # use kernel_memory_addresses::{PhysicalAddress, Size4K};
    /// # use kernel_physmem::AccessWindow;
    /// let w = AccessWindow::mass(PhysicalAddress::new(0x1F80));
    /// let chunks: Vec<_> = w.page_chunks::<Size4K>().collect();
    /// assert_eq!(chunks.len(), 2);
    /// assert_eq!(chunks[0], AccessWindow::new(PhysicalAddress::new(0x1F80), 0x80));
    /// assert_eq!(chunks[1], AccessWindow::new(PhysicalAddress::new(0x2000), 0x80));
    /// ```
    #[inline]
    #[must_use]
    pub const fn page_chunks<S: PageSize>(self) -> PageChunks<S> {
        PageChunks {
            rest: Some(self),
            _phantom: PhantomData,
        }
    }
}

impl fmt::Debug for AccessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessWindow({}+{:#X})", self.base, self.len)
    }
}

impl fmt::Display for AccessWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}; {}]", self.base, self.len)
    }
}

/// Iterator over the page-sized pieces of an [`AccessWindow`].
#[derive(Debug, Clone)]
pub struct PageChunks<S: PageSize> {
    rest: Option<AccessWindow>,
    _phantom: PhantomData<S>,
}

impl<S: PageSize> Iterator for PageChunks<S> {
    type Item = AccessWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest.take()?;
        if rest.is_empty() {
            return None;
        }

        let in_page = rest.base.offset::<S>().remaining();
        if rest.len <= in_page {
            return Some(rest);
        }

        let head = AccessWindow::new(rest.base, in_page);
        // `None` here means the head already ends at the top of the address space.
        self.rest = rest
            .base
            .checked_add(in_page)
            .map(|next| AccessWindow::new(next, rest.len - in_page));
        Some(head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_memory_addresses::Size4K;

    fn pa(v: u64) -> PhysicalAddress {
        PhysicalAddress::new(v)
    }

    #[test]
    fn widths() {
        assert_eq!(AccessWindow::byte(pa(0)).len(), 1);
        assert_eq!(AccessWindow::word(pa(0)).len(), 2);
        assert_eq!(AccessWindow::dword(pa(0)).len(), 4);
        assert_eq!(AccessWindow::mass(pa(0)).len(), 256);
    }

    #[test]
    fn end_detects_overflow() {
        assert_eq!(AccessWindow::dword(pa(0x3FFF_FFFE)).end(), Some(pa(0x4000_0002)));
        assert!(AccessWindow::word(pa(u64::MAX)).end().is_none());
        assert_eq!(AccessWindow::byte(pa(u64::MAX - 1)).end(), Some(pa(u64::MAX)));
    }

    #[test]
    fn fits_in_page() {
        assert!(AccessWindow::dword(pa(0x1FFC)).fits_in_page::<Size4K>());
        assert!(!AccessWindow::dword(pa(0x1FFD)).fits_in_page::<Size4K>());
        assert!(AccessWindow::mass(pa(0x1F00)).fits_in_page::<Size4K>());
        assert!(!AccessWindow::mass(pa(0x1F01)).fits_in_page::<Size4K>());
    }

    #[test]
    fn chunks_within_one_page() {
        let w = AccessWindow::mass(pa(0x1000));
        let chunks: Vec<_> = w.page_chunks::<Size4K>().collect();
        assert_eq!(chunks, vec![w]);
    }

    #[test]
    fn chunks_cover_window_in_order() {
        let w = AccessWindow::new(pa(0x0FFF), 0x2002);
        let chunks: Vec<_> = w.page_chunks::<Size4K>().collect();
        assert_eq!(
            chunks,
            vec![
                AccessWindow::new(pa(0x0FFF), 1),
                AccessWindow::new(pa(0x1000), 0x1000),
                AccessWindow::new(pa(0x2000), 0x1000),
                AccessWindow::new(pa(0x3000), 1),
            ]
        );
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<u64>(), w.len());
    }

    #[test]
    fn chunks_stop_at_top_of_address_space() {
        let w = AccessWindow::new(pa(u64::MAX - 0xF), 0x100);
        let chunks: Vec<_> = w.page_chunks::<Size4K>().collect();
        assert_eq!(chunks, vec![AccessWindow::new(pa(u64::MAX - 0xF), 0x10)]);
    }

    #[test]
    fn empty_window_has_no_chunks() {
        assert_eq!(AccessWindow::new(pa(0x1000), 0).page_chunks::<Size4K>().count(), 0);
    }
}
