use core::fmt;

/// Page frame number: a physical address shifted right by the page shift.
///
/// Platform memory-map queries ("is this frame RAM?", "is it high memory?")
/// are keyed by frame number, as are the per-page locks that serialize
/// dynamic mappings.
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageFrameNumber(u64);

impl PageFrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(pfn: u64) -> Self {
        Self(pfn)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PFN({:#X})", self.0)
    }
}

impl fmt::Display for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#X}", self.0)
    }
}

impl From<u64> for PageFrameNumber {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}
