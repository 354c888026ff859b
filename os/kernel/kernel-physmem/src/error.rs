use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress};

/// Why an access window was rejected before any mapping was attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("window {base}+{len:#X} overflows the physical address space")]
    Overflow { base: PhysicalAddress, len: u64 },
    #[error("window end {end} is at or beyond the top of RAM {top}")]
    BeyondTopOfRam {
        end: PhysicalAddress,
        top: PhysicalAddress,
    },
}

/// Why no mapping could be produced for a window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("window {addr}+{len:#X} straddles a page boundary")]
    CrossesPageBoundary { addr: PhysicalAddress, len: u64 },
    #[error("lock stripe of frame {pfn} is already held")]
    PageBusy { pfn: PageFrameNumber },
    #[error("high-memory frame {pfn} could not be mapped")]
    HighMemoryUnavailable { pfn: PageFrameNumber },
    #[error("uncached mapping of page {page} failed")]
    DeviceMapFailed { page: PhysicalAddress },
}

/// Any reason an access degraded to a sentinel read or a dropped write.
///
/// Never returned from the public access operations; it only travels as far
/// as the log line that records it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error(transparent)]
    Map(#[from] MapError),
}
