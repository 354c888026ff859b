use kernel_memory_addresses::{PageFrameNumber, PageSize, PhysicalAddress, PhysicalPage, Size4K};
use kernel_physmem::{Platform, PlatformInfo};
use log::trace;
use std::cell::UnsafeCell;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One 4 KiB frame of simulated physical memory.
#[repr(C, align(4096))]
struct Frame(UnsafeCell<[u8; Size4K::SIZE as usize]>);

impl Frame {
    fn zeroed() -> Box<Self> {
        Box::new(Self(UnsafeCell::new([0; Size4K::SIZE as usize])))
    }

    fn base(&self) -> NonNull<u8> {
        NonNull::from(&self.0).cast::<u8>()
    }
}

/// A physical memory map backed by host memory.
///
/// Every address below the top of RAM is RAM unless it falls into a
/// registered MMIO range; RAM at or above the high-memory boundary is high
/// memory. Everything at or above the top of RAM is device space. Frames are
/// allocated, zeroed, on first touch and live as long as the platform, so
/// pointers handed out stay valid for its lifetime regardless of class.
///
/// Dynamic mappings are counted. [`active_high_mappings`](Self::active_high_mappings)
/// and [`active_device_mappings`](Self::active_device_mappings) return to zero
/// once every mapping has been released. Two simultaneous mappings of the
/// same frame are flagged by
/// [`saw_overlapping_high_mappings`](Self::saw_overlapping_high_mappings) and
/// [`saw_overlapping_device_mappings`](Self::saw_overlapping_device_mappings).
pub struct SimulatedPlatform {
    top_of_ram: PhysicalAddress,
    high_memory_start: PhysicalAddress,
    mmio: Vec<Range<u64>>,
    frames: Mutex<HashMap<u64, Box<Frame>>>,
    failing: Mutex<HashSet<u64>>,
    high_maps: Mutex<HashMap<u64, usize>>,
    device_maps: Mutex<HashMap<u64, usize>>,
    active_high: AtomicUsize,
    active_device: AtomicUsize,
    total_high: AtomicUsize,
    total_device: AtomicUsize,
    high_overlap: AtomicBool,
    device_overlap: AtomicBool,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Count a new mapping of `pfn`, raising `overlap` if one was already live.
fn enter(maps: &Mutex<HashMap<u64, usize>>, pfn: PageFrameNumber, overlap: &AtomicBool) {
    let mut maps = locked(maps);
    let count = maps.entry(pfn.as_u64()).or_insert(0);
    *count += 1;
    if *count > 1 {
        overlap.store(true, Ordering::Release);
    }
}

fn leave(maps: &Mutex<HashMap<u64, usize>>, pfn: PageFrameNumber) {
    if let Some(count) = locked(maps).get_mut(&pfn.as_u64()) {
        *count = count.saturating_sub(1);
    }
}

impl SimulatedPlatform {
    /// All RAM below `top_of_ram`, all of it directly mapped.
    #[must_use]
    pub fn new(top_of_ram: u64) -> Self {
        Self {
            top_of_ram: PhysicalAddress::new(top_of_ram),
            high_memory_start: PhysicalAddress::new(top_of_ram),
            mmio: Vec::new(),
            frames: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            high_maps: Mutex::new(HashMap::new()),
            device_maps: Mutex::new(HashMap::new()),
            active_high: AtomicUsize::new(0),
            active_device: AtomicUsize::new(0),
            total_high: AtomicUsize::new(0),
            total_device: AtomicUsize::new(0),
            high_overlap: AtomicBool::new(false),
            device_overlap: AtomicBool::new(false),
        }
    }

    /// RAM at or above `start` lies outside the direct map.
    #[must_use]
    pub fn with_high_memory(mut self, start: u64) -> Self {
        self.high_memory_start = PhysicalAddress::new(start);
        self
    }

    /// Punch a device hole into the physical address space.
    #[must_use]
    pub fn with_mmio(mut self, range: Range<u64>) -> Self {
        self.mmio.push(range);
        self
    }

    /// Make mapping the page containing `addr` fail until [`restore_page`](Self::restore_page).
    pub fn fail_page(&self, addr: u64) {
        locked(&self.failing).insert(PhysicalAddress::new(addr).pfn::<Size4K>().as_u64());
    }

    pub fn restore_page(&self, addr: u64) {
        locked(&self.failing).remove(&PhysicalAddress::new(addr).pfn::<Size4K>().as_u64());
    }

    /// Write backing bytes directly, bypassing any mapping.
    pub fn poke(&self, addr: u64, bytes: &[u8]) {
        for (i, &b) in (0u64..).zip(bytes) {
            // SAFETY: the frame lives as long as `self`; the offset is in range.
            unsafe { self.byte_ptr(addr.wrapping_add(i)).write_volatile(b) };
        }
    }

    /// Read backing bytes directly, bypassing any mapping.
    #[must_use]
    pub fn peek(&self, addr: u64, len: usize) -> Vec<u8> {
        (0..len as u64)
            // SAFETY: the frame lives as long as `self`; the offset is in range.
            .map(|i| unsafe { self.byte_ptr(addr.wrapping_add(i)).read_volatile() })
            .collect()
    }

    /// High-memory mappings currently held.
    #[must_use]
    pub fn active_high_mappings(&self) -> usize {
        self.active_high.load(Ordering::Acquire)
    }

    /// Device mappings currently held.
    #[must_use]
    pub fn active_device_mappings(&self) -> usize {
        self.active_device.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn high_mappings_total(&self) -> usize {
        self.total_high.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn device_mappings_total(&self) -> usize {
        self.total_device.load(Ordering::Acquire)
    }

    /// Whether one high-memory frame was ever mapped twice at the same time.
    #[must_use]
    pub fn saw_overlapping_high_mappings(&self) -> bool {
        self.high_overlap.load(Ordering::Acquire)
    }

    /// Whether one page was ever mapped as a device twice at the same time.
    #[must_use]
    pub fn saw_overlapping_device_mappings(&self) -> bool {
        self.device_overlap.load(Ordering::Acquire)
    }

    fn is_mmio(&self, pfn: PageFrameNumber) -> bool {
        let base = PhysicalPage::<Size4K>::from_pfn(pfn).base().as_u64();
        self.mmio.iter().any(|r| r.contains(&base))
    }

    fn is_failing(&self, pfn: PageFrameNumber) -> bool {
        locked(&self.failing).contains(&pfn.as_u64())
    }

    /// Base of the backing frame, allocated on first use.
    fn frame(&self, pfn: PageFrameNumber) -> NonNull<u8> {
        locked(&self.frames)
            .entry(pfn.as_u64())
            .or_insert_with(Frame::zeroed)
            .base()
    }

    fn byte_ptr(&self, addr: u64) -> NonNull<u8> {
        let (page, offset) = PhysicalAddress::new(addr).split::<Size4K>();
        // SAFETY: offset < frame size.
        unsafe { self.frame(page.pfn()).add(offset.as_usize()) }
    }
}

impl PlatformInfo for SimulatedPlatform {
    type Granule = Size4K;

    fn top_of_ram(&self) -> PhysicalAddress {
        self.top_of_ram
    }

    fn page_is_ram(&self, pfn: PageFrameNumber) -> bool {
        let base = PhysicalPage::<Size4K>::from_pfn(pfn).base();
        base < self.top_of_ram && !self.is_mmio(pfn)
    }

    fn page_is_high_memory(&self, pfn: PageFrameNumber) -> bool {
        PhysicalPage::<Size4K>::from_pfn(pfn).base() >= self.high_memory_start
    }
}

// SAFETY: every pointer handed out points into a boxed frame owned by `self`
// that is never freed or moved before `self` is dropped. All shared state is
// behind mutexes or atomics.
unsafe impl Platform for SimulatedPlatform {
    fn direct_alias(&self, addr: PhysicalAddress) -> NonNull<u8> {
        self.byte_ptr(addr.as_u64())
    }

    fn map_high_page(&self, pfn: PageFrameNumber) -> Option<NonNull<u8>> {
        if self.is_failing(pfn) {
            trace!("sim: refusing high-memory mapping of {pfn}");
            return None;
        }

        enter(&self.high_maps, pfn, &self.high_overlap);
        self.active_high.fetch_add(1, Ordering::AcqRel);
        self.total_high.fetch_add(1, Ordering::AcqRel);

        std::thread::yield_now();
        Some(self.frame(pfn))
    }

    unsafe fn unmap_high_page(&self, pfn: PageFrameNumber, base: NonNull<u8>) {
        assert_eq!(base, self.frame(pfn), "high-memory unmap of a foreign pointer");
        leave(&self.high_maps, pfn);
        self.active_high.fetch_sub(1, Ordering::AcqRel);
    }

    fn map_device_page(&self, page: PhysicalPage<Size4K>) -> Option<NonNull<u8>> {
        if self.is_failing(page.pfn()) {
            trace!("sim: refusing device mapping of {page}");
            return None;
        }

        enter(&self.device_maps, page.pfn(), &self.device_overlap);
        self.active_device.fetch_add(1, Ordering::AcqRel);
        self.total_device.fetch_add(1, Ordering::AcqRel);

        // Widen the window in which a second mapper could interleave.
        std::thread::yield_now();
        Some(self.frame(page.pfn()))
    }

    unsafe fn unmap_device_page(&self, page: PhysicalPage<Size4K>, base: NonNull<u8>) {
        assert_eq!(base, self.frame(page.pfn()), "device unmap not at the page base");
        leave(&self.device_maps, page.pfn());
        self.active_device.fetch_sub(1, Ordering::AcqRel);
    }
}

impl core::fmt::Debug for SimulatedPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedPlatform")
            .field("top_of_ram", &self.top_of_ram)
            .field("high_memory_start", &self.high_memory_start)
            .field("mmio", &self.mmio)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfn(addr: u64) -> PageFrameNumber {
        PhysicalAddress::new(addr).pfn::<Size4K>()
    }

    #[test]
    fn classification() {
        let sim = SimulatedPlatform::new(0x10_0000)
            .with_high_memory(0x8_0000)
            .with_mmio(0xA000..0xC000);

        assert!(sim.page_is_ram(pfn(0x1000)));
        assert!(!sim.page_is_high_memory(pfn(0x1000)));
        assert!(!sim.page_is_ram(pfn(0xA000)));
        assert!(!sim.page_is_ram(pfn(0xB000)));
        assert!(sim.page_is_ram(pfn(0xC000)));
        assert!(sim.page_is_high_memory(pfn(0x8_0000)));
        assert!(!sim.page_is_ram(pfn(0x10_0000)));
    }

    #[test]
    fn poke_and_peek_span_frames() {
        let sim = SimulatedPlatform::new(0x10_0000);
        sim.poke(0x0FFE, &[1, 2, 3, 4]);
        assert_eq!(sim.peek(0x0FFE, 4), vec![1, 2, 3, 4]);
        assert_eq!(sim.peek(0x2000, 2), vec![0, 0]);
    }

    #[test]
    fn frames_are_page_aligned_and_stable() {
        let sim = SimulatedPlatform::new(0x10_0000);
        let a = sim.frame(pfn(0x3000));
        for i in 0..64 {
            let _ = sim.frame(pfn(i << 12));
        }
        assert_eq!(a, sim.frame(pfn(0x3000)));
        assert_eq!(a.as_ptr() as usize % 4096, 0);
    }

    #[test]
    fn failure_injection() {
        let sim = SimulatedPlatform::new(0x10_0000).with_high_memory(0x8_0000);
        sim.fail_page(0x8_0123);
        assert!(sim.map_high_page(pfn(0x8_0000)).is_none());
        sim.restore_page(0x8_0000);
        let base = sim.map_high_page(pfn(0x8_0000));
        assert!(base.is_some());
        assert_eq!(sim.active_high_mappings(), 1);
        unsafe { sim.unmap_high_page(pfn(0x8_0000), base.unwrap()) };
        assert_eq!(sim.active_high_mappings(), 0);
        assert_eq!(sim.high_mappings_total(), 1);
    }

    #[test]
    fn overlapping_mappings_are_flagged() {
        let sim = SimulatedPlatform::new(0x10_0000)
            .with_high_memory(0x8_0000)
            .with_mmio(0xA000..0xB000);

        let a = sim.map_high_page(pfn(0x8_0000)).unwrap();
        unsafe { sim.unmap_high_page(pfn(0x8_0000), a) };
        let b = sim.map_high_page(pfn(0x8_0000)).unwrap();
        assert!(!sim.saw_overlapping_high_mappings());
        let c = sim.map_high_page(pfn(0x8_0000)).unwrap();
        assert!(sim.saw_overlapping_high_mappings());
        unsafe { sim.unmap_high_page(pfn(0x8_0000), c) };
        unsafe { sim.unmap_high_page(pfn(0x8_0000), b) };

        let page = PhysicalPage::<Size4K>::containing(PhysicalAddress::new(0xA000));
        let d = sim.map_device_page(page).unwrap();
        assert!(!sim.saw_overlapping_device_mappings());
        let e = sim.map_device_page(page).unwrap();
        assert!(sim.saw_overlapping_device_mappings());
        unsafe { sim.unmap_device_page(page, e) };
        unsafe { sim.unmap_device_page(page, d) };
        assert_eq!(sim.active_device_mappings(), 0);
    }
}
