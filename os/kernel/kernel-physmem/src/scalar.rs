use core::ptr::NonNull;

mod sealed {
    pub trait Sealed {}
}

/// Fixed-width integer that can be loaded from or stored to physical memory.
///
/// Implemented for `u8`, `u16` and `u32`, the byte, word and double-word
/// widths of the debug interface.
pub trait Scalar: sealed::Sealed + Copy + Eq + core::fmt::Debug {
    /// Width in bytes; also the access window length.
    const WIDTH: usize;

    /// All bits set: returned in place of data that could not be read.
    const SENTINEL: Self;

    #[doc(hidden)]
    fn from_ne_prefix(bytes: [u8; 8]) -> Self;

    #[doc(hidden)]
    fn to_ne_prefix(self) -> [u8; 8];
}

macro_rules! impl_scalar {
    ($($t:ty),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl Scalar for $t {
            const WIDTH: usize = size_of::<$t>();
            const SENTINEL: Self = <$t>::MAX;

            #[inline]
            fn from_ne_prefix(bytes: [u8; 8]) -> Self {
                let mut raw = [0u8; size_of::<$t>()];
                raw.copy_from_slice(&bytes[..size_of::<$t>()]);
                <$t>::from_ne_bytes(raw)
            }

            #[inline]
            fn to_ne_prefix(self) -> [u8; 8] {
                let mut bytes = [0u8; 8];
                bytes[..size_of::<$t>()].copy_from_slice(&self.to_ne_bytes());
                bytes
            }
        }
    )*};
}

impl_scalar!(u8, u16, u32);

/// Load a `T` from `ptr`.
///
/// Aligned addresses take one volatile load of the full width. Unaligned ones
/// are read byte by byte in address order and assembled in native byte order.
///
/// # Safety
/// `ptr` must be valid for volatile reads of `T::WIDTH` bytes.
#[inline]
pub(crate) unsafe fn load<T: Scalar>(ptr: NonNull<u8>) -> T {
    if ptr.cast::<T>().is_aligned() {
        return unsafe { ptr.cast::<T>().read_volatile() };
    }

    let mut bytes = [0u8; 8];
    for (i, b) in bytes.iter_mut().take(T::WIDTH).enumerate() {
        *b = unsafe { ptr.add(i).read_volatile() };
    }
    T::from_ne_prefix(bytes)
}

/// Store `value` at `ptr`; the mirror image of [`load`].
///
/// # Safety
/// `ptr` must be valid for volatile writes of `T::WIDTH` bytes.
#[inline]
pub(crate) unsafe fn store<T: Scalar>(ptr: NonNull<u8>, value: T) {
    if ptr.cast::<T>().is_aligned() {
        unsafe { ptr.cast::<T>().write_volatile(value) };
        return;
    }

    let bytes = value.to_ne_prefix();
    for (i, b) in bytes.iter().take(T::WIDTH).enumerate() {
        unsafe { ptr.add(i).write_volatile(*b) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_all_ones() {
        assert_eq!(u8::SENTINEL, 0xFF);
        assert_eq!(u16::SENTINEL, 0xFFFF);
        assert_eq!(u32::SENTINEL, 0xFFFF_FFFF);
    }

    #[test]
    fn widths() {
        assert_eq!(u8::WIDTH, 1);
        assert_eq!(u16::WIDTH, 2);
        assert_eq!(u32::WIDTH, 4);
    }

    #[test]
    fn unaligned_access_matches_native_layout() {
        let mut buf = [0u8; 16];
        let base = NonNull::from(&mut buf).cast::<u8>();

        // find an odd address inside the buffer
        let odd = if base.as_ptr() as usize % 2 == 1 { 0 } else { 1 };
        let ptr = unsafe { base.add(odd) };
        unsafe { store::<u32>(ptr, 0xDEAD_BEEF) };
        assert_eq!(&buf[odd..odd + 4], &0xDEAD_BEEF_u32.to_ne_bytes());

        let ptr = unsafe { base.add(odd) };
        assert_eq!(unsafe { load::<u32>(ptr) }, 0xDEAD_BEEF);
        assert_eq!(unsafe { load::<u16>(ptr) }, u16::from_ne_bytes([buf[odd], buf[odd + 1]]));
    }

    #[test]
    fn aligned_round_trip() {
        let mut word = 0u32;
        let ptr = NonNull::from(&mut word).cast::<u8>();
        unsafe { store::<u32>(ptr, 0x1234_5678) };
        assert_eq!(unsafe { load::<u32>(ptr) }, 0x1234_5678);
        assert_eq!(word, 0x1234_5678);
    }
}
