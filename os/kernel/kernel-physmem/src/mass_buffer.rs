use crate::info::MASS_BUFFER_SIZE;
use core::fmt;
use core::ops::{Deref, DerefMut};

/// The 256 bytes returned by a bulk read, in physical-address order.
#[repr(transparent)]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MassBuffer([u8; MASS_BUFFER_SIZE]);

impl MassBuffer {
    /// A buffer reading as all ones, the sentinel for an unreadable window.
    #[inline]
    #[must_use]
    pub const fn sentinel() -> Self {
        Self([0xFF; MASS_BUFFER_SIZE])
    }

    #[inline]
    #[must_use]
    pub const fn from_bytes(bytes: [u8; MASS_BUFFER_SIZE]) -> Self {
        Self(bytes)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; MASS_BUFFER_SIZE] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub const fn into_bytes(self) -> [u8; MASS_BUFFER_SIZE] {
        self.0
    }

    /// Whether every byte is `0xFF`.
    #[inline]
    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|&b| b == 0xFF)
    }
}

impl Default for MassBuffer {
    fn default() -> Self {
        Self::sentinel()
    }
}

impl Deref for MassBuffer {
    type Target = [u8; MASS_BUFFER_SIZE];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for MassBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<MassBuffer> for [u8; MASS_BUFFER_SIZE] {
    fn from(value: MassBuffer) -> Self {
        value.0
    }
}

impl fmt::Debug for MassBuffer {
    /// Hex dump, 16 bytes per row, prefixed with the row offset.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(16).enumerate() {
            write!(f, "{:02X}:", row * 16)?;
            for b in chunk {
                write!(f, " {b:02X}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
