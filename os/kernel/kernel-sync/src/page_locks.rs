use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, Ordering};

/// A fixed table of `N` spin locks, striped by key.
///
/// Keys (page frame numbers) are folded onto stripes with `key % N`, so
/// adjacent pages land on different stripes while two users of the same page
/// always contend on the same lock. Distinct pages may share a stripe; that
/// only costs throughput, never correctness.
///
/// Holders must not take a second stripe while holding one; the table has no
/// lock ordering.
pub struct PageLocks<const N: usize> {
    /// lock state per stripe
    /// * `false`: unlocked
    /// * `true`: locked
    stripes: [AtomicBool; N],
}

impl<const N: usize> Default for PageLocks<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PageLocks<N> {
    const NON_EMPTY: () = assert!(N > 0, "a lock table needs at least one stripe");

    #[must_use]
    pub const fn new() -> Self {
        let () = Self::NON_EMPTY;
        Self {
            stripes: [const { AtomicBool::new(false) }; N],
        }
    }

    /// Number of stripes in the table.
    #[inline]
    #[must_use]
    pub const fn stripes(&self) -> usize {
        N
    }

    /// The stripe index `key` maps to.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn stripe_of(key: u64) -> usize {
        // the remainder is below N, which is a usize
        (key % N as u64) as usize
    }

    /// Try once; returns immediately.
    #[inline]
    pub fn try_lock(&self, key: u64) -> Option<PageLockGuard<'_>> {
        let lock = &self.stripes[Self::stripe_of(key)];
        if lock
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(PageLockGuard { lock, key })
        } else {
            None
        }
    }

    /// Spin until the stripe for `key` is acquired (TATAS), then return a guard.
    #[inline]
    pub fn lock(&self, key: u64) -> PageLockGuard<'_> {
        let lock = &self.stripes[Self::stripe_of(key)];
        while lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Contended path: spin on a read (cheap), then retry CAS.
            while lock.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
        PageLockGuard { lock, key }
    }

    /// Closure convenience, built on the guard.
    #[inline]
    pub fn with_lock<R>(&self, key: u64, f: impl FnOnce() -> R) -> R {
        let _g = self.lock(key);
        f()
    }

    /// Whether the stripe for `key` is currently held by anyone.
    #[inline]
    #[must_use]
    pub fn is_locked(&self, key: u64) -> bool {
        self.stripes[Self::stripe_of(key)].load(Ordering::Relaxed)
    }
}

/// Holds one stripe of a [`PageLocks`] table until dropped.
#[must_use = "the page lock is released as soon as the guard is dropped"]
pub struct PageLockGuard<'a> {
    lock: &'a AtomicBool,
    key: u64,
}

impl PageLockGuard<'_> {
    /// The key this guard was taken for.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> u64 {
        self.key
    }
}

impl Drop for PageLockGuard<'_> {
    fn drop(&mut self) {
        // Release publishes the critical section.
        self.lock.store(false, Ordering::Release);
    }
}

impl core::fmt::Debug for PageLockGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PageLockGuard").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_fold_onto_stripes() {
        assert_eq!(PageLocks::<8>::stripe_of(0), 0);
        assert_eq!(PageLocks::<8>::stripe_of(7), 7);
        assert_eq!(PageLocks::<8>::stripe_of(8), 0);
        assert_eq!(PageLocks::<8>::stripe_of(u64::MAX), 7);
        assert_eq!(PageLocks::<8>::new().stripes(), 8);
    }

    #[test]
    fn adjacent_keys_do_not_contend() {
        let locks = PageLocks::<4>::new();
        let _a = locks.lock(0x100);
        assert!(locks.try_lock(0x101).is_some());
        assert!(locks.try_lock(0x100).is_none());
        // 0x104 shares the stripe of 0x100
        assert!(locks.try_lock(0x104).is_none());
    }
}
