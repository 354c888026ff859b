//! # Kernel synchronization primitives
//!
//! Spin-based locking for short critical sections that must not sleep, such
//! as holding a temporary page mapping for the duration of one access.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod page_locks;

pub use page_locks::{PageLockGuard, PageLocks};
