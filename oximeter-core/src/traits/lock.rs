//! Try-Once Lock Abstraction
//!
//! The shared vitals slot is guarded by a lock that is only ever *tried*,
//! never waited on. On a dual-core MCU this maps onto a hardware mutex
//! register or an atomic flag; the default implementation is
//! [`AtomicTryLock`](crate::store::AtomicTryLock).
//!
//! Taking the lock is safe: at worst it makes the slot look busy to its
//! owner. Giving it back is `unsafe`, since only the holder may do it:
//!
//! ```compile_fail
//! use oximeter_core::{store::AtomicTryLock, traits::TryLock};
//!
//! let lock = AtomicTryLock::new();
//! lock.release();
//! ```
//!
//! A store can be built over a borrowed lock, so the board code (or a test)
//! keeps its own handle to the mutex register:
//!
//! ```rust
//! use oximeter_core::{store::AtomicTryLock, traits::TryLock, SharedVitalsStore, StoreError};
//!
//! let lock = AtomicTryLock::new();
//! let store = SharedVitalsStore::with_lock(&lock);
//!
//! assert!(lock.try_acquire());
//! assert_eq!(store.fetch(), Err(StoreError::LoadContended));
//! ```

#![allow(unsafe_code)] // unsafe trait: the slot relies on its exclusion guarantee

/// Mutual exclusion primitive that fails instead of blocking
///
/// # Safety
///
/// Implementations must guarantee that after `try_acquire` returns `true`,
/// no other call to `try_acquire` returns `true` until `release` is called,
/// and that writes made while holding the lock are visible to the next
/// holder (acquire/release ordering). The shared slot hands out mutable
/// access based on this contract.
pub unsafe trait TryLock {
    /// Attempt to take the lock exactly once
    fn try_acquire(&self) -> bool;

    /// Release a lock previously taken with `try_acquire`
    ///
    /// # Safety
    ///
    /// The caller must be the context whose `try_acquire` returned `true`,
    /// and must not touch the guarded data afterwards.
    unsafe fn release(&self);
}

// SAFETY: forwards to the referenced lock, which upholds the contract.
unsafe impl<T: TryLock + ?Sized> TryLock for &T {
    fn try_acquire(&self) -> bool {
        (**self).try_acquire()
    }

    unsafe fn release(&self) {
        (**self).release()
    }
}
