//! Single-Slot Vitals Exchange Between Execution Contexts
//!
//! ## Overview
//!
//! The producer core computes a fresh [`VitalsSnapshot`] about once per
//! second; the consumer core reports whatever is current once per second.
//! They share exactly one slot:
//!
//! ```text
//! Producer (acquisition tick)             Consumer (report tick)
//!        │                                        │
//!   try_acquire ──┐                        ┌── try_acquire
//!        │        ▼                        ▼        │
//!     publish ──> [ spo2 | heart_rate ] ──> fetch
//!        │                                        │
//!     release                                  release
//! ```
//!
//! ## Try-Once Semantics
//!
//! Neither side ever waits. If the lock is held by the other core:
//!
//! - `publish` returns [`StoreError::SaveContended`]; the previous pair
//!   stays visible and this cycle's values are lost
//! - `fetch` returns [`StoreError::LoadContended`]; the caller keeps its own
//!   previous copy
//!
//! The lock is held only for the two-word copy, never across calculation,
//! so a collision costs one missed update and never a stall.
//!
//! ## Torn Reads
//!
//! Both fields are written and read under the same lock acquisition. A
//! reader therefore sees either the untouched default sentinel pair or a
//! complete pair from a single `publish`, never one field from each of two
//! publishes.
//!
//! ## Memory Ordering
//!
//! - **Acquire** on taking the lock: see the previous holder's writes
//! - **Release** on giving it back: publish our writes to the next holder
//! - **Relaxed** for statistics that don't affect correctness

#![allow(unsafe_code)] // UnsafeCell slot guarded by a try-lock

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::{
    errors::{StoreError, StoreResult},
    traits::TryLock,
    vitals::VitalsSnapshot,
};

/// Try-lock over a single atomic flag
#[derive(Debug, Default)]
pub struct AtomicTryLock {
    locked: AtomicBool,
}

impl AtomicTryLock {
    /// Unlocked flag, usable in a `static`
    pub const fn new() -> Self {
        Self { locked: AtomicBool::new(false) }
    }

    /// Whether some context currently holds the lock
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

// SAFETY: compare_exchange admits one holder; Acquire/Release orders slot
// accesses between holders.
unsafe impl TryLock for AtomicTryLock {
    fn try_acquire(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn release(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

/// Exchange statistics
///
/// Counts how often each side got through and how often it hit the lock.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Successful publishes
    pub published: AtomicU32,
    /// Publishes dropped on contention
    pub save_conflicts: AtomicU32,
    /// Successful fetches
    pub fetched: AtomicU32,
    /// Fetches skipped on contention
    pub load_conflicts: AtomicU32,
}

impl StoreStats {
    const fn new() -> Self {
        Self {
            published: AtomicU32::new(0),
            save_conflicts: AtomicU32::new(0),
            fetched: AtomicU32::new(0),
            load_conflicts: AtomicU32::new(0),
        }
    }
}

/// Mutex-guarded single slot holding the latest vitals
///
/// ## Example Usage
///
/// ```rust
/// use oximeter_core::{SharedVitalsStore, VitalsSnapshot};
///
/// static STORE: SharedVitalsStore = SharedVitalsStore::new();
///
/// // Producer
/// let _ = STORE.publish(97, 72);
///
/// // Consumer
/// if let Ok(vitals) = STORE.fetch() {
///     assert_eq!(vitals, VitalsSnapshot::new(97, 72));
/// }
/// ```
///
/// The lock it owns is not reachable through the store; only the store
/// takes and gives it back:
///
/// ```compile_fail
/// use oximeter_core::SharedVitalsStore;
///
/// let store = SharedVitalsStore::new();
/// let _ = store.lock();
/// ```
pub struct SharedVitalsStore<L: TryLock = AtomicTryLock> {
    lock: L,
    slot: UnsafeCell<VitalsSnapshot>,
    stats: StoreStats,
}

impl SharedVitalsStore<AtomicTryLock> {
    /// Store holding the sentinel pair, guarded by an atomic flag
    pub const fn new() -> Self {
        Self::with_lock(AtomicTryLock::new())
    }
}

impl Default for SharedVitalsStore<AtomicTryLock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: TryLock> SharedVitalsStore<L> {
    /// Store guarded by a caller-supplied lock (hardware mutex, test double)
    ///
    /// Pass `&lock` to keep a handle to the lock outside the store.
    pub const fn with_lock(lock: L) -> Self {
        Self {
            lock,
            slot: UnsafeCell::new(VitalsSnapshot::INVALID),
            stats: StoreStats::new(),
        }
    }

    /// Overwrite the slot with a new pair, or give up if it is busy
    pub fn publish(&self, spo2_percent: u8, heart_rate_bpm: i32) -> StoreResult<()> {
        let written = self.with_slot(|slot| {
            *slot = VitalsSnapshot { spo2_percent, heart_rate_bpm };
        });

        match written {
            Some(()) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => {
                self.stats.save_conflicts.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::SaveContended)
            }
        }
    }

    /// Copy out the current pair, or give up if the slot is busy
    pub fn fetch(&self) -> StoreResult<VitalsSnapshot> {
        match self.with_slot(|slot| *slot) {
            Some(snapshot) => {
                self.stats.fetched.fetch_add(1, Ordering::Relaxed);
                Ok(snapshot)
            }
            None => {
                self.stats.load_conflicts.fetch_add(1, Ordering::Relaxed);
                Err(StoreError::LoadContended)
            }
        }
    }

    /// Exchange statistics
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Run `f` on the slot if the lock can be taken right now
    fn with_slot<R>(&self, f: impl FnOnce(&mut VitalsSnapshot) -> R) -> Option<R> {
        if !self.lock.try_acquire() {
            return None;
        }

        let _guard = ReleaseOnDrop(&self.lock);
        // SAFETY: the TryLock contract makes this the only live reference
        // until the guard releases the lock.
        let slot = unsafe { &mut *self.slot.get() };
        Some(f(slot))
    }
}

// SAFETY: every access to the slot goes through `with_slot`, which holds
// the lock for the lifetime of the reference.
unsafe impl<L: TryLock + Sync> Sync for SharedVitalsStore<L> {}

struct ReleaseOnDrop<'a, L: TryLock>(&'a L);

impl<L: TryLock> Drop for ReleaseOnDrop<'_, L> {
    fn drop(&mut self) {
        // SAFETY: a guard is only built after our own try_acquire succeeded
        unsafe { self.0.release() }
    }
}
