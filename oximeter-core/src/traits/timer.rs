//! Periodic Timer Abstraction
//!
//! Each execution context is driven by its own periodic timer. On the
//! target this is a hardware timer whose interrupt sets a flag; on a host it
//! can be backed by `std::time::Instant`.
//!
//! The timer does not store a callback. Instead its owner asks it whether a
//! period has elapsed and runs its own tick handler synchronously:
//!
//! ```rust
//! use oximeter_core::traits::PeriodicTimer;
//!
//! fn service<T: PeriodicTimer>(timer: &mut T, mut on_tick: impl FnMut()) {
//!     if timer.wait().is_ok() {
//!         on_tick();
//!     }
//! }
//! ```
//!
//! Because the handler runs inside the owner's `&mut self` borrow, a tick
//! can never start while the previous one is still executing.

use core::convert::Infallible;

use fugit::MillisDurationU32;

/// Free-running periodic trigger
pub trait PeriodicTimer {
    /// Configure the period; called once when the owner is constructed
    fn arm(&mut self, period: MillisDurationU32);

    /// Start (or restart) counting from now
    fn start(&mut self);

    /// Stop counting; `wait` keeps returning `WouldBlock` until restarted
    fn stop(&mut self);

    /// Non-blocking check for an elapsed period
    ///
    /// Returns `Ok(())` once per elapsed period and `WouldBlock` otherwise.
    fn wait(&mut self) -> nb::Result<(), Infallible>;
}
