//! Core acquisition engine for a PPG pulse oximeter
//!
//! Turns raw infrared/red photoplethysmography samples into SpO2 and
//! heart-rate estimates and hands them from the producer core to the
//! reporting core.
//!
//! Key constraints:
//! - Runs without an allocator (`no_std` with `--no-default-features`)
//! - Fixed 100-sample window, all processing in integer arithmetic
//! - The only state shared between cores is one try-locked slot
//!
//! ```no_run
//! use oximeter_core::{bring_up, AcquisitionConfig, SharedVitalsStore, SchedulerTimers};
//! # use oximeter_core::traits::{PpgSensor, PeriodicTimer, DelayMs};
//! # fn demo<S: PpgSensor, T: PeriodicTimer, D: DelayMs>(sensor: S, read: T, backoff: T, delay: &mut D) {
//! static STORE: SharedVitalsStore = SharedVitalsStore::new();
//!
//! let config = AcquisitionConfig::default();
//! let timers = SchedulerTimers { read, backoff };
//! match bring_up(sensor, delay, &STORE, timers, &config) {
//!     Ok(mut scheduler) => scheduler.run(),
//!     Err(_) => {} // fatal, the acquisition loop never starts
//! }
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(all(test, not(feature = "std")))]
extern crate std;

// Logging shims: `log` when the feature is on. Without it the arguments
// are still type-checked and borrowed, but nothing is emitted.
#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

pub mod config;
pub mod constants;
pub mod errors;
pub mod lookup;
pub mod peaks;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod time;
pub mod traits;
pub mod vitals;
pub mod window;

#[cfg(test)]
mod testing;

// Public API
pub use config::AcquisitionConfig;
pub use errors::{CalculationError, SensorError, StoreError};
pub use peaks::{PeakDetector, PeakList};
pub use report::{ReportOutcome, VitalsReporter};
pub use scheduler::{bring_up, AcquisitionScheduler, AcquisitionState, SchedulerTimers, TickOutcome};
pub use store::{AtomicTryLock, SharedVitalsStore, StoreStats};
pub use vitals::{VitalsCalculator, VitalsReading, VitalsSnapshot};
pub use window::{Sample, SampleWindow};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
