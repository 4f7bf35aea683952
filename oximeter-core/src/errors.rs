//! Error Types for Acquisition, Calculation and Result Exchange
//!
//! ## Design Philosophy
//!
//! Errors are returned from code that runs inside periodic timer ticks on a
//! microcontroller, so they follow the same rules as the rest of the core:
//!
//! 1. **Small Size**: every variant carries at most two machine words.
//! 2. **No Heap Allocation**: no `String`, only plain integers.
//! 3. **Copy Semantics**: errors are cheap to return, log and store.
//!
//! ## Error Categories
//!
//! ### Sensor Failures ([`SensorError`])
//! Bus or device failure while talking to the PPG front end. Fatal during
//! bring-up; during steady state it moves the scheduler into backoff and the
//! cycle publishes nothing.
//!
//! ### Calculation Failures ([`CalculationError`])
//! The signal was too poor to estimate a value (too few valleys, no usable
//! AC/DC ratio, ratio outside the calibration table). Tolerated: the sentinel
//! value is published instead and acquisition continues.
//!
//! ### Exchange Failures ([`StoreError`])
//! The single shared slot was held by the other core. Tolerated: nothing is
//! retried and the previous value stays authoritative.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use oximeter_core::{CalculationError, VitalsCalculator};
//!
//! let calculator = VitalsCalculator::default();
//! let flat = [50_000u32; 100];
//!
//! match calculator.heart_rate(&flat) {
//!     Ok(bpm) => { let _ = bpm; }
//!     Err(CalculationError::TooFewValleys { .. }) => {
//!         // No pulse visible, publish the sentinel
//!     }
//!     Err(_) => {}
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type for vitals calculations
pub type CalculationResult<T> = Result<T, CalculationError>;

/// Result type for the shared vitals slot
pub type StoreResult<T> = Result<T, StoreError>;

/// Hardware or bus failure while talking to the PPG sensor
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Writing the default register configuration failed
    #[error("Sensor rejected default configuration")]
    ConfigRejected,

    /// Polling the data-ready line failed
    #[error("Data-ready poll failed before window index {index}")]
    NotReady {
        /// Window position that was waiting for data
        index: usize,
    },

    /// Reading the FIFO sample failed
    #[error("Sample read failed at window index {index}")]
    ReadFailed {
        /// Window position that should have received the sample
        index: usize,
    },
}

/// Signal quality too poor to produce an estimate
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationError {
    /// Channel buffers are empty, differ in length, or exceed the window
    #[error("Invalid input: ir has {ir_len} samples, red has {red_len}")]
    InvalidInput {
        /// Infrared buffer length
        ir_len: usize,
        /// Red buffer length
        red_len: usize,
    },

    /// Not enough valleys to delimit a cardiac cycle
    #[error("Found {found} valleys, need {required}")]
    TooFewValleys {
        /// Valleys found by the detector
        found: usize,
        /// Minimum needed for the estimate
        required: usize,
    },

    /// Detector returned a boundary outside the window
    #[error("Valley index {index} outside window of {len} samples")]
    ValleyOutOfRange {
        /// Offending index
        index: usize,
        /// Window length
        len: usize,
    },

    /// No cycle produced a usable AC/DC ratio
    #[error("No usable AC/DC ratio in window")]
    NoValidRatio,

    /// Median ratio falls outside the calibration table
    #[error("Ratio {ratio} outside calibration range")]
    RatioOutOfRange {
        /// Median ratio (scaled x100)
        ratio: i64,
    },

    /// Window refill failed part way and holds mixed old/new data
    #[error("Sample window is stale after a failed refill")]
    StaleWindow,
}

/// Shared slot was busy; the operation was dropped without retry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Producer could not take the lock; previous values stay visible
    #[error("Vitals slot busy, publish dropped")]
    SaveContended,

    /// Consumer could not take the lock; caller keeps its previous copy
    #[error("Vitals slot busy, fetch skipped")]
    LoadContended,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ConfigRejected =>
                defmt::write!(fmt, "Sensor config rejected"),
            Self::NotReady { index } =>
                defmt::write!(fmt, "Data-ready poll failed at {}", index),
            Self::ReadFailed { index } =>
                defmt::write!(fmt, "Sample read failed at {}", index),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalculationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInput { ir_len, red_len } =>
                defmt::write!(fmt, "Invalid input ir={} red={}", ir_len, red_len),
            Self::TooFewValleys { found, required } =>
                defmt::write!(fmt, "Found {} valleys, need {}", found, required),
            Self::ValleyOutOfRange { index, len } =>
                defmt::write!(fmt, "Valley {} outside {}", index, len),
            Self::NoValidRatio =>
                defmt::write!(fmt, "No usable ratio"),
            Self::RatioOutOfRange { ratio } =>
                defmt::write!(fmt, "Ratio {} out of range", ratio),
            Self::StaleWindow =>
                defmt::write!(fmt, "Stale window"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StoreError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SaveContended => defmt::write!(fmt, "Publish dropped, slot busy"),
            Self::LoadContended => defmt::write!(fmt, "Fetch skipped, slot busy"),
        }
    }
}
