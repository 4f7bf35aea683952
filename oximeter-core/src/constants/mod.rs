//! Constants for the Oximeter Core
//!
//! Every numeric value the acquisition engine depends on lives here with
//! its unit in the name and the reason it has the value it has.
//!
//! ## Organization
//!
//! - **Signal**: window geometry, detector limits, estimation scaling
//! - **Timing**: timer periods for the producer and consumer contexts

/// Window geometry, detector parameters and sentinel values.
pub mod signal;

/// Timer periods and settle delays.
pub mod timing;

// Re-export commonly used constants for convenience
pub use signal::{
    BLOCK_SIZE, WINDOW_SIZE, SAMPLING_FREQUENCY_HZ,
    MIN_PEAK_DISTANCE, MAX_PEAKS, MAX_RATIOS,
    INVALID_SPO2, INVALID_HEART_RATE,
};

pub use timing::{
    READ_PERIOD_MS, BACKOFF_PERIOD_MS, REPORT_PERIOD_MS, SENSOR_SETTLE_MS,
};
