//! Timing Constants
//!
//! Periods of the timers that drive the producer and consumer contexts.

/// Acquisition timer period in the reading state (10 Hz).
///
/// Shorter than the one second a refill actually takes; the tick simply
/// blocks on the sensor and the timer cannot re-fire while it runs.
pub const READ_PERIOD_MS: u32 = 100;

/// Acquisition timer period in the backoff state (0.2 Hz).
///
/// Gives a faulted sensor or bus five seconds to recover before the next
/// refill attempt.
pub const BACKOFF_PERIOD_MS: u32 = 5_000;

/// Consumer-side report period (1 Hz).
pub const REPORT_PERIOD_MS: u32 = 1_000;

/// Delay after sensor init and after writing the default configuration.
pub const SENSOR_SETTLE_MS: u32 = 100;

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1_000;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = 3_600;
