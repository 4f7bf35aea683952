//! Uptime keeping for the report line
//!
//! The consumer context has no wall clock. It counts its own report ticks
//! and renders the elapsed time as `[HHh:MMm:SSs]`.

use core::fmt;

use fugit::MillisDurationU32;

use crate::constants::timing::{MS_PER_SECOND, SECONDS_PER_HOUR};

/// Milliseconds since the clock started
pub type Timestamp = u64;

/// Elapsed time split into hours, minutes and seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uptime {
    /// Whole hours; does not wrap
    pub hours: u32,
    /// 0..=59
    pub minutes: u8,
    /// 0..=59
    pub seconds: u8,
}

impl Uptime {
    /// Split a millisecond count, discarding the sub-second part
    pub fn from_millis(ms: Timestamp) -> Self {
        let total_seconds = ms / MS_PER_SECOND;
        let hours = total_seconds / SECONDS_PER_HOUR;
        let rest = total_seconds % SECONDS_PER_HOUR;

        Self {
            hours: u32::try_from(hours).unwrap_or(u32::MAX),
            minutes: (rest / 60) as u8,
            seconds: (rest % 60) as u8,
        }
    }
}

impl fmt::Display for Uptime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:02}h:{:02}m:{:02}s]", self.hours, self.minutes, self.seconds)
    }
}

/// Tick-counting clock
///
/// Advanced once per report tick by the timer period, whether or not that
/// tick managed to emit a line.
#[derive(Debug, Clone)]
pub struct UptimeClock {
    elapsed_ms: Timestamp,
    period_ms: u32,
}

impl UptimeClock {
    /// Clock that advances by `period` per tick
    pub fn new(period: MillisDurationU32) -> Self {
        Self {
            elapsed_ms: 0,
            period_ms: period.to_millis(),
        }
    }

    /// Count one tick and return the new uptime
    pub fn advance(&mut self) -> Uptime {
        self.elapsed_ms = self.elapsed_ms.saturating_add(u64::from(self.period_ms));
        self.now()
    }

    /// Current uptime without advancing
    pub fn now(&self) -> Uptime {
        Uptime::from_millis(self.elapsed_ms)
    }

    /// Raw elapsed milliseconds
    pub fn elapsed_ms(&self) -> Timestamp {
        self.elapsed_ms
    }
}
