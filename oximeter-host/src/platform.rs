//! `std` implementations of the core's collaborator traits

use std::convert::Infallible;
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

use fugit::MillisDurationU32;
use oximeter_core::traits::{DelayMs, PeriodicTimer, ReportSink};

/// Periodic timer on the monotonic clock
///
/// Missed periods are not queued: after a long tick the next deadline is
/// one period from now, the same as a hardware timer whose interrupt flag
/// was already set.
#[derive(Debug, Default)]
pub struct InstantTimer {
    period: Duration,
    deadline: Option<Instant>,
}

impl InstantTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }
}

impl PeriodicTimer for InstantTimer {
    fn arm(&mut self, period: MillisDurationU32) {
        self.period = Duration::from_millis(u64::from(period.to_millis()));
    }

    fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.period);
    }

    fn stop(&mut self) {
        self.deadline = None;
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        let Some(deadline) = self.deadline else {
            return Err(nb::Error::WouldBlock);
        };

        let now = Instant::now();
        if now < deadline {
            return Err(nb::Error::WouldBlock);
        }

        let next = deadline + self.period;
        self.deadline = Some(if next > now { next } else { now + self.period });
        Ok(())
    }
}

/// Blocking delay on the current thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayMs for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Report lines to standard output
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    type Error = io::Error;

    fn send(&mut self, line: &str) -> Result<(), Self::Error> {
        let mut out = io::stdout().lock();
        out.write_all(line.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_timer_never_fires() {
        let mut timer = InstantTimer::new();
        timer.arm(MillisDurationU32::millis(0));
        assert!(timer.wait().is_err());

        timer.start();
        assert!(timer.is_running());
        assert!(timer.wait().is_ok());

        timer.stop();
        assert!(timer.wait().is_err());
    }

    #[test]
    fn fires_after_period() {
        let mut timer = InstantTimer::new();
        timer.arm(MillisDurationU32::millis(100));
        timer.start();

        assert!(timer.wait().is_err());
        thread::sleep(Duration::from_millis(110));
        assert!(timer.wait().is_ok());
        // Next deadline is a full period away
        assert!(timer.wait().is_err());
    }

    #[test]
    fn missed_periods_collapse_into_one() {
        let mut timer = InstantTimer::new();
        timer.arm(MillisDurationU32::millis(50));
        timer.start();

        thread::sleep(Duration::from_millis(300));
        assert!(timer.wait().is_ok());
        assert!(timer.wait().is_err());
    }
}
