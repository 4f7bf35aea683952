//! Consumer-Side Vitals Reporting
//!
//! Runs on the second execution context. Once per report tick it tries to
//! fetch the latest pair from the [`SharedVitalsStore`], formats it and
//! hands the line to a [`ReportSink`]:
//!
//! ```text
//! [00h:01m:07s] 72BPM, 97%SpO2,
//! [00h:01m:08s] -999BPM, 255%SpO2,     <- sentinels printed as-is
//! ```
//!
//! If the slot is busy nothing is printed for that tick; the reporter keeps
//! its previous copy. The uptime clock advances on every tick regardless,
//! so the timestamps stay in step with the timer.

use core::fmt::Write;

use heapless::String;

use crate::{
    errors::StoreError,
    store::{AtomicTryLock, SharedVitalsStore},
    time::{Uptime, UptimeClock},
    traits::{PeriodicTimer, ReportSink, TryLock},
    vitals::VitalsSnapshot,
};

/// Longest report line, including the newline
pub const REPORT_LINE_CAPACITY: usize = 64;

/// One formatted report line
pub type ReportLine = String<REPORT_LINE_CAPACITY>;

/// Render `"[HHh:MMm:SSs] <hr>BPM, <spo2>%SpO2,\n"`
///
/// The buffer is sized for the widest values of every field; `None` means
/// the formatter itself failed.
pub fn format_report(uptime: Uptime, vitals: &VitalsSnapshot) -> Option<ReportLine> {
    let mut line = ReportLine::new();
    writeln!(
        line,
        "{} {}BPM, {}%SpO2,",
        uptime, vitals.heart_rate_bpm, vitals.spo2_percent
    )
    .ok()?;
    Some(line)
}

/// What a report tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    /// Line delivered to the sink
    Sent(VitalsSnapshot),
    /// Slot was busy; nothing printed
    Busy(StoreError),
    /// Sink refused the line
    SinkFailed,
    /// Line did not fit the buffer
    Overflow,
}

/// Periodic reporter owning the consumer context
pub struct VitalsReporter<'a, K, T, L = AtomicTryLock>
where
    K: ReportSink,
    T: PeriodicTimer,
    L: TryLock,
{
    store: &'a SharedVitalsStore<L>,
    sink: K,
    timer: T,
    clock: UptimeClock,
    last: VitalsSnapshot,
}

impl<'a, K, T, L> VitalsReporter<'a, K, T, L>
where
    K: ReportSink,
    T: PeriodicTimer,
    L: TryLock,
{
    /// Arm and start the report timer
    pub fn new(
        store: &'a SharedVitalsStore<L>,
        sink: K,
        mut timer: T,
        period: fugit::MillisDurationU32,
    ) -> Self {
        timer.arm(period);
        timer.start();

        Self {
            store,
            sink,
            timer,
            clock: UptimeClock::new(period),
            last: VitalsSnapshot::INVALID,
        }
    }

    /// Consumer entry point: latest vitals, or why they are unavailable
    pub fn fetch_vitals(&mut self) -> Result<VitalsSnapshot, StoreError> {
        let vitals = self.store.fetch()?;
        self.last = vitals;
        Ok(vitals)
    }

    /// One report tick
    pub fn report(&mut self) -> ReportOutcome {
        let uptime = self.clock.advance();

        let vitals = match self.fetch_vitals() {
            Ok(vitals) => vitals,
            Err(error) => {
                log_debug!("report skipped: {}", error);
                return ReportOutcome::Busy(error);
            }
        };

        let Some(line) = format_report(uptime, &vitals) else {
            return ReportOutcome::Overflow;
        };

        match self.sink.send(&line) {
            Ok(()) => ReportOutcome::Sent(vitals),
            Err(error) => {
                log_warn!("report sink failed: {:?}", error);
                ReportOutcome::SinkFailed
            }
        }
    }

    /// Run a report tick if the timer has fired
    pub fn poll(&mut self) -> nb::Result<ReportOutcome, core::convert::Infallible> {
        self.timer.wait()?;
        Ok(self.report())
    }

    /// Report forever
    pub fn run(&mut self) -> ! {
        loop {
            let _ = nb::block!(self.poll());
        }
    }

    /// Last pair successfully fetched (sentinels before the first)
    pub fn last_snapshot(&self) -> VitalsSnapshot {
        self.last
    }

    /// Uptime printed on the most recent tick
    pub fn uptime(&self) -> Uptime {
        self.clock.now()
    }

    /// Borrow the sink
    pub fn sink(&self) -> &K {
        &self.sink
    }
}
