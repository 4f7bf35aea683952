//! Common test utilities for integration tests
//!
//! This module provides:
//! - Synthetic PPG sensors with configurable pulse, noise and faults
//! - Hand-fired timers and recording sinks
//! - A small deterministic RNG

#![allow(dead_code)]

pub mod generators;

use std::convert::Infallible;

use fugit::MillisDurationU32;
use oximeter_core::traits::{PeriodicTimer, ReportSink};

pub use generators::{CountingSensor, PulseSensor};

/// Xorshift generator, reproducible across runs
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    /// Uniform in `-amplitude..=amplitude`
    pub fn jitter(&mut self, amplitude: u32) -> i64 {
        if amplitude == 0 {
            return 0;
        }
        i64::from(self.next_u32() % (2 * amplitude + 1)) - i64::from(amplitude)
    }
}

/// Timer fired by hand
#[derive(Debug, Default)]
pub struct ManualTimer {
    period_ms: Option<u32>,
    running: bool,
    fired: bool,
}

impl ManualTimer {
    /// Pretend one period elapsed
    pub fn fire(&mut self) {
        self.fired = true;
    }

    /// Period passed to `arm`
    pub fn period_ms(&self) -> Option<u32> {
        self.period_ms
    }

    /// Started and not stopped
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl PeriodicTimer for ManualTimer {
    fn arm(&mut self, period: MillisDurationU32) {
        self.period_ms = Some(period.to_millis());
    }

    fn start(&mut self) {
        self.running = true;
        self.fired = false;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        if self.running && self.fired {
            self.fired = false;
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

/// Timer that is always due
#[derive(Debug, Default)]
pub struct FreeRunningTimer;

impl PeriodicTimer for FreeRunningTimer {
    fn arm(&mut self, _period: MillisDurationU32) {}
    fn start(&mut self) {}
    fn stop(&mut self) {}

    fn wait(&mut self) -> nb::Result<(), Infallible> {
        Ok(())
    }
}

/// Sink collecting report lines
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Vec<String>,
    fail: bool,
}

impl RecordingSink {
    /// Sink that rejects every line
    pub fn failing() -> Self {
        Self { lines: Vec::new(), fail: true }
    }

    /// Lines received so far
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl ReportSink for RecordingSink {
    type Error = ();

    fn send(&mut self, line: &str) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.lines.push(line.to_owned());
        Ok(())
    }
}
