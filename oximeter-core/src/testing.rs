//! Test doubles shared by the unit tests
#![allow(unsafe_code)] // TryLock impl for the switchable lock

use std::string::String;
use std::vec::Vec;

use core::convert::Infallible;
use core::sync::atomic::{AtomicBool, Ordering};

use fugit::MillisDurationU32;

use crate::{
    constants::signal::WINDOW_SIZE,
    store::AtomicTryLock,
    traits::{DelayMs, PeriodicTimer, PpgSensor, ReportSink, TryLock},
    window::{Sample, SampleWindow},
};

/// Width of each dip in the synthetic waveforms
pub const DIP_WIDTH: usize = 4;

/// Flat baseline with `DIP_WIDTH`-sample dips of `depth` starting at `starts`
pub fn dip_train(baseline: u32, depth: u32, starts: &[usize]) -> [u32; WINDOW_SIZE] {
    let mut channel = [baseline; WINDOW_SIZE];
    for &start in starts {
        for sample in channel.iter_mut().skip(start).take(DIP_WIDTH) {
            *sample = baseline - depth;
        }
    }
    channel
}

/// Window from two channel buffers of [`WINDOW_SIZE`] samples
pub fn window_from_channels(ir: &[u32], red: &[u32]) -> SampleWindow {
    let mut samples = [Sample::default(); WINDOW_SIZE];
    for (i, sample) in samples.iter_mut().enumerate() {
        *sample = Sample { infrared: ir[i], red: red[i] };
    }
    SampleWindow::from_samples(&samples)
}

/// Sensor replaying a deterministic sample sequence
pub struct ScriptedSensor {
    source: fn(usize) -> Sample,
    reads: usize,
    polls: usize,
    busy_polls: usize,
    busy_remaining: usize,
    failing_reads: Vec<usize>,
    reject_config: bool,
    initialized: bool,
}

impl ScriptedSensor {
    fn with_source(source: fn(usize) -> Sample) -> Self {
        Self {
            source,
            reads: 0,
            polls: 0,
            busy_polls: 0,
            busy_remaining: 0,
            failing_reads: Vec::new(),
            reject_config: false,
            initialized: false,
        }
    }

    /// Read `n` yields infrared `n`, red `1_000_000 + n`
    pub fn counting() -> Self {
        Self::with_source(|n| Sample {
            infrared: n as u32,
            red: 1_000_000 + n as u32,
        })
    }

    /// 75 BPM pulse (period 20 samples) on a 50 000 count baseline
    pub fn pulsing() -> Self {
        Self::with_source(|n| {
            let in_dip = n % 20 < DIP_WIDTH;
            Sample {
                infrared: if in_dip { 49_600 } else { 50_000 },
                red: if in_dip { 49_880 } else { 50_000 },
            }
        })
    }

    /// Constant signal, no pulse
    pub fn flat() -> Self {
        Self::with_source(|_| Sample { infrared: 50_000, red: 50_000 })
    }

    /// Fail the read with this zero-based sequence number
    pub fn fail_read_at(mut self, read: usize) -> Self {
        self.failing_reads.push(read);
        self
    }

    /// Report "not ready" this many times before every sample
    pub fn busy_polls(mut self, count: usize) -> Self {
        self.busy_polls = count;
        self.busy_remaining = count;
        self
    }

    /// Make `default_config` fail
    pub fn reject_config(mut self) -> Self {
        self.reject_config = true;
        self
    }

    /// Total data-ready polls so far
    pub fn polls(&self) -> usize {
        self.polls
    }
}

impl PpgSensor for ScriptedSensor {
    type Error = &'static str;

    fn init(&mut self) {
        self.initialized = true;
    }

    fn default_config(&mut self) -> Result<(), Self::Error> {
        if self.reject_config || !self.initialized {
            return Err("config write NAK");
        }
        Ok(())
    }

    fn poll_ready(&mut self) -> nb::Result<(), Self::Error> {
        self.polls += 1;
        if self.busy_remaining > 0 {
            self.busy_remaining -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.busy_remaining = self.busy_polls;
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Sample, Self::Error> {
        let read = self.reads;
        self.reads += 1;

        if self.failing_reads.contains(&read) {
            return Err("fifo read NAK");
        }
        Ok((self.source)(read))
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

/// Delay that records requested durations
#[derive(Debug, Default)]
pub struct RecordingDelay {
    calls: Vec<u32>,
}

impl RecordingDelay {
    /// Durations requested so far
    pub fn calls(&self) -> &[u32] {
        &self.calls
    }
}

impl DelayMs for RecordingDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
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
        self.lines.push(String::from(line));
        Ok(())
    }
}

/// Lock that can be forced busy to simulate the other context
#[derive(Debug, Default)]
pub struct SwitchLock {
    busy: AtomicBool,
    inner: AtomicTryLock,
}

impl SwitchLock {
    /// Force every `try_acquire` to fail (or stop forcing it)
    pub fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Relaxed);
    }
}

unsafe impl TryLock for SwitchLock {
    fn try_acquire(&self) -> bool {
        !self.busy.load(Ordering::Relaxed) && self.inner.try_acquire()
    }

    unsafe fn release(&self) {
        self.inner.release()
    }
}
