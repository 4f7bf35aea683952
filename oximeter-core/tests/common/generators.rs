//! Synthetic PPG front ends
//!
//! The pulse model is deliberately crude: a flat baseline with a 4-sample
//! dip per heartbeat on both channels. That is enough to exercise valley
//! detection and the AC/DC ratio path with known answers:
//!
//! | period (samples) | heart rate | red dip | ratio | SpO2 |
//! |------------------|------------|---------|-------|------|
//! | 20               | 75 BPM     | 120     | ~30   | 100  |
//! | 25               | 60 BPM     | 120     | ~30   | 100  |
//! | 30               | 50 BPM     | 120     | ~30   | 100  |

use oximeter_core::{traits::PpgSensor, Sample};

use super::TestRng;

/// Baseline intensity of both channels
pub const BASELINE: i64 = 50_000;

/// Samples per dip
pub const DIP_WIDTH: usize = 4;

/// Periodic dip waveform with optional noise and injected read failures
pub struct PulseSensor {
    period: usize,
    ir_depth: i64,
    red_depth: i64,
    noise: u32,
    rng: TestRng,
    reads: usize,
    failing_reads: Vec<usize>,
    reject_config: bool,
}

impl PulseSensor {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ir_depth: 400,
            red_depth: 120,
            noise: 0,
            rng: TestRng::new(7),
            reads: 0,
            failing_reads: Vec::new(),
            reject_config: false,
        }
    }

    /// Add uniform noise of +-`amplitude` counts to both channels
    pub fn with_noise(mut self, amplitude: u32) -> Self {
        self.noise = amplitude;
        self
    }

    pub fn with_red_depth(mut self, depth: i64) -> Self {
        self.red_depth = depth;
        self
    }

    /// Fail the read with this zero-based sequence number
    pub fn fail_read(mut self, read: usize) -> Self {
        self.failing_reads.push(read);
        self
    }

    pub fn reject_config(mut self) -> Self {
        self.reject_config = true;
        self
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl PpgSensor for PulseSensor {
    type Error = &'static str;

    fn init(&mut self) {}

    fn default_config(&mut self) -> Result<(), Self::Error> {
        if self.reject_config {
            Err("mode register write failed")
        } else {
            Ok(())
        }
    }

    fn poll_ready(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Sample, Self::Error> {
        let n = self.reads;
        self.reads += 1;

        if self.failing_reads.contains(&n) {
            return Err("i2c timeout");
        }

        let in_dip = n % self.period < DIP_WIDTH;
        let ir_dip = if in_dip { self.ir_depth } else { 0 };
        let red_dip = if in_dip { self.red_depth } else { 0 };

        let infrared = BASELINE - ir_dip + self.rng.jitter(self.noise);
        let red = BASELINE - red_dip + self.rng.jitter(self.noise);

        Ok(Sample {
            infrared: infrared as u32,
            red: red as u32,
        })
    }
}

/// Read `n` yields `(n, n + 1_000_000)`
#[derive(Default)]
pub struct CountingSensor {
    reads: u32,
}

impl PpgSensor for CountingSensor {
    type Error = core::convert::Infallible;

    fn init(&mut self) {}

    fn default_config(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn poll_ready(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Sample, Self::Error> {
        let n = self.reads;
        self.reads += 1;
        Ok(Sample {
            infrared: n,
            red: n + 1_000_000,
        })
    }
}
