//! Synthetic PPG front end
//!
//! Produces a dip-per-heartbeat waveform on both channels at the
//! configured sampling rate:
//!
//! ```text
//! IR  ‾‾‾‾\_/‾‾‾‾‾‾‾‾‾‾‾‾‾\_/‾‾‾‾‾‾‾‾‾‾‾‾‾\_/‾‾‾
//! RED ‾‾‾‾\_/‾‾‾‾‾‾‾‾‾‾‾‾‾\_/‾‾‾‾‾‾‾‾‾‾‾‾‾\_/‾‾‾   (shallower)
//!         |<-- 60 * fs / bpm samples -->|
//! ```
//!
//! The red dip is scaled from the infrared dip by `target_ratio / 100`, so
//! the estimated ratio of ratios lands close to `target_ratio`. Uniform
//! noise and periodic read failures can be switched on to exercise the
//! backoff path.

use std::time::{Duration, Instant};

use oximeter_core::{constants::SAMPLING_FREQUENCY_HZ, traits::PpgSensor, Sample};
use serde::{Deserialize, Serialize};

/// Samples per dip
const DIP_WIDTH: u64 = 4;

/// How far the sensor may fall behind before pacing restarts from now
const MAX_LAG: Duration = Duration::from_secs(1);

/// Knobs of the synthetic sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedSensorConfig {
    /// Simulated pulse rate
    pub heart_rate_bpm: u32,
    /// Red/IR ratio of ratios, scaled x100
    pub target_ratio: u32,
    /// DC level of both channels
    pub baseline: u32,
    /// Infrared dip depth
    pub ir_depth: u32,
    /// Uniform noise amplitude (+- counts)
    pub noise: u32,
    /// Fail every n-th read
    pub fault_every: Option<u64>,
    /// Output rate
    pub sampling_frequency_hz: u32,
    /// Pace samples at the real sampling rate
    pub realtime: bool,
    /// Noise seed
    pub seed: u32,
}

impl Default for SimulatedSensorConfig {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 75,
            target_ratio: 30,
            baseline: 50_000,
            ir_depth: 400,
            noise: 8,
            fault_every: None,
            sampling_frequency_hz: SAMPLING_FREQUENCY_HZ,
            realtime: true,
            seed: 7,
        }
    }
}

/// Errors the simulated driver reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Read failed on purpose
    InjectedFault {
        /// Zero-based read number
        read: u64,
    },
    /// Sensor used before `init`
    NotInitialized,
}

/// Deterministic synthetic PPG sensor
#[derive(Debug)]
pub struct SyntheticSensor {
    config: SimulatedSensorConfig,
    reads: u64,
    rng: u32,
    initialized: bool,
    next_due: Option<Instant>,
}

impl SyntheticSensor {
    pub fn new(config: SimulatedSensorConfig) -> Self {
        let rng = config.seed.max(1);
        Self {
            config,
            reads: 0,
            rng,
            initialized: false,
            next_due: None,
        }
    }

    pub fn reads(&self) -> u64 {
        self.reads
    }

    fn sample_period(&self) -> Duration {
        Duration::from_secs(1) / self.config.sampling_frequency_hz.max(1)
    }

    fn in_dip(&self, n: u64) -> bool {
        let bpm = u64::from(self.config.heart_rate_bpm.max(1));
        let samples_per_minute = u64::from(self.config.sampling_frequency_hz) * 60;
        (n * bpm) % samples_per_minute < DIP_WIDTH * bpm
    }

    fn jitter(&mut self) -> i64 {
        let amplitude = self.config.noise;
        if amplitude == 0 {
            return 0;
        }
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 17;
        self.rng ^= self.rng << 5;
        i64::from(self.rng % (2 * amplitude + 1)) - i64::from(amplitude)
    }

    fn channel(&mut self, depth: u32, dip: bool) -> u32 {
        let level = i64::from(self.config.baseline) - if dip { i64::from(depth) } else { 0 };
        let noisy = level + self.jitter();
        noisy.clamp(0, i64::from(u32::MAX)) as u32
    }
}

impl PpgSensor for SyntheticSensor {
    type Error = SimError;

    fn init(&mut self) {
        self.initialized = true;
        log::debug!("synthetic sensor initialised: {:?}", self.config);
    }

    fn default_config(&mut self) -> Result<(), Self::Error> {
        if self.initialized {
            Ok(())
        } else {
            Err(SimError::NotInitialized)
        }
    }

    fn poll_ready(&mut self) -> nb::Result<(), Self::Error> {
        if !self.config.realtime {
            return Ok(());
        }

        let now = Instant::now();
        let due = *self.next_due.get_or_insert(now);
        if now < due {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }

    fn read_sample(&mut self) -> Result<Sample, Self::Error> {
        let n = self.reads;
        self.reads += 1;

        if let Some(due) = self.next_due {
            let now = Instant::now();
            let next = due + self.sample_period();
            self.next_due = Some(if now.duration_since(next) > MAX_LAG { now } else { next });
        }

        if let Some(every) = self.config.fault_every.filter(|&every| every > 0) {
            if (n + 1) % every == 0 {
                return Err(SimError::InjectedFault { read: n });
            }
        }

        let dip = self.in_dip(n);
        let ir_depth = self.config.ir_depth;
        let red_depth = ir_depth * self.config.target_ratio / 100;

        Ok(Sample {
            infrared: self.channel(ir_depth, dip),
            red: self.channel(red_depth, dip),
        })
    }
}
