//! Fixed-Size Sliding Sample Window
//!
//! ## Overview
//!
//! The SpO2 and heart-rate estimators work on four seconds of signal. This
//! module keeps exactly that much: [`WINDOW_SIZE`] infrared/red pairs, filled
//! once at start-up and then slid forward one second ([`BLOCK_SIZE`] samples)
//! per acquisition tick.
//!
//! ## Why a Block Shift and Not a Ring?
//!
//! The estimators index the window as a plain slice (`ir[start..end]`,
//! `ir[peak]`). A ring buffer would need to unroll itself into a scratch copy
//! on every tick anyway, so the window shifts in place instead:
//!
//! ```text
//! before advance:  [ b0 | b1 | b2 | b3 ]     (b = 25-sample block)
//! shift left:      [ b1 | b2 | b3 | b3 ]
//! refill tail:     [ b1 | b2 | b3 | b4 ]
//! ```
//!
//! Consecutive windows overlap by three blocks. The shift is a `copy_within`
//! of 75 words per channel, negligible next to the one second the refill
//! spends waiting for the sensor.
//!
//! ## Channel Layout
//!
//! Infrared and red are stored as two separate arrays so each can be handed
//! to the estimators as a contiguous `&[u32]`.
//!
//! ## Partial Refill
//!
//! If a read fails half way through the tail refill, the window holds a mix
//! of shifted old samples and fresh ones, and the samples read after the
//! failure no longer follow on from them. The window stays stale until that
//! block has been shifted all the way out, which takes
//! [`REFILLS_TO_FLUSH`] complete advances. The calculator refuses a stale
//! window.
//!
//! ```text
//! failed advance:   [ b1 | b2 | b3 | xx ]   stale, 4 refills to go
//! advance:          [ b2 | b3 | xx | c0 ]   3
//! advance:          [ b3 | xx | c0 | c1 ]   2
//! advance:          [ xx | c0 | c1 | c2 ]   1
//! advance:          [ c0 | c1 | c2 | c3 ]   clean
//! ```
//!
//! ## Ownership
//!
//! The window belongs to the producer context only. It is not `Sync`-shared
//! and never crosses to the consumer; only computed vitals do.

use crate::{
    constants::signal::{BLOCK_SIZE, WINDOW_SIZE},
    errors::{SensorError, SensorResult},
    traits::PpgSensor,
};

/// Complete advances needed to shift a broken block out of the window
pub const REFILLS_TO_FLUSH: u8 = (WINDOW_SIZE / BLOCK_SIZE) as u8;

/// One paired intensity reading from the PPG front end
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    /// Infrared LED channel (18-bit ADC counts)
    pub infrared: u32,
    /// Red LED channel (18-bit ADC counts)
    pub red: u32,
}

/// Sliding window of the most recent [`WINDOW_SIZE`] samples
///
/// ## Internal Invariants
///
/// - Both channels always hold exactly [`WINDOW_SIZE`] entries
/// - Index 0 is the oldest sample, `WINDOW_SIZE - 1` the newest
/// - `stale_refills` is non-zero while a block from a failed refill is
///   still inside the window
#[derive(Clone)]
pub struct SampleWindow {
    infrared: [u32; WINDOW_SIZE],
    red: [u32; WINDOW_SIZE],
    stale_refills: u8,
}

impl SampleWindow {
    /// Fill a new window from the sensor, one sample at a time
    ///
    /// Blocks on the sensor's data-ready condition for every sample. Any
    /// failure aborts the fill; the caller treats that as fatal.
    pub fn initialize<S: PpgSensor>(sensor: &mut S) -> SensorResult<Self> {
        let mut window = Self {
            infrared: [0; WINDOW_SIZE],
            red: [0; WINDOW_SIZE],
            stale_refills: 0,
        };

        for index in 0..WINDOW_SIZE {
            let sample = read_when_ready(sensor, index)?;
            window.store(index, sample);
        }

        log_debug!("sample window filled with {} samples", WINDOW_SIZE);
        Ok(window)
    }

    /// Build a window from samples captured elsewhere (replay, tests)
    pub fn from_samples(samples: &[Sample; WINDOW_SIZE]) -> Self {
        let mut window = Self {
            infrared: [0; WINDOW_SIZE],
            red: [0; WINDOW_SIZE],
            stale_refills: 0,
        };

        for (index, sample) in samples.iter().enumerate() {
            window.store(index, *sample);
        }

        window
    }

    /// Drop the oldest block and read a fresh one into the tail
    ///
    /// On a read failure the error is returned immediately, the rest of the
    /// tail keeps its shifted contents and the window is marked stale for the
    /// next [`REFILLS_TO_FLUSH`] complete advances.
    pub fn advance<S: PpgSensor>(&mut self, sensor: &mut S) -> SensorResult<()> {
        self.infrared.copy_within(BLOCK_SIZE.., 0);
        self.red.copy_within(BLOCK_SIZE.., 0);

        for index in (WINDOW_SIZE - BLOCK_SIZE)..WINDOW_SIZE {
            match read_when_ready(sensor, index) {
                Ok(sample) => self.store(index, sample),
                Err(error) => {
                    self.stale_refills = REFILLS_TO_FLUSH;
                    return Err(error);
                }
            }
        }

        self.stale_refills = self.stale_refills.saturating_sub(1);
        Ok(())
    }

    /// Infrared channel, oldest first
    pub fn infrared(&self) -> &[u32] {
        &self.infrared
    }

    /// Red channel, oldest first
    pub fn red(&self) -> &[u32] {
        &self.red
    }

    /// Sample at `index` (0 = oldest)
    pub fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            infrared: *self.infrared.get(index)?,
            red: *self.red.get(index)?,
        })
    }

    /// Iterate over samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.infrared
            .iter()
            .zip(self.red.iter())
            .map(|(&infrared, &red)| Sample { infrared, red })
    }

    /// Number of samples; always [`WINDOW_SIZE`]
    pub const fn len(&self) -> usize {
        WINDOW_SIZE
    }

    /// Never true; a window only exists fully populated
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// True while samples from a failed refill are still in the window
    pub fn is_stale(&self) -> bool {
        self.stale_refills > 0
    }

    /// Complete advances still needed before the window is usable again
    pub fn stale_refills(&self) -> u8 {
        self.stale_refills
    }

    fn store(&mut self, index: usize, sample: Sample) {
        self.infrared[index] = sample.infrared;
        self.red[index] = sample.red;
    }
}

/// Busy-wait for data-ready, then read one sample
fn read_when_ready<S: PpgSensor>(sensor: &mut S, index: usize) -> SensorResult<Sample> {
    nb::block!(sensor.poll_ready()).map_err(|error| {
        log_warn!("data-ready poll failed at index {}: {:?}", index, error);
        SensorError::NotReady { index }
    })?;

    sensor.read_sample().map_err(|error| {
        log_warn!("sample read failed at index {}: {:?}", index, error);
        SensorError::ReadFailed { index }
    })
}
