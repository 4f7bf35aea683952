//! SpO2 and Heart-Rate Estimation
//!
//! ## Pipeline
//!
//! Both estimates start from the same valley detection on the infrared
//! channel:
//!
//! ```text
//! raw IR ──> remove DC, invert ──> 4-tap moving average ──> PeakDetector
//!                                          │                    │
//!                                  mean, clamp 30..=60 ─────────┘
//!                                      (threshold)
//! ```
//!
//! Inverting turns PPG valleys (start of each cardiac cycle) into peaks, so
//! the generic [`PeakDetector`] finds cycle boundaries.
//!
//! ### Heart Rate
//!
//! The mean distance between consecutive valleys, in samples, converted to
//! beats per minute at the configured sampling frequency and rounded to the
//! nearest beat.
//!
//! ### SpO2
//!
//! For each cycle at least four samples wide, the *raw* infrared and red
//! maxima are located. Each channel's AC component is its maximum minus the
//! straight line joining the two valley samples (the DC baseline at that
//! point). The ratio of ratios
//!
//! ```text
//!       (AC_red x DCmax_ir) >> 7
//! R =  --------------------------  x 100
//!       (AC_ir x DCmax_red) >> 7
//! ```
//!
//! is collected for up to five cycles; the median indexes the calibration
//! table in [`crate::lookup`].
//!
//! All arithmetic is integer. Products are formed in `i64`, which holds
//! 18-bit samples squared with plenty of headroom.

use heapless::Vec;

use crate::{
    constants::signal::{
        INVALID_HEART_RATE, INVALID_SPO2, MAX_RATIOS, MIN_CYCLE_WIDTH,
        MIN_VALLEYS_FOR_HEART_RATE, MOVING_AVERAGE_TAPS, RATIO_PRODUCT_SHIFT, RATIO_SCALE,
        SAMPLING_FREQUENCY_HZ, SECONDS_PER_MINUTE, THRESHOLD_MAX, THRESHOLD_MIN, WINDOW_SIZE,
    },
    errors::{CalculationError, CalculationResult},
    lookup::spo2_from_ratio,
    peaks::{PeakDetector, PeakList},
    window::SampleWindow,
};

/// Latest vitals as exchanged between contexts
///
/// Either field may hold its sentinel ([`INVALID_SPO2`],
/// [`INVALID_HEART_RATE`]) meaning "no valid estimate".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalsSnapshot {
    /// Oxygen saturation in percent, or 255
    pub spo2_percent: u8,
    /// Heart rate in beats per minute, or -999
    pub heart_rate_bpm: i32,
}

impl VitalsSnapshot {
    /// Both fields at their sentinel
    pub const INVALID: Self = Self {
        spo2_percent: INVALID_SPO2,
        heart_rate_bpm: INVALID_HEART_RATE,
    };

    /// Snapshot from raw values
    pub const fn new(spo2_percent: u8, heart_rate_bpm: i32) -> Self {
        Self { spo2_percent, heart_rate_bpm }
    }

    /// True unless SpO2 holds its sentinel
    pub fn has_spo2(&self) -> bool {
        self.spo2_percent != INVALID_SPO2
    }

    /// True unless heart rate holds its sentinel
    pub fn has_heart_rate(&self) -> bool {
        self.heart_rate_bpm != INVALID_HEART_RATE
    }
}

impl Default for VitalsSnapshot {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Outcome of one calculation pass, per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalsReading {
    /// SpO2 estimate
    pub spo2: CalculationResult<u8>,
    /// Heart-rate estimate
    pub heart_rate: CalculationResult<i32>,
}

impl VitalsReading {
    /// Values to publish, with sentinels in place of failures
    pub fn snapshot(&self) -> VitalsSnapshot {
        VitalsSnapshot {
            spo2_percent: self.spo2.unwrap_or(INVALID_SPO2),
            heart_rate_bpm: self.heart_rate.unwrap_or(INVALID_HEART_RATE),
        }
    }

    /// Both estimates succeeded
    pub fn is_complete(&self) -> bool {
        self.spo2.is_ok() && self.heart_rate.is_ok()
    }

    /// The SpO2 error if any, otherwise the heart-rate error
    pub fn first_error(&self) -> Option<CalculationError> {
        self.spo2.err().or(self.heart_rate.err())
    }
}

/// Pure estimator over one window of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VitalsCalculator {
    sampling_frequency_hz: u32,
}

impl Default for VitalsCalculator {
    fn default() -> Self {
        Self::new(SAMPLING_FREQUENCY_HZ)
    }
}

impl VitalsCalculator {
    /// Calculator for a sensor delivering `sampling_frequency_hz` samples/s
    pub const fn new(sampling_frequency_hz: u32) -> Self {
        Self { sampling_frequency_hz }
    }

    /// Sampling frequency used for the BPM conversion
    pub fn sampling_frequency_hz(&self) -> u32 {
        self.sampling_frequency_hz
    }

    /// Estimate oxygen saturation from matching infrared and red buffers
    pub fn oxygen_saturation(&self, ir: &[u32], red: &[u32]) -> CalculationResult<u8> {
        check_lengths(ir.len(), red.len())?;
        let valleys = find_valleys(ir);
        spo2_between_valleys(ir, red, &valleys)
    }

    /// Estimate heart rate from the infrared buffer
    pub fn heart_rate(&self, ir: &[u32]) -> CalculationResult<i32> {
        check_lengths(ir.len(), ir.len())?;
        let valleys = find_valleys(ir);
        self.heart_rate_from_valleys(&valleys)
    }

    /// Run both estimates on a window, sharing the valley detection
    ///
    /// A stale window yields [`CalculationError::StaleWindow`] for both.
    pub fn calculate(&self, window: &SampleWindow) -> VitalsReading {
        if window.is_stale() {
            return VitalsReading {
                spo2: Err(CalculationError::StaleWindow),
                heart_rate: Err(CalculationError::StaleWindow),
            };
        }

        let ir = window.infrared();
        let valleys = find_valleys(ir);
        let reading = VitalsReading {
            spo2: spo2_between_valleys(ir, window.red(), &valleys),
            heart_rate: self.heart_rate_from_valleys(&valleys),
        };

        log_debug!(
            "{} valleys, spo2 {:?}, heart rate {:?}",
            valleys.len(),
            reading.spo2,
            reading.heart_rate
        );
        reading
    }

    fn heart_rate_from_valleys(&self, valleys: &[usize]) -> CalculationResult<i32> {
        if valleys.len() < MIN_VALLEYS_FOR_HEART_RATE {
            return Err(CalculationError::TooFewValleys {
                found: valleys.len(),
                required: MIN_VALLEYS_FOR_HEART_RATE,
            });
        }

        let total_gap: usize = valleys.windows(2).map(|pair| pair[1] - pair[0]).sum();
        // Valleys are strictly ascending, so the mean gap is at least 1
        let mean_gap = (total_gap / (valleys.len() - 1)) as u64;

        let samples_per_minute = u64::from(self.sampling_frequency_hz) * u64::from(SECONDS_PER_MINUTE);
        let bpm = (samples_per_minute + mean_gap / 2) / mean_gap;

        Ok(i32::try_from(bpm).unwrap_or(i32::MAX))
    }
}

fn check_lengths(ir_len: usize, red_len: usize) -> CalculationResult<()> {
    if ir_len == 0 || ir_len != red_len || ir_len > WINDOW_SIZE {
        return Err(CalculationError::InvalidInput { ir_len, red_len });
    }
    Ok(())
}

/// Valley positions of the infrared channel
fn find_valleys(ir: &[u32]) -> PeakList {
    let mut buffer = [0i32; WINDOW_SIZE];
    let x = &mut buffer[..ir.len()];

    invert_about_mean(ir, x);
    smooth(x);

    PeakDetector::new(adaptive_threshold(x)).find(x)
}

fn invert_about_mean(ir: &[u32], x: &mut [i32]) {
    let sum: u64 = ir.iter().map(|&v| u64::from(v)).sum();
    let mean = (sum / ir.len() as u64) as i64;

    for (out, &v) in x.iter_mut().zip(ir) {
        let inverted = mean - i64::from(v);
        *out = inverted.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    }
}

/// Forward moving average; the last taps-1 samples stay unsmoothed
fn smooth(x: &mut [i32]) {
    for i in 0..x.len().saturating_sub(MOVING_AVERAGE_TAPS) {
        let sum: i64 = x[i..i + MOVING_AVERAGE_TAPS].iter().map(|&v| i64::from(v)).sum();
        // Mean of i32 values fits in i32
        x[i] = (sum / MOVING_AVERAGE_TAPS as i64) as i32;
    }
}

fn adaptive_threshold(x: &[i32]) -> i32 {
    let sum: i64 = x.iter().map(|&v| i64::from(v)).sum();
    let mean = sum / x.len() as i64;
    mean.clamp(i64::from(THRESHOLD_MIN), i64::from(THRESHOLD_MAX)) as i32
}

fn spo2_between_valleys(ir: &[u32], red: &[u32], valleys: &[usize]) -> CalculationResult<u8> {
    if let Some(&index) = valleys.iter().find(|&&valley| valley >= ir.len()) {
        return Err(CalculationError::ValleyOutOfRange { index, len: ir.len() });
    }

    let mut ratios: Vec<i64, MAX_RATIOS> = Vec::new();
    for pair in valleys.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end - start <= MIN_CYCLE_WIDTH {
            continue;
        }

        if let Some(ratio) = cycle_ratio(ir, red, start, end) {
            if ratios.push(ratio).is_err() {
                break;
            }
        }
    }

    if ratios.is_empty() {
        return Err(CalculationError::NoValidRatio);
    }

    ratios.sort_unstable();
    let mid = ratios.len() / 2;
    let ratio = if mid > 1 {
        (ratios[mid - 1] + ratios[mid]) / 2
    } else {
        ratios[mid]
    };

    spo2_from_ratio(ratio)
}

/// Ratio of ratios for the cycle `[start, end)`, if usable
fn cycle_ratio(ir: &[u32], red: &[u32], start: usize, end: usize) -> Option<i64> {
    let ir_peak = start + first_max_index(&ir[start..end]);
    let red_peak = start + first_max_index(&red[start..end]);

    let ir_dc_max = i64::from(ir[ir_peak]);
    let red_dc_max = i64::from(red[red_peak]);
    let ir_ac = ac_component(ir, start, end, ir_peak);
    let red_ac = ac_component(red, start, end, red_peak);

    let numerator = (red_ac * ir_dc_max) >> RATIO_PRODUCT_SHIFT;
    let denominator = (ir_ac * red_dc_max) >> RATIO_PRODUCT_SHIFT;

    (denominator > 0 && numerator != 0).then(|| numerator * RATIO_SCALE / denominator)
}

fn first_max_index(values: &[u32]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Height of `raw[peak]` above the line joining `raw[start]` and `raw[end]`
fn ac_component(raw: &[u32], start: usize, end: usize, peak: usize) -> i64 {
    let first = i64::from(raw[start]);
    let last = i64::from(raw[end]);
    let baseline = first + (last - first) * (peak - start) as i64 / (end - start) as i64;
    i64::from(raw[peak]) - baseline
}
