//! Signal Processing Constants
//!
//! Geometry of the sample window and the fixed parameters of the valley
//! detector and the SpO2 ratio estimator.

// ===== WINDOW GEOMETRY =====

/// Effective sensor output rate (samples per second).
///
/// The front end runs at 100 sps with 4-sample FIFO averaging, so one
/// averaged sample arrives every 40 ms.
pub const SAMPLING_FREQUENCY_HZ: u32 = 25;

/// Samples replaced on every acquisition tick (one second of signal).
pub const BLOCK_SIZE: usize = SAMPLING_FREQUENCY_HZ as usize;

/// Samples held in the analysis window (four seconds of signal).
///
/// Consecutive windows overlap by three blocks.
pub const WINDOW_SIZE: usize = 4 * BLOCK_SIZE;

// ===== VALLEY DETECTION =====

/// Taps of the forward moving average applied before detection.
pub const MOVING_AVERAGE_TAPS: usize = 4;

/// Lower clamp of the adaptive detection threshold (ADC counts).
pub const THRESHOLD_MIN: i32 = 30;

/// Upper clamp of the adaptive detection threshold (ADC counts).
pub const THRESHOLD_MAX: i32 = 60;

/// Peaks closer than or equal to this many samples are merged.
///
/// 4 samples at 25 sps is 160 ms, i.e. anything above 375 BPM is noise.
pub const MIN_PEAK_DISTANCE: usize = 4;

/// Upper bound on detected peaks per window.
pub const MAX_PEAKS: usize = 15;

/// Valleys required before a heart rate can be derived.
pub const MIN_VALLEYS_FOR_HEART_RATE: usize = 2;

// ===== SPO2 RATIO ESTIMATION =====

/// Cycles whose valley-to-valley span is at most this wide are skipped.
pub const MIN_CYCLE_WIDTH: usize = 3;

/// Maximum AC/DC ratios collected per window.
pub const MAX_RATIOS: usize = 5;

/// Ratios are scaled by this factor to stay in integer arithmetic.
pub const RATIO_SCALE: i64 = 100;

/// Right shift applied to AC x DC products before the ratio division.
pub const RATIO_PRODUCT_SHIFT: u32 = 7;

/// Exclusive lower bound of ratios accepted by the calibration table.
pub const CALIBRATION_RATIO_MIN: i64 = 2;

/// Exclusive upper bound of ratios accepted by the calibration table.
pub const CALIBRATION_RATIO_MAX: i64 = 184;

// ===== SENTINELS =====

/// SpO2 value meaning "no valid estimate".
pub const INVALID_SPO2: u8 = 255;

/// Heart-rate value meaning "no valid estimate".
pub const INVALID_HEART_RATE: i32 = -999;

/// Seconds per minute, for beats-per-minute conversion.
pub const SECONDS_PER_MINUTE: u32 = 60;
