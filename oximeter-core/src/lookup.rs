//! SpO2 Calibration Lookup Table
//!
//! ## Motivation
//!
//! The relation between the red/infrared "ratio of ratios" and arterial
//! oxygen saturation is empirical. Instead of a fitted polynomial (floating
//! point, slow on the target) the firmware uses a hand-measured table indexed
//! directly by the integer ratio.
//!
//! ```text
//!          AC_red / DC_red
//! R x 100 = --------------- x 100      SpO2 = TABLE[R x 100]
//!          AC_ir  / DC_ir
//! ```
//!
//! ## Table Shape
//!
//! ```text
//! SpO2 %
//!  100 |        ____________
//!   95 | ______/            \___
//!   80 |                        \___
//!      |                            \___
//!    1 |                                \
//!      +-----------------------------------> ratio
//!      0   24         43          95     182
//! ```
//!
//! Values rise to a plateau of 100 % (ratios 24..=43) and then fall
//! monotonically. The measured data covers 183 ratios; slot 183 is unused
//! and reads 0.
//!
//! Only ratios strictly between [`CALIBRATION_RATIO_MIN`] and
//! [`CALIBRATION_RATIO_MAX`] are looked up; anything else is a calculation
//! error.

use crate::{
    constants::signal::{CALIBRATION_RATIO_MAX, CALIBRATION_RATIO_MIN},
    errors::{CalculationError, CalculationResult},
};

/// Number of slots in the calibration table
pub const CALIBRATION_TABLE_LEN: usize = 184;

/// Ratio (x100) to SpO2 percentage
pub const SPO2_CALIBRATION_TABLE: [u8; CALIBRATION_TABLE_LEN] = [
    95, 95, 95, 96, 96, 96, 97, 97, 97, 97, 97, 98, 98, 98, 98, 98, 99, 99, 99, 99,
    99, 99, 99, 99, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100, 100,
    100, 100, 100, 100, 100, 100, 100, 99, 99, 99, 99, 99, 99, 99, 99, 98, 98, 98,
    98, 98, 98, 97, 97, 97, 97, 96, 96, 96, 96, 95, 95, 95, 94, 94, 94, 93, 93, 93,
    92, 92, 92, 91, 91, 90, 90, 89, 89, 89, 88, 88, 87, 87, 86, 86, 85, 85, 84, 84,
    83, 82, 82, 81, 81, 80, 80, 79, 78, 78, 77, 76, 76, 75, 74, 74, 73, 72, 72, 71,
    70, 69, 69, 68, 67, 66, 66, 65, 64, 63, 62, 62, 61, 60, 59, 58, 57, 56, 56, 55,
    54, 53, 52, 51, 50, 49, 48, 47, 46, 45, 44, 43, 42, 41, 40, 39, 38, 37, 36, 35,
    34, 33, 31, 30, 29, 28, 27, 26, 25, 23, 22, 21, 20, 19, 17, 16, 15, 14, 12, 11,
    10, 9, 7, 6, 5, 3, 2, 1, 0,
];

/// Map a median ratio (scaled x100) to an SpO2 percentage
///
/// Both ends of the calibrated range are exclusive: a ratio of exactly 2 or
/// exactly 184 is rejected.
pub fn spo2_from_ratio(ratio: i64) -> CalculationResult<u8> {
    if ratio <= CALIBRATION_RATIO_MIN || ratio >= CALIBRATION_RATIO_MAX {
        log_debug!("ratio {} outside calibration range", ratio);
        return Err(CalculationError::RatioOutOfRange { ratio });
    }

    // Range check above keeps the index inside the table
    usize::try_from(ratio)
        .ok()
        .and_then(|index| SPO2_CALIBRATION_TABLE.get(index).copied())
        .ok_or(CalculationError::RatioOutOfRange { ratio })
}
