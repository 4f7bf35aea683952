//! Runtime configuration of the acquisition and report loops
//!
//! Fixed algorithm parameters live in [`crate::constants`]. What is here
//! can differ between boards or between a target build and the host
//! simulator: timer periods, the settle delay and the sensor output rate.

use fugit::MillisDurationU32;

use crate::constants::{
    signal::SAMPLING_FREQUENCY_HZ,
    timing::{BACKOFF_PERIOD_MS, READ_PERIOD_MS, REPORT_PERIOD_MS, SENSOR_SETTLE_MS},
};

/// Timer periods and sensor parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AcquisitionConfig {
    /// Acquisition timer period while reading
    pub read_period_ms: u32,
    /// Acquisition timer period while backing off after a sensor fault
    pub backoff_period_ms: u32,
    /// Report timer period on the consumer side
    pub report_period_ms: u32,
    /// Delay after sensor init and after configuration
    pub settle_ms: u32,
    /// Effective sensor output rate
    pub sampling_frequency_hz: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            read_period_ms: READ_PERIOD_MS,
            backoff_period_ms: BACKOFF_PERIOD_MS,
            report_period_ms: REPORT_PERIOD_MS,
            settle_ms: SENSOR_SETTLE_MS,
            sampling_frequency_hz: SAMPLING_FREQUENCY_HZ,
        }
    }
}

impl AcquisitionConfig {
    /// Shorter backoff for sensors that recover quickly (bench setups)
    pub fn fast_recovery() -> Self {
        Self {
            backoff_period_ms: 1_000,
            ..Self::default()
        }
    }

    /// No settle delays; for simulated sensors
    pub fn simulation() -> Self {
        Self {
            settle_ms: 0,
            ..Self::default()
        }
    }

    /// Read timer period
    pub fn read_period(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.read_period_ms)
    }

    /// Backoff timer period
    pub fn backoff_period(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.backoff_period_ms)
    }

    /// Report timer period
    pub fn report_period(&self) -> MillisDurationU32 {
        MillisDurationU32::millis(self.report_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_firmware_rates() {
        let config = AcquisitionConfig::default();
        assert_eq!(config.read_period().to_millis(), 100);
        assert_eq!(config.backoff_period().to_millis(), 5_000);
        assert_eq!(config.report_period().to_millis(), 1_000);
        assert_eq!(config.sampling_frequency_hz, 25);
    }

    #[test]
    fn presets_override_one_knob() {
        let fast = AcquisitionConfig::fast_recovery();
        assert_eq!(fast.backoff_period_ms, 1_000);
        assert_eq!(fast.read_period_ms, READ_PERIOD_MS);

        assert_eq!(AcquisitionConfig::simulation().settle_ms, 0);
    }
}
