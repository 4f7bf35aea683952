//! Simulator configuration file
//!
//! JSON with two optional sections; anything missing takes its default:
//!
//! ```json
//! {
//!   "acquisition": { "backoff_period_ms": 1000 },
//!   "sensor": { "heart_rate_bpm": 90, "fault_every": 500 }
//! }
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use oximeter_core::AcquisitionConfig;
use serde::{Deserialize, Serialize};

use crate::sim::SimulatedSensorConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub acquisition: AcquisitionConfig,
    pub sensor: SimulatedSensorConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::simulation(),
            sensor: SimulatedSensorConfig::default(),
        }
    }
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid simulator configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }

    /// Sensor output rate and calculator rate must agree
    pub fn sync_sampling_rate(&mut self) {
        self.acquisition.sampling_frequency_hz = self.sensor.sampling_frequency_hz;
    }
}
