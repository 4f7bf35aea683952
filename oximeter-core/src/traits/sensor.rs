//! PPG Sensor Abstraction
//!
//! Models the boundary to the optical front end (a MAX3010x-class device on
//! I2C). Register-level details stay in the driver; the core only needs to
//! bring the device up, wait for the data-ready condition and pull one
//! infrared/red pair at a time.
//!
//! ## Waiting for data
//!
//! Readiness is reported through `nb::Result` so the busy-wait lives in one
//! place (`nb::block!` inside the sample window) and a mock can report
//! "ready" on the first poll:
//!
//! ```rust
//! use oximeter_core::traits::PpgSensor;
//! use oximeter_core::Sample;
//!
//! struct AlwaysReady(u32);
//!
//! impl PpgSensor for AlwaysReady {
//!     type Error = ();
//!
//!     fn init(&mut self) {}
//!
//!     fn default_config(&mut self) -> Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     fn poll_ready(&mut self) -> nb::Result<(), Self::Error> {
//!         Ok(())
//!     }
//!
//!     fn read_sample(&mut self) -> Result<Sample, Self::Error> {
//!         self.0 += 1;
//!         Ok(Sample { infrared: self.0, red: self.0 })
//!     }
//! }
//! ```

use core::fmt::Debug;

use crate::window::Sample;

/// Optical front end delivering paired infrared/red intensities
pub trait PpgSensor {
    /// Driver-specific error (bus NAK, timeout, ...)
    type Error: Debug;

    /// Set up pins and bus for the device
    fn init(&mut self);

    /// Reset the device and write the acquisition configuration
    fn default_config(&mut self) -> Result<(), Self::Error>;

    /// Check the data-ready condition
    ///
    /// Returns `Err(nb::Error::WouldBlock)` until a new sample is available.
    fn poll_ready(&mut self) -> nb::Result<(), Self::Error>;

    /// Read one sample from the device FIFO
    fn read_sample(&mut self) -> Result<Sample, Self::Error>;
}

/// Blocking millisecond delay used during bring-up
pub trait DelayMs {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Delay that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayMs for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}
