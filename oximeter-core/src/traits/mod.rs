//! Collaborator Traits for the Acquisition Engine
//!
//! The core never touches hardware directly. Everything outside the signal
//! path is reached through one of these traits so it can be swapped for a
//! real driver on the target, a thread-backed shim on a host, or an
//! instantly-ready mock in tests.
//!
//! ## Module Organization
//!
//! - [`sensor`] - PPG front end and blocking delays
//! - [`timer`] - periodic trigger for both execution contexts
//! - [`lock`] - try-once mutual exclusion for the shared slot
//! - [`report`] - sink for formatted report lines

pub mod lock;
pub mod report;
pub mod sensor;
pub mod timer;

pub use lock::TryLock;
pub use report::ReportSink;
pub use sensor::{DelayMs, NoDelay, PpgSensor};
pub use timer::PeriodicTimer;
