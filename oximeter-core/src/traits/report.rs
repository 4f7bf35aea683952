//! Report Sink Abstraction
//!
//! Destination for the formatted report lines produced on the consumer
//! context, typically a UART.

use core::fmt::Debug;

/// Output channel for report lines
pub trait ReportSink {
    /// Transport-specific error
    type Error: Debug;

    /// Transmit one complete line (including its trailing newline)
    fn send(&mut self, line: &str) -> Result<(), Self::Error>;
}
