//! Serial channel abstraction the protocol engine runs on.
//!
//! Two implementations ship with the crate:
//!
//! * [`SerialTransport`] drives an embedded-hal `serial::Read`/`serial::Write` pair, one
//!   word at a time. This is what a board-support runtime usually hands out.
//! * [`UartDriverTransport`] drives a buffered RTOS UART driver through [`UartDriver`],
//!   which installs a ring buffer and reads chunks with a timeout.
//!
//! Pick one by constructing it and passing it to [`Fpc1020a::new`](crate::Fpc1020a::new).
use core::fmt::Debug;

use embedded_hal::blocking::delay::DelayMs;

use crate::config::Config;

mod serial;
mod uart_driver;

pub use self::serial::{SerialError, SerialTransport};
pub use self::uart_driver::{UartDriver, UartDriverTransport, UartError};

/// Upper bound on how long a frame write may take before it is reported as failed.
pub const WRITE_TIMEOUT_MS: u32 = 20;

/// Millisecond time source with a blocking delay.
pub trait Clock: DelayMs<u32> {
    /// Milliseconds since an arbitrary, fixed origin. Must not go backwards.
    fn millis(&mut self) -> u64;
}

/// A byte channel to the sensor.
pub trait Transport {
    type Error: Debug;

    /// Claims the channel and applies `config`. The engine refuses to start if this fails.
    fn configure(&mut self, config: &Config) -> Result<(), Self::Error>;

    /// Transmits `bytes` in full, waiting at most [`WRITE_TIMEOUT_MS`] or so.
    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Waits up to `timeout_ms` for input and copies what arrived into `buf`.
    ///
    /// Returns the number of bytes copied, which may be zero. Never waits longer than
    /// `timeout_ms` plus the implementation's own polling granularity.
    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    fn millis(&mut self) -> u64;

    /// Releases the channel. Safe to call more than once.
    fn teardown(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
