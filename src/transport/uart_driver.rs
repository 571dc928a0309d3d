use core::cmp;
use core::fmt::Debug;

use log::{debug, warn};

use super::{Clock, Transport, WRITE_TIMEOUT_MS};
use crate::config::{Config, Pins};

// Sleep between checks of an empty RX ring.
const IDLE_POLL_MS: u32 = 10;
// Longest wait handed to a single `read_bytes` call.
const READ_CHUNK_WAIT_MS: u64 = 20;
// Longest wait handed to a single `wait_tx_done` call.
const TX_DONE_WAIT_MS: u32 = 20;

/// Buffered UART peripheral driver as found in RTOS SDKs.
///
/// The driver owns an interrupt-fed RX ring buffer that is allocated on `install`
/// and freed on `delete`.
pub trait UartDriver {
    type Error: Debug;

    fn install(&mut self, rx_buffer_len: usize) -> Result<(), Self::Error>;

    /// Applies baud rate, framing and flow control.
    fn param_config(&mut self, config: &Config) -> Result<(), Self::Error>;

    fn set_pins(&mut self, pins: &Pins) -> Result<(), Self::Error>;

    /// Queues `bytes` for transmission and returns how many were accepted.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize, Self::Error>;

    /// Waits up to `timeout_ms` for the TX FIFO to drain. `Ok(false)` if it did not.
    fn wait_tx_done(&mut self, timeout_ms: u32) -> Result<bool, Self::Error>;

    /// Bytes currently waiting in the RX ring.
    fn buffered_len(&mut self) -> Result<usize, Self::Error>;

    /// Reads up to `buf.len()` bytes, waiting at most `timeout_ms` for them.
    fn read_bytes(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    fn delete(&mut self) -> Result<(), Self::Error>;
}

#[derive(Debug)]
pub enum UartError<E> {
    Driver(E),
    ShortWrite { written: usize, expected: usize },
    WriteTimeout,
    /// The transport's parts were already handed back by `release`.
    Released,
}

impl<E> From<E> for UartError<E> {
    fn from(e: E) -> Self {
        UartError::Driver(e)
    }
}

/// Transport over a [`UartDriver`].
///
/// The driver stays installed until [`Transport::teardown`] or [`release`](Self::release)
/// is called, or the transport is dropped.
#[derive(Debug)]
pub struct UartDriverTransport<U: UartDriver, C> {
    // Only `None` once `release` has taken the parts back.
    parts: Option<Parts<U, C>>,
}

#[derive(Debug)]
struct Parts<U, C> {
    uart: U,
    clock: C,
    installed: bool,
}

impl<U, C> UartDriverTransport<U, C>
where
    U: UartDriver,
    C: Clock,
{
    pub fn new(uart: U, clock: C) -> Self {
        Self {
            parts: Some(Parts {
                uart,
                clock,
                installed: false,
            }),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.parts.as_ref().map_or(false, |parts| parts.installed)
    }

    /// Deletes the driver if it is installed and gives the parts back.
    pub fn release(mut self) -> Result<(U, C), UartError<U::Error>> {
        let mut parts = self.parts.take().ok_or(UartError::Released)?;
        parts.teardown()?;
        Ok((parts.uart, parts.clock))
    }

    fn parts_mut(&mut self) -> Result<&mut Parts<U, C>, UartError<U::Error>> {
        self.parts.as_mut().ok_or(UartError::Released)
    }
}

impl<U: UartDriver, C> Parts<U, C> {
    fn teardown(&mut self) -> Result<(), UartError<U::Error>> {
        if self.installed {
            self.uart.delete()?;
            self.installed = false;
            debug!("uart driver deleted");
        }
        Ok(())
    }
}

impl<U, C> Parts<U, C>
where
    U: UartDriver,
    C: Clock,
{
    fn bring_up(&mut self, config: &Config) -> Result<(), UartError<U::Error>> {
        self.uart.install(config.rx_buffer_len)?;
        self.installed = true;
        self.uart.param_config(config)?;
        self.uart.set_pins(&config.pins)?;
        Ok(())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), UartError<U::Error>> {
        let written = self.uart.write_bytes(bytes)?;
        if written != bytes.len() {
            return Err(UartError::ShortWrite {
                written,
                expected: bytes.len(),
            });
        }

        let deadline = self.clock.millis() + u64::from(WRITE_TIMEOUT_MS);
        while !self.uart.wait_tx_done(TX_DONE_WAIT_MS)? {
            if self.clock.millis() >= deadline {
                return Err(UartError::WriteTimeout);
            }
            self.clock.delay_ms(IDLE_POLL_MS);
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, UartError<U::Error>> {
        let deadline = self.clock.millis() + u64::from(timeout_ms);
        loop {
            let buffered = self.uart.buffered_len()?;
            let now = self.clock.millis();
            if buffered > 0 {
                let want = cmp::min(buffered, buf.len());
                let wait = cmp::min(deadline.saturating_sub(now), READ_CHUNK_WAIT_MS) as u32;
                let count = self.uart.read_bytes(&mut buf[..want], wait)?;
                return Ok(count);
            }
            if now >= deadline {
                return Ok(0);
            }
            let idle = cmp::min(deadline - now, u64::from(IDLE_POLL_MS)) as u32;
            self.clock.delay_ms(idle);
        }
    }
}

impl<U, C> Transport for UartDriverTransport<U, C>
where
    U: UartDriver,
    C: Clock,
{
    type Error = UartError<U::Error>;

    fn configure(&mut self, config: &Config) -> Result<(), Self::Error> {
        debug!(
            "installing uart driver: {} baud, flow control {:?}, pins {:?}",
            config.baud_rate, config.flow_control, config.pins
        );
        let parts = self.parts_mut()?;
        let result = parts.bring_up(config);
        if result.is_err() && parts.installed {
            if let Err(e) = parts.teardown() {
                warn!("uart driver delete after failed setup: {:?}", e);
            }
        }
        result
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.parts_mut()?.write_frame(bytes)
    }

    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.parts_mut()?.read_available(buf, timeout_ms)
    }

    fn millis(&mut self) -> u64 {
        self.parts.as_mut().map_or(0, |parts| parts.clock.millis())
    }

    fn teardown(&mut self) -> Result<(), Self::Error> {
        match self.parts.as_mut() {
            Some(parts) => parts.teardown(),
            None => Ok(()),
        }
    }
}

impl<U: UartDriver, C> Drop for UartDriverTransport<U, C> {
    fn drop(&mut self) {
        if let Some(parts) = self.parts.as_mut() {
            if let Err(e) = parts.teardown() {
                warn!("uart driver delete on drop failed: {:?}", e);
            }
        }
    }
}
