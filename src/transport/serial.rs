use core::fmt::Debug;

use embedded_hal::serial::{Read, Write};
use log::{debug, warn};

use super::{Clock, Transport, WRITE_TIMEOUT_MS};
use crate::config::Config;

/// Stale bytes dropped at most when the channel is claimed.
const RX_DRAIN_LIMIT: usize = 64;

#[derive(Debug)]
pub enum SerialError<TE, RE> {
    Write(TE),
    Read(RE),
    WriteTimeout,
}

/// Transport over an embedded-hal serial TX/RX pair.
///
/// The HAL applies baud rate and framing when it builds the peripheral, so make sure
/// it was set up for 19200 8-N-1 before handing it over.
#[derive(Debug)]
pub struct SerialTransport<TX, RX, C> {
    tx: TX,
    rx: RX,
    clock: C,
}

impl<TX, RX, C> SerialTransport<TX, RX, C>
where
    TX: Write<u8>,
    RX: Read<u8>,
    C: Clock,
{
    pub fn new(tx: TX, rx: RX, clock: C) -> Self {
        Self { tx, rx, clock }
    }

    /// Gives the peripherals back.
    pub fn release(self) -> (TX, RX, C) {
        (self.tx, self.rx, self.clock)
    }
}

// Retries a non-blocking operation until it completes, fails or `deadline` passes.
// `Ok(None)` means the deadline passed.
fn poll_until<C, T, E, F>(clock: &mut C, deadline: u64, mut op: F) -> Result<Option<T>, E>
where
    C: Clock,
    F: FnMut() -> nb::Result<T, E>,
{
    loop {
        match op() {
            Ok(value) => return Ok(Some(value)),
            Err(nb::Error::Other(e)) => return Err(e),
            Err(nb::Error::WouldBlock) => {
                if clock.millis() >= deadline {
                    return Ok(None);
                }
                clock.delay_ms(1);
            }
        }
    }
}

impl<TX, RX, C> Transport for SerialTransport<TX, RX, C>
where
    TX: Write<u8>,
    TX::Error: Debug,
    RX: Read<u8>,
    RX::Error: Debug,
    C: Clock,
{
    type Error = SerialError<TX::Error, RX::Error>;

    fn configure(&mut self, config: &Config) -> Result<(), Self::Error> {
        debug!(
            "serial link expected at {} baud, {} data bits, parity {:?}, {} stop bits",
            config.baud_rate, config.data_bits, config.parity, config.stop_bits
        );

        let deadline = self.clock.millis() + u64::from(WRITE_TIMEOUT_MS);
        let tx = &mut self.tx;
        match poll_until(&mut self.clock, deadline, || tx.flush()) {
            Ok(Some(())) => {}
            Ok(None) => return Err(SerialError::WriteTimeout),
            Err(e) => return Err(SerialError::Write(e)),
        }

        let mut drained = 0;
        while drained < RX_DRAIN_LIMIT {
            match self.rx.read() {
                Ok(_) => drained += 1,
                Err(nb::Error::WouldBlock) => break,
                Err(nb::Error::Other(e)) => {
                    // Overruns from before we owned the port are expected here.
                    warn!("discarding rx error while draining: {:?}", e);
                    break;
                }
            }
        }
        if drained > 0 {
            debug!("dropped {} stale rx bytes", drained);
        }
        Ok(())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let deadline = self.clock.millis() + u64::from(WRITE_TIMEOUT_MS);
        let tx = &mut self.tx;
        for byte in bytes {
            match poll_until(&mut self.clock, deadline, || tx.write(*byte)) {
                Ok(Some(())) => {}
                Ok(None) => return Err(SerialError::WriteTimeout),
                Err(e) => return Err(SerialError::Write(e)),
            }
        }
        match poll_until(&mut self.clock, deadline, || tx.flush()) {
            Ok(Some(())) => Ok(()),
            Ok(None) => Err(SerialError::WriteTimeout),
            Err(e) => Err(SerialError::Write(e)),
        }
    }

    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        let deadline = self.clock.millis() + u64::from(timeout_ms);
        let mut count = 0;
        while count < buf.len() {
            match self.rx.read() {
                Ok(word) => {
                    buf[count] = word;
                    count += 1;
                }
                Err(nb::Error::WouldBlock) => {
                    // Hand over whatever already arrived; the caller keeps its framing state.
                    if count > 0 || self.clock.millis() >= deadline {
                        break;
                    }
                    self.clock.delay_ms(1);
                }
                Err(nb::Error::Other(e)) => return Err(SerialError::Read(e)),
            }
        }
        Ok(count)
    }

    fn millis(&mut self) -> u64 {
        self.clock.millis()
    }
}
