use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::serial::{Read, Write};
use fpc1020a::Clock;
use serialport::SerialPort;
use std::io::{Read as _, Write as _};
use std::{cell::RefCell, io, thread, time::{Duration, Instant}};

// We're cheating here and will use the host OS's serial port
// as our UART, and for that we have to implement the read/write
// interfaces from embedded-hal.

pub struct SerialReader<'a>(pub &'a RefCell<Box<dyn SerialPort>>);
pub struct SerialWriter<'a>(pub &'a RefCell<Box<dyn SerialPort>>);

impl Read<u8> for SerialReader<'_> {
    type Error = io::Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let mut buf: [u8; 1] = [0u8];
        return match self.0.borrow_mut().read(&mut buf) {
            Ok(1) => Ok(buf[0]),
            Ok(_) => Err(nb::Error::WouldBlock),
            // The port is opened with a short timeout, so this just means "nothing yet".
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        };
    }
}

impl Write<u8> for SerialWriter<'_> {
    type Error = io::Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        let buf: [u8; 1] = [word];
        return match self.0.borrow_mut().write(&buf) {
            Ok(1) => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => Err(nb::Error::Other(e)),
        };
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        return match self.0.borrow_mut().flush() {
            Ok(_) => Ok(()),
            Err(e) => Err(nb::Error::Other(e)),
        };
    }
}

/// Wall clock for the host.
pub struct StdClock(Instant);

impl StdClock {
    pub fn new() -> Self {
        StdClock(Instant::now())
    }
}

impl DelayMs<u32> for StdClock {
    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl Clock for StdClock {
    fn millis(&mut self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}
