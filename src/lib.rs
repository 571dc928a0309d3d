//! **fpc1020a** is a driver for FPC1020A-class UART fingerprint modules: the capacitive
//! sensors that speak a fixed 8-byte frame protocol bracketed by `0xF5` bytes.
//!
//! It covers what such a module is normally used for: enrolling a finger, deleting one or
//! all templates, counting enrolled users, matching a finger against the library, and
//! putting the module to sleep. Templates live on the module; the driver stores nothing.
//!
//! The engine, [`Fpc1020a`], runs on anything implementing [`Transport`]. Two
//! implementations are included, one over embedded-hal serial halves
//! ([`SerialTransport`]) and one over a buffered RTOS UART driver
//! ([`UartDriverTransport`]).
//!
//! ## Example
//!
//! To match a finger:
//! ```
//! # use fpc1020a::{Config, Transport};
//! # struct Loopback { now: u64, pending: Vec<u8> }
//! # impl Transport for Loopback {
//! #     type Error = ();
//! #     fn configure(&mut self, _config: &Config) -> Result<(), ()> { Ok(()) }
//! #     fn write_frame(&mut self, _bytes: &[u8]) -> Result<(), ()> {
//! #         // Module answers: user 0x0003 matched, permission 1.
//! #         self.pending = vec![0xF5, 0x0C, 0x00, 0x03, 0x01, 0x00, 0x0E, 0xF5];
//! #         Ok(())
//! #     }
//! #     fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ()> {
//! #         let n = self.pending.len().min(buf.len());
//! #         buf[..n].copy_from_slice(&self.pending[..n]);
//! #         self.pending.drain(..n);
//! #         if n == 0 { self.now += u64::from(timeout_ms); }
//! #         Ok(n)
//! #     }
//! #     fn millis(&mut self) -> u64 { self.now }
//! # }
//! # let transport = Loopback { now: 0, pending: Vec::new() };
//! use fpc1020a::{Error, Fpc1020a};
//!
//! // Obtain a transport from some serial port implementation
//! let mut sensor = Fpc1020a::new(transport, Config::default()).unwrap();
//! match sensor.compare_finger() {
//!     Ok(found) => println!("Found user {} ({:?})", found.user_id, found.permission),
//!     Err(Error::NoUser) => println!("Unknown finger"),
//!     Err(error) => println!("Error: {}", error),
//! }
//! assert_eq!(sensor.last_user_id(), 3);
//! ```
//!
//! For a host-side walkthrough, see `demos/pc_fingerprint.rs`.
#![warn(missing_debug_implementations, rust_2018_idioms)]
#![cfg_attr(not(test), no_std)]

mod commands;
mod config;
mod driver;
pub mod frame;
mod responses;
pub mod transport;
mod utils;

pub use crate::commands::Command;
pub use crate::config::{Config, FlowControl, Parity, Pins};
pub use crate::driver::{Fpc1020a, USER_COUNT_UNAVAILABLE};
pub use crate::frame::Frame;
pub use crate::responses::{Ack, AddMode, EnrollStage, Match, Permission};
pub use crate::transport::{
    Clock, SerialError, SerialTransport, Transport, UartDriver, UartDriverTransport, UartError,
};
pub use crate::utils::Error;
