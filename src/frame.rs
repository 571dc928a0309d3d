//! The fixed 8-byte frame shared by commands and responses.
//!
//! ```text
//! byte 0 | head 0xF5
//! byte 1 | opcode
//! byte 2 | p1 / q1
//! byte 3 | p2 / q2
//! byte 4 | p3 / q3
//! byte 5 | reserved, 0
//! byte 6 | checksum, XOR of bytes 1..=5
//! byte 7 | tail 0xF5
//! ```
use arrayvec::ArrayVec;

pub const FRAME_LEN: usize = 8;

pub const HEAD: u8 = 0xF5;
pub const TAIL: u8 = 0xF5;

pub const IDX_HEAD: usize = 0;
pub const IDX_CMD: usize = 1;
pub const IDX_P1: usize = 2;
pub const IDX_P2: usize = 3;
pub const IDX_P3: usize = 4;
pub const IDX_CHK: usize = 6;
pub const IDX_TAIL: usize = 7;

/// Why a received frame was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    BadHead(u8),
    BadTail(u8),
    OpcodeMismatch { expected: u8, actual: u8 },
    BadChecksum { expected: u8, actual: u8 },
}

/// XOR over every byte in `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |chk, byte| chk ^ *byte)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    bytes: [u8; FRAME_LEN],
}

impl Frame {
    /// Builds a command frame, filling in sentinels and checksum.
    pub fn command(opcode: u8, p1: u8, p2: u8, p3: u8) -> Self {
        let chk = checksum(&[opcode, p1, p2, p3]);
        Frame {
            bytes: [HEAD, opcode, p1, p2, p3, 0, chk, TAIL],
        }
    }

    pub fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Frame { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    pub fn opcode(&self) -> u8 {
        self.bytes[IDX_CMD]
    }

    /// The three parameter (command) or payload (response) bytes.
    pub fn payload(&self) -> [u8; 3] {
        [self.bytes[IDX_P1], self.bytes[IDX_P2], self.bytes[IDX_P3]]
    }

    pub fn q1(&self) -> u8 {
        self.bytes[IDX_P1]
    }

    pub fn q2(&self) -> u8 {
        self.bytes[IDX_P2]
    }

    pub fn q3(&self) -> u8 {
        self.bytes[IDX_P3]
    }

    /// Checks a response against the command that prompted it.
    pub fn validate_response(&self, sent_opcode: u8) -> Result<(), FrameError> {
        if self.bytes[IDX_HEAD] != HEAD {
            return Err(FrameError::BadHead(self.bytes[IDX_HEAD]));
        }
        if self.bytes[IDX_TAIL] != TAIL {
            return Err(FrameError::BadTail(self.bytes[IDX_TAIL]));
        }
        if self.bytes[IDX_CMD] != sent_opcode {
            return Err(FrameError::OpcodeMismatch {
                expected: sent_opcode,
                actual: self.bytes[IDX_CMD],
            });
        }
        let expected = checksum(&self.bytes[IDX_CMD..IDX_CHK]);
        if expected != self.bytes[IDX_CHK] {
            return Err(FrameError::BadChecksum {
                expected,
                actual: self.bytes[IDX_CHK],
            });
        }
        Ok(())
    }
}

/// Byte-stream synchroniser: drops noise until a head byte, then yields the first
/// 8-byte window that also ends in the tail sentinel.
///
/// Head and tail share a value, so a window ending in something else is not thrown
/// away wholesale; the scanner slides to the next head byte inside it and keeps going.
#[derive(Debug, Default)]
pub struct FrameScanner {
    window: ArrayVec<[u8; FRAME_LEN]>,
}

impl FrameScanner {
    pub fn new() -> Self {
        FrameScanner {
            window: ArrayVec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
    }

    pub fn push(&mut self, byte: u8) -> Option<Frame> {
        if self.window.is_empty() && byte != HEAD {
            return None;
        }
        self.window.push(byte);
        if !self.window.is_full() {
            return None;
        }

        if self.window[IDX_TAIL] == TAIL {
            let mut bytes = [0u8; FRAME_LEN];
            bytes.copy_from_slice(&self.window);
            self.window.clear();
            return Some(Frame::from_bytes(bytes));
        }

        self.resync();
        None
    }

    fn resync(&mut self) {
        let next_head = self.window[1..].iter().position(|b| *b == HEAD);
        match next_head {
            Some(offset) => {
                self.window.drain(..offset + 1);
            }
            None => self.window.clear(),
        }
    }
}
