use core::fmt;

use crate::responses::{Ack, EnrollStage};

/// Decodes a typed value out of the payload bytes of a response frame.
pub trait FromPayload: Sized {
    fn from_payload(payload: &[u8]) -> Option<Self>;
}

/// Sink for the opcode and parameter bytes of a command.
pub trait CommandWriter {
    fn write_cmd_bytes(&mut self, bytes: &[u8]);
}

pub trait ToPayload {
    fn to_payload(&self, writer: &mut dyn CommandWriter);
}

/// Outcome of a failed sensor operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No usable response: nothing arrived before the timeout, the frame was malformed,
    /// answered a different opcode, failed its checksum, or the transport itself errored.
    /// Also used when the sensor acks with a plain `Fail`.
    Failure,

    /// The sensor answered, but no enrolled template matched.
    NoUser,

    /// The sensor answered with its own timeout code (no finger presented in time).
    Timeout,

    /// The sensor answered with a non-success ack that has no dedicated variant.
    Rejected(Ack),

    /// Enrollment stopped at `stage`. `ack` is the last code observed there, or
    /// [`Ack::Fail`] if that stage never produced a valid response.
    Enroll { stage: EnrollStage, ack: Ack },

    /// The serial channel could not be claimed or configured.
    Setup,
}

impl Error {
    /// Maps a non-success ack byte onto the error taxonomy.
    pub fn from_ack(ack: Ack) -> Self {
        return match ack {
            Ack::NoUser => Self::NoUser,
            Ack::Timeout => Self::Timeout,
            Ack::Fail | Ack::Success => Self::Failure,
            other => Self::Rejected(other),
        };
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failure => f.write_str("no valid response from sensor"),
            Self::NoUser => f.write_str("no matching user"),
            Self::Timeout => f.write_str("sensor timed out waiting for a finger"),
            Self::Rejected(ack) => write!(f, "sensor rejected command: {:?}", ack),
            Self::Enroll { stage, ack } => {
                write!(f, "enrollment failed at {:?}: {:?}", stage, ack)
            }
            Self::Setup => f.write_str("serial channel could not be claimed"),
        }
    }
}
