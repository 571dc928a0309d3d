use byteorder::{BigEndian, ByteOrder};

use crate::utils::FromPayload;

/// Acknowledgement code carried in the third payload byte of most responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Success,
    Fail,
    /// The template library is full.
    Full,
    /// No enrolled user matched, or the addressed user does not exist.
    NoUser,
    /// The requested user id is already taken.
    UserOccupied,
    /// The finger is already enrolled (only reported while repeats are rejected).
    UserExists,
    /// No finger was presented before the sensor gave up.
    Timeout,
    GoOut,
    Unknown(u8),
}

impl Ack {
    pub fn from(byte: u8) -> Self {
        return match byte {
            0x00 => Self::Success,
            0x01 => Self::Fail,
            0x04 => Self::Full,
            0x05 => Self::NoUser,
            0x06 => Self::UserOccupied,
            0x07 => Self::UserExists,
            0x08 => Self::Timeout,
            0x0F => Self::GoOut,
            other => Self::Unknown(other),
        };
    }

    pub fn to_byte(self) -> u8 {
        return match self {
            Self::Success => 0x00,
            Self::Fail => 0x01,
            Self::Full => 0x04,
            Self::NoUser => 0x05,
            Self::UserOccupied => 0x06,
            Self::UserExists => 0x07,
            Self::Timeout => 0x08,
            Self::GoOut => 0x0F,
            Self::Unknown(byte) => byte,
        };
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

/// User privilege level. Stored with each template at enrollment and echoed back on a
/// successful match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Guest,
    Normal,
    Master,
}

impl Permission {
    pub fn from(byte: u8) -> Option<Self> {
        return match byte {
            0x01 => Some(Self::Guest),
            0x02 => Some(Self::Normal),
            0x03 => Some(Self::Master),
            _ => None,
        };
    }

    pub fn to_byte(self) -> u8 {
        return match self {
            Self::Guest => 0x01,
            Self::Normal => 0x02,
            Self::Master => 0x03,
        };
    }
}

/// Whether the sensor accepts enrolling a finger that already matches a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMode {
    AllowRepeat,
    RejectRepeat,
}

impl AddMode {
    pub fn from(byte: u8) -> Option<Self> {
        return match byte {
            0x00 => Some(Self::AllowRepeat),
            0x01 => Some(Self::RejectRepeat),
            _ => None,
        };
    }

    pub fn to_byte(self) -> u8 {
        return match self {
            Self::AllowRepeat => 0x00,
            Self::RejectRepeat => 0x01,
        };
    }
}

/// The three captures of the same finger that make up one enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollStage {
    First,
    Second,
    Third,
}

impl EnrollStage {
    pub const ALL: [EnrollStage; 3] = [Self::First, Self::Second, Self::Third];
}

/// A successful 1:N match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Id of the matched template, `(q1 << 8) | q2`.
    pub user_id: u16,
    /// Permission stored with the matched template.
    pub permission: Permission,
}

impl FromPayload for Match {
    // Expected payload:
    // q1     | user id high [1]
    // q2     | user id low [1]
    // q3     | permission 1-3 [1]
    fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() < 3 {
            return None;
        }
        let user_id = BigEndian::read_u16(&payload[0..2]);
        // A zero low byte never identifies a real match.
        if payload[1] == 0 {
            return None;
        }
        let permission = Permission::from(payload[2])?;
        return Some(Match { user_id, permission });
    }
}

impl FromPayload for AddMode {
    fn from_payload(payload: &[u8]) -> Option<Self> {
        return payload.get(1).and_then(|byte| AddMode::from(*byte));
    }
}
