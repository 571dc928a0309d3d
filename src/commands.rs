use arrayvec::ArrayVec;

use crate::frame::Frame;
use crate::responses::{AddMode, EnrollStage, Permission};
use crate::utils::{CommandWriter, ToPayload};

pub const CMD_ADD_1: u8 = 0x01;
pub const CMD_ADD_2: u8 = 0x02;
pub const CMD_ADD_3: u8 = 0x03;
pub const CMD_DEL: u8 = 0x04;
pub const CMD_DEL_ALL: u8 = 0x05;
pub const CMD_USER_CNT: u8 = 0x09;
pub const CMD_MATCH: u8 = 0x0C;
pub const CMD_SLEEP_MODE: u8 = 0x2C;
pub const CMD_ADD_MODE: u8 = 0x2D;

/// Commands understood by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Puts the module into low-power sleep. It only wakes on a power cycle.
    Sleep,

    /// Chooses whether an already enrolled finger may be enrolled again.
    SetAddMode { mode: AddMode },

    /// Queries the current add mode.
    ReadAddMode,

    /// Number of enrolled templates.
    UserCount,

    /// Erases every template.
    DeleteAll,

    /// Erases the template stored under `id`.
    DeleteUser { id: u8 },

    /// One capture of an enrollment. All three stages carry the same id and permission.
    AddUser {
        stage: EnrollStage,
        id: u8,
        permission: Permission,
    },

    /// Captures a finger and searches it against all enrolled templates.
    Match,
}

impl Command {
    pub fn opcode(&self) -> u8 {
        return match self {
            Self::Sleep => CMD_SLEEP_MODE,
            Self::SetAddMode { .. } | Self::ReadAddMode => CMD_ADD_MODE,
            Self::UserCount => CMD_USER_CNT,
            Self::DeleteAll => CMD_DEL_ALL,
            Self::DeleteUser { .. } => CMD_DEL,
            Self::AddUser { stage: EnrollStage::First, .. } => CMD_ADD_1,
            Self::AddUser { stage: EnrollStage::Second, .. } => CMD_ADD_2,
            Self::AddUser { stage: EnrollStage::Third, .. } => CMD_ADD_3,
            Self::Match => CMD_MATCH,
        };
    }

    /// How long to wait for the response. Commands that need a finger on the
    /// sensor get much longer.
    pub fn timeout_ms(&self) -> u32 {
        return match self {
            Self::Sleep => 1500,
            Self::SetAddMode { .. }
            | Self::ReadAddMode
            | Self::UserCount
            | Self::DeleteAll
            | Self::DeleteUser { .. } => 1200,
            Self::AddUser { .. } => 5000,
            Self::Match => 8000,
        };
    }

    pub fn to_frame(&self) -> Frame {
        let mut buf = ArrayVec::<[u8; 4]>::new();
        self.to_payload(&mut buf);
        return Frame::command(buf[0], buf[1], buf[2], buf[3]);
    }
}

impl CommandWriter for ArrayVec<[u8; 4]> {
    fn write_cmd_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            // Four bytes is the whole command body; anything past that has nowhere to go.
            if self.try_push(*byte).is_err() {
                break;
            }
        }
    }
}

impl ToPayload for Command {
    fn to_payload(&self, writer: &mut dyn CommandWriter) {
        writer.write_cmd_bytes(&[self.opcode()]);
        match self {
            // cmd | 0x2D
            // p1  | 0x00
            // p2  | mode
            // p3  | 0x00 (set)
            Self::SetAddMode { mode } => {
                writer.write_cmd_bytes(&[0x00, mode.to_byte(), 0x00]);
            }

            // cmd | 0x2D
            // p1  | 0x00
            // p2  | 0x00
            // p3  | 0x01 (read)
            Self::ReadAddMode => {
                writer.write_cmd_bytes(&[0x00, 0x00, 0x01]);
            }

            // cmd | 0x04
            // p1  | 0x00
            // p2  | id
            // p3  | 0x00
            Self::DeleteUser { id } => {
                writer.write_cmd_bytes(&[0x00, *id, 0x00]);
            }

            // cmd | 0x01 / 0x02 / 0x03
            // p1  | 0x00
            // p2  | id
            // p3  | permission
            Self::AddUser { id, permission, .. } => {
                writer.write_cmd_bytes(&[0x00, *id, permission.to_byte()]);
            }

            Self::Sleep | Self::UserCount | Self::DeleteAll | Self::Match => {
                writer.write_cmd_bytes(&[0x00, 0x00, 0x00]);
            }
        }
    }
}
