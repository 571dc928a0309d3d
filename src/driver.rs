use core::cmp;

use byteorder::{BigEndian, ByteOrder};
use log::{debug, error, warn};

use crate::commands::Command;
use crate::config::Config;
use crate::frame::{Frame, FrameScanner, IDX_P1, IDX_P3};
use crate::responses::{Ack, AddMode, EnrollStage, Match, Permission};
use crate::transport::Transport;
use crate::utils::{Error, FromPayload};

/// What [`Fpc1020a::user_count_or_sentinel`] reports when the count could not be read.
pub const USER_COUNT_UNAVAILABLE: u8 = 0xFF;

const RX_CHUNK_LEN: usize = 16;

/// Represents an FPC1020A-class fingerprint module on a serial transport.
///
/// Holds exactly one command frame and one response frame. Every operation takes
/// `&mut self`, so commands are issued strictly one at a time.
#[derive(Debug)]
pub struct Fpc1020a<T> {
    transport: T,
    config: Config,
    command: Frame,
    response: Frame,
    scanner: FrameScanner,
}

impl<T> Fpc1020a<T>
where
    T: Transport,
{
    /// Claims and configures the transport.
    ///
    /// Returns [`Error::Setup`] if the channel cannot be brought up; no sensor operation
    /// is possible in that case.
    pub fn new(mut transport: T, config: Config) -> Result<Self, Error> {
        if let Err(e) = transport.configure(&config) {
            error!("could not claim serial channel: {:?}", e);
            return Err(Error::Setup);
        }
        return Ok(Self {
            transport,
            config,
            command: Frame::default(),
            response: Frame::default(),
            scanner: FrameScanner::new(),
        });
    }

    /// Tears the transport down and hands it back.
    pub fn release(mut self) -> T {
        if let Err(e) = self.transport.teardown() {
            warn!("transport teardown failed: {:?}", e);
        }
        self.transport
    }

    /// Sends a command and blocks until a valid response arrives or the command's
    /// timeout elapses. The timeout runs from before the frame is written, so time
    /// spent transmitting counts against it.
    ///
    /// Only framing is checked here; the ack byte is left to the caller. Every failure
    /// to get a well-formed answer is reported as [`Error::Failure`].
    pub fn send_command(&mut self, cmd: Command) -> Result<Frame, Error> {
        self.send_and_receive(cmd.to_frame(), cmd.timeout_ms())
    }

    fn send_and_receive(&mut self, command: Frame, timeout_ms: u32) -> Result<Frame, Error> {
        self.command = command;
        self.response = Frame::default();
        self.scanner.reset();

        let deadline = self.transport.millis() + u64::from(timeout_ms);
        debug!("tx {:02X?}", self.command.as_bytes());
        if let Err(e) = self.transport.write_frame(self.command.as_bytes()) {
            warn!("write of {:#04x} failed: {:?}", self.command.opcode(), e);
            return Err(Error::Failure);
        }

        match self.receive(deadline)? {
            Some(frame) => self.response = frame,
            None => {
                warn!(
                    "no response to {:#04x} within {} ms",
                    self.command.opcode(),
                    timeout_ms
                );
                return Err(Error::Failure);
            }
        }
        debug!("rx {:02X?}", self.response.as_bytes());

        if let Err(e) = self.response.validate_response(self.command.opcode()) {
            warn!("rejected response {:02X?}: {:?}", self.response.as_bytes(), e);
            return Err(Error::Failure);
        }
        Ok(self.response)
    }

    // Polls the transport in slices of at most `poll_interval_ms` until the scanner
    // produces a frame or `deadline` passes.
    fn receive(&mut self, deadline: u64) -> Result<Option<Frame>, Error> {
        // A zero interval would never let a wait-driven clock advance.
        let poll_interval = u64::from(self.config.poll_interval_ms.max(1));
        let mut chunk = [0u8; RX_CHUNK_LEN];
        loop {
            let now = self.transport.millis();
            if now >= deadline {
                return Ok(None);
            }
            let wait = cmp::min(deadline - now, poll_interval) as u32;
            let count = match self.transport.read_available(&mut chunk, wait) {
                Ok(count) => cmp::min(count, chunk.len()),
                Err(e) => {
                    warn!("read failed: {:?}", e);
                    return Err(Error::Failure);
                }
            };
            for byte in &chunk[..count] {
                if let Some(frame) = self.scanner.push(*byte) {
                    return Ok(Some(frame));
                }
            }
        }
    }

    // Runs a command whose response carries an ack in q3.
    fn send_acked(&mut self, cmd: Command) -> Result<Frame, Error> {
        let response = self.send_command(cmd)?;
        let ack = Ack::from(response.q3());
        if !ack.is_success() {
            debug!("{:?} not acknowledged: {:?}", cmd, ack);
            return Err(Error::from_ack(ack));
        }
        Ok(response)
    }

    /// Puts the module to sleep. Only a power cycle wakes it again.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.send_command(Command::Sleep).map(|_| ())
    }

    pub fn set_add_mode(&mut self, mode: AddMode) -> Result<(), Error> {
        self.send_acked(Command::SetAddMode { mode }).map(|_| ())
    }

    pub fn read_add_mode(&mut self) -> Result<AddMode, Error> {
        let response = self.send_command(Command::ReadAddMode)?;
        AddMode::from_payload(&response.payload()).ok_or(Error::Failure)
    }

    /// Number of enrolled templates.
    pub fn user_count(&mut self) -> Result<u8, Error> {
        let response = self.send_acked(Command::UserCount)?;
        Ok(response.q2())
    }

    /// Like [`user_count`](Self::user_count), but folds every error into
    /// [`USER_COUNT_UNAVAILABLE`]. A module never stores 255 templates, so the value
    /// cannot be mistaken for a real count.
    pub fn user_count_or_sentinel(&mut self) -> u8 {
        self.user_count().unwrap_or(USER_COUNT_UNAVAILABLE)
    }

    pub fn delete_all_users(&mut self) -> Result<(), Error> {
        self.send_acked(Command::DeleteAll).map(|_| ())
    }

    pub fn delete_user(&mut self, id: u8) -> Result<(), Error> {
        self.send_acked(Command::DeleteUser { id }).map(|_| ())
    }

    /// Enrolls a finger under `id`. The user has to place the same finger three times;
    /// each capture waits up to five seconds.
    ///
    /// Stops at the first stage that does not come back with a success ack and reports
    /// that stage together with the ack it got.
    pub fn add_user(&mut self, id: u8, permission: Permission) -> Result<(), Error> {
        for stage in EnrollStage::ALL.iter() {
            let cmd = Command::AddUser {
                stage: *stage,
                id,
                permission,
            };
            let ack = match self.send_command(cmd) {
                Ok(response) => Ack::from(response.q3()),
                Err(_) => Ack::Fail,
            };
            if !ack.is_success() {
                warn!("enrollment of user {} stopped at {:?}: {:?}", id, stage, ack);
                return Err(Error::Enroll { stage: *stage, ack });
            }
            debug!("enrollment of user {}: {:?} captured", id, stage);
        }
        Ok(())
    }

    /// Captures a finger and searches all enrolled templates for it.
    pub fn compare_finger(&mut self) -> Result<Match, Error> {
        let response = self.send_command(Command::Match)?;
        let ack = Ack::from(response.q3());
        match ack {
            Ack::NoUser => return Err(Error::NoUser),
            Ack::Timeout => return Err(Error::Timeout),
            _ => {}
        }
        match Match::from_payload(&response.payload()) {
            Some(found) => {
                debug!("matched user {} ({:?})", found.user_id, found.permission);
                Ok(found)
            }
            None => Err(Error::from_ack(ack)),
        }
    }

    /// User id carried by the last response, `(q1 << 8) | q2`. Meaningful after a
    /// successful [`compare_finger`](Self::compare_finger).
    pub fn last_user_id(&self) -> u16 {
        BigEndian::read_u16(&self.response.as_bytes()[IDX_P1..IDX_P3])
    }

    /// The last response frame. All zeroes if the last command got no answer.
    pub fn last_response(&self) -> Frame {
        self.response
    }
}
