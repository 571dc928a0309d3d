use std::collections::VecDeque;

use fpc1020a::{
    Ack, AddMode, Config, EnrollStage, Error, Fpc1020a, Frame, Permission, Transport,
    USER_COUNT_UNAVAILABLE,
};

const POLL_MS: u64 = 10;

type Responder = Box<dyn FnMut(&Frame) -> Vec<u8>>;

/// Fake module behind a virtual clock. Time only moves while a read waits on an
/// empty line.
struct MockSensor {
    now: u64,
    sent: Vec<Frame>,
    pending: VecDeque<u8>,
    respond: Responder,
    longest_wait: u32,
    fail_configure: bool,
    // Opcode whose write is recorded and then reported as failed.
    fail_write_on: Option<u8>,
    fail_read: bool,
    // Virtual time a frame takes to go out.
    write_cost_ms: u64,
    torn_down: bool,
}

impl MockSensor {
    fn new(respond: impl FnMut(&Frame) -> Vec<u8> + 'static) -> Self {
        MockSensor {
            now: 0,
            sent: Vec::new(),
            pending: VecDeque::new(),
            respond: Box::new(respond),
            longest_wait: 0,
            fail_configure: false,
            fail_write_on: None,
            fail_read: false,
            write_cost_ms: 0,
            torn_down: false,
        }
    }

    fn silent() -> Self {
        Self::new(|_| Vec::new())
    }
}

impl Transport for MockSensor {
    type Error = &'static str;

    fn configure(&mut self, _config: &Config) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err("port busy");
        }
        Ok(())
    }

    fn write_frame(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        let frame = Frame::from_bytes(raw);
        self.sent.push(frame);
        self.now += self.write_cost_ms;
        if self.fail_write_on == Some(frame.opcode()) {
            return Err("tx fifo stuck");
        }
        let reply = (self.respond)(&frame);
        self.pending.extend(reply);
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.longest_wait = self.longest_wait.max(timeout_ms);
        if self.fail_read {
            return Err("rx overrun");
        }
        if self.pending.is_empty() {
            self.now += u64::from(timeout_ms);
            return Ok(0);
        }
        // Dribble out a few bytes at a time, like a real UART would.
        let count = buf.len().min(3).min(self.pending.len());
        for slot in buf.iter_mut().take(count) {
            *slot = self.pending.pop_front().unwrap();
        }
        self.now += 1;
        Ok(count)
    }

    fn millis(&mut self) -> u64 {
        self.now
    }

    fn teardown(&mut self) -> Result<(), Self::Error> {
        self.torn_down = true;
        Ok(())
    }
}

fn reply(opcode: u8, q1: u8, q2: u8, q3: u8) -> Vec<u8> {
    Frame::command(opcode, q1, q2, q3).as_bytes().to_vec()
}

fn ack_all(q3: u8) -> impl FnMut(&Frame) -> Vec<u8> {
    move |cmd| reply(cmd.opcode(), 0, 0, q3)
}

fn sensor(mock: MockSensor) -> Fpc1020a<MockSensor> {
    Fpc1020a::new(mock, Config::default()).unwrap()
}

#[test]
fn echoed_success_ack_is_success() {
    let mut fp = sensor(MockSensor::new(ack_all(0x00)));
    assert_eq!(fp.delete_all_users(), Ok(()));
    assert_eq!(fp.delete_user(4), Ok(()));
    assert_eq!(fp.set_add_mode(AddMode::RejectRepeat), Ok(()));
    assert_eq!(fp.sleep(), Ok(()));
}

#[test]
fn sleep_ignores_ack_byte() {
    let mut fp = sensor(MockSensor::new(ack_all(0x01)));
    assert_eq!(fp.sleep(), Ok(()));
}

#[test]
fn non_success_ack_maps_to_error() {
    let mut fp = sensor(MockSensor::new(ack_all(0x05)));
    assert_eq!(fp.delete_user(9), Err(Error::NoUser));

    let mut fp = sensor(MockSensor::new(ack_all(0x01)));
    assert_eq!(fp.delete_all_users(), Err(Error::Failure));

    let mut fp = sensor(MockSensor::new(ack_all(0x04)));
    assert_eq!(fp.set_add_mode(AddMode::AllowRepeat), Err(Error::Rejected(Ack::Full)));
}

#[test]
fn silence_is_failure_within_timeout_plus_one_poll() {
    let mut fp = sensor(MockSensor::silent());
    assert_eq!(fp.delete_all_users(), Err(Error::Failure));

    let mock = fp.release();
    assert!(mock.now >= 1200, "returned early at {} ms", mock.now);
    assert!(mock.now <= 1200 + POLL_MS, "overshot to {} ms", mock.now);
    assert!(u64::from(mock.longest_wait) <= POLL_MS);
    assert!(mock.torn_down);
}

#[test]
fn match_timeout_is_bounded_too() {
    let mut fp = sensor(MockSensor::silent());
    assert_eq!(fp.compare_finger(), Err(Error::Failure));
    let mock = fp.release();
    assert!(mock.now >= 8000 && mock.now <= 8000 + POLL_MS);
}

#[test]
fn bad_tail_is_failure() {
    let mut fp = sensor(MockSensor::new(|cmd| {
        let mut bytes = reply(cmd.opcode(), 0, 0, 0);
        bytes[7] = 0x00;
        bytes
    }));
    assert_eq!(fp.delete_all_users(), Err(Error::Failure));
}

#[test]
fn bad_checksum_is_failure() {
    let mut fp = sensor(MockSensor::new(|cmd| {
        let mut bytes = reply(cmd.opcode(), 0, 3, 0);
        bytes[6] ^= 0x10;
        bytes
    }));
    assert_eq!(fp.user_count(), Err(Error::Failure));
}

#[test]
fn response_to_other_opcode_is_failure() {
    let mut fp = sensor(MockSensor::new(|_| reply(0x05, 0, 0, 0)));
    assert_eq!(fp.delete_user(1), Err(Error::Failure));
}

#[test]
fn leading_noise_is_skipped() {
    let mut fp = sensor(MockSensor::new(|cmd| {
        let mut bytes = vec![0x00, 0x7E, 0x13];
        bytes.extend(reply(cmd.opcode(), 0, 6, 0));
        bytes
    }));
    assert_eq!(fp.user_count(), Ok(6));
}

#[test]
fn frame_layout_on_the_wire() {
    let mut fp = sensor(MockSensor::new(ack_all(0x00)));
    fp.delete_user(0x21).unwrap();
    let mock = fp.release();
    assert_eq!(
        mock.sent[0].as_bytes(),
        &[0xF5, 0x04, 0x00, 0x21, 0x00, 0x00, 0x04 ^ 0x21, 0xF5]
    );
}

#[test]
fn delete_all_then_count_reports_zero() {
    let mut users = 3u8;
    let mut fp = sensor(MockSensor::new(move |cmd| match cmd.opcode() {
        0x05 => {
            users = 0;
            reply(0x05, 0, 0, 0)
        }
        0x09 => reply(0x09, 0, users, 0),
        other => reply(other, 0, 0, 0x01),
    }));
    assert_eq!(fp.user_count(), Ok(3));
    fp.delete_all_users().unwrap();
    assert_eq!(fp.user_count(), Ok(0));
}

#[test]
fn user_count_sentinel_on_failure() {
    let mut fp = sensor(MockSensor::silent());
    assert_eq!(fp.user_count_or_sentinel(), USER_COUNT_UNAVAILABLE);

    let mut fp = sensor(MockSensor::new(|cmd| reply(cmd.opcode(), 0, 2, 0x01)));
    assert_eq!(fp.user_count_or_sentinel(), 0xFF);

    let mut fp = sensor(MockSensor::new(|cmd| reply(cmd.opcode(), 0, 2, 0x00)));
    assert_eq!(fp.user_count_or_sentinel(), 2);
}

#[test]
fn read_add_mode_decodes_q2() {
    let mut fp = sensor(MockSensor::new(|cmd| {
        assert_eq!(cmd.payload(), [0x00, 0x00, 0x01]);
        reply(cmd.opcode(), 0, 0x01, 0)
    }));
    assert_eq!(fp.read_add_mode(), Ok(AddMode::RejectRepeat));
}

#[test]
fn add_user_sends_three_stages_on_success() {
    let mut fp = sensor(MockSensor::new(ack_all(0x00)));
    assert_eq!(fp.add_user(12, Permission::Normal), Ok(()));
    let mock = fp.release();
    let opcodes: Vec<u8> = mock.sent.iter().map(|f| f.opcode()).collect();
    assert_eq!(opcodes, [0x01, 0x02, 0x03]);
    for frame in &mock.sent {
        assert_eq!(frame.payload(), [0x00, 12, 0x02]);
    }
}

#[test]
fn add_user_stops_at_failing_stage() {
    let mut fp = sensor(MockSensor::new(|cmd| match cmd.opcode() {
        0x02 => reply(0x02, 0, 0, 0x07),
        other => reply(other, 0, 0, 0x00),
    }));
    assert_eq!(
        fp.add_user(1, Permission::Guest),
        Err(Error::Enroll { stage: EnrollStage::Second, ack: Ack::UserExists })
    );
    let mock = fp.release();
    assert_eq!(mock.sent.len(), 2);
}

#[test]
fn add_user_reports_fail_when_a_stage_gets_no_answer() {
    let mut fp = sensor(MockSensor::new(|cmd| match cmd.opcode() {
        0x01 => reply(0x01, 0, 0, 0x00),
        _ => Vec::new(),
    }));
    assert_eq!(
        fp.add_user(1, Permission::Master),
        Err(Error::Enroll { stage: EnrollStage::Second, ack: Ack::Fail })
    );
    assert_eq!(fp.release().sent.len(), 2);
}

#[test]
fn add_user_final_stage_ack_decides() {
    let mut fp = sensor(MockSensor::new(|cmd| match cmd.opcode() {
        0x03 => reply(0x03, 0, 0, 0x06),
        other => reply(other, 0, 0, 0x00),
    }));
    assert_eq!(
        fp.add_user(5, Permission::Guest),
        Err(Error::Enroll { stage: EnrollStage::Third, ack: Ack::UserOccupied })
    );
}

#[test]
fn compare_finger_match_sets_last_user_id() {
    let mut fp = sensor(MockSensor::new(|_| reply(0x0C, 0x01, 0x02, 0x03)));
    let found = fp.compare_finger().unwrap();
    assert_eq!(found.user_id, 0x0102);
    assert_eq!(found.permission, Permission::Master);
    let last = fp.last_response();
    assert_eq!(fp.last_user_id(), (u16::from(last.q1()) << 8) | u16::from(last.q2()));
    assert_eq!(fp.last_user_id(), found.user_id);
}

#[test]
fn compare_finger_tri_state() {
    let mut fp = sensor(MockSensor::new(|_| reply(0x0C, 0, 0, 0x05)));
    assert_eq!(fp.compare_finger(), Err(Error::NoUser));

    let mut fp = sensor(MockSensor::new(|_| reply(0x0C, 0, 0, 0x08)));
    assert_eq!(fp.compare_finger(), Err(Error::Timeout));

    // Quality code without an id is not a match.
    let mut fp = sensor(MockSensor::new(|_| reply(0x0C, 0, 0, 0x02)));
    assert_eq!(fp.compare_finger(), Err(Error::Rejected(Ack::Unknown(0x02))));

    let mut fp = sensor(MockSensor::new(|_| reply(0x0C, 0, 4, 0x00)));
    assert_eq!(fp.compare_finger(), Err(Error::Failure));
}

#[test]
fn response_buffer_is_cleared_when_nothing_arrives() {
    let mut calls = 0;
    let mut fp = sensor(MockSensor::new(move |_| {
        calls += 1;
        if calls == 1 {
            reply(0x0C, 0x00, 0x09, 0x01)
        } else {
            Vec::new()
        }
    }));
    fp.compare_finger().unwrap();
    assert_eq!(fp.last_user_id(), 9);
    assert_eq!(fp.compare_finger(), Err(Error::Failure));
    assert_eq!(fp.last_response(), Frame::default());
}

#[test]
fn setup_failure_is_reported() {
    let mut mock = MockSensor::silent();
    mock.fail_configure = true;
    match Fpc1020a::new(mock, Config::default()) {
        Err(Error::Setup) => {}
        other => panic!("expected setup failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn write_error_is_failure() {
    let mut mock = MockSensor::new(ack_all(0x00));
    mock.fail_write_on = Some(0x09);
    let mut fp = sensor(mock);
    assert_eq!(fp.user_count(), Err(Error::Failure));
    assert_eq!(fp.user_count_or_sentinel(), USER_COUNT_UNAVAILABLE);
    // Other commands still go through.
    assert_eq!(fp.delete_all_users(), Ok(()));
}

#[test]
fn read_error_is_failure() {
    let mut mock = MockSensor::new(|cmd| reply(cmd.opcode(), 0x00, 0x07, 0x02));
    mock.fail_read = true;
    let mut fp = sensor(mock);
    assert_eq!(fp.compare_finger(), Err(Error::Failure));

    let mock = fp.release();
    assert_eq!(mock.sent.len(), 1);
    assert_eq!(mock.now, 0, "read error should end the call at once");
}

#[test]
fn add_user_reports_fail_when_a_stage_write_fails() {
    let mut mock = MockSensor::new(ack_all(0x00));
    mock.fail_write_on = Some(0x02);
    let mut fp = sensor(mock);
    assert_eq!(
        fp.add_user(3, Permission::Normal),
        Err(Error::Enroll {
            stage: EnrollStage::Second,
            ack: Ack::Fail,
        })
    );
    assert_eq!(fp.release().sent.len(), 2);
}

#[test]
fn timeout_includes_time_spent_writing() {
    let mut mock = MockSensor::silent();
    mock.write_cost_ms = 50;
    let mut fp = sensor(mock);
    assert_eq!(fp.delete_all_users(), Err(Error::Failure));

    let mock = fp.release();
    assert!(mock.now >= 1200, "returned early at {} ms", mock.now);
    assert!(mock.now <= 1200 + POLL_MS, "overshot to {} ms", mock.now);
}

#[test]
fn zero_poll_interval_still_times_out() {
    let config = Config {
        poll_interval_ms: 0,
        ..Config::default()
    };
    let mut fp = Fpc1020a::new(MockSensor::silent(), config).unwrap();
    assert_eq!(fp.delete_all_users(), Err(Error::Failure));

    let mock = fp.release();
    assert_eq!(mock.now, 1200);
    assert_eq!(mock.longest_wait, 1);
}
