/// Parity setting of the serial link.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Hardware flow control of the serial link.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum FlowControl {
    None,
    /// RTS/CTS. `rx_threshold` is the RX FIFO level at which RTS is deasserted.
    RtsCts { rx_threshold: u8 },
}

/// GPIO assignment for the UART signals. `None` leaves a signal on its current pin.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct Pins {
    pub tx: Option<u32>,
    pub rx: Option<u32>,
    pub rts: Option<u32>,
    pub cts: Option<u32>,
}

impl Pins {
    /// TX and RX only, handshake lines untouched.
    pub fn new(tx: u32, rx: u32) -> Self {
        Pins {
            tx: Some(tx),
            rx: Some(rx),
            rts: None,
            cts: None,
        }
    }
}

/// Serial link and receive-loop settings.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Config {
    /// The module only talks at 19200 baud out of the box.
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
    pub pins: Pins,
    /// Size of the driver-side RX ring for transports that allocate one.
    pub rx_buffer_len: usize,
    /// Longest single wait inside the receive loop. Bounds how far a command can
    /// overshoot its timeout.
    pub poll_interval_ms: u32,
}

impl Config {
    /// Sets the pins for the configuration.
    ///
    /// # Arguments
    ///
    /// * `pins` - The `Pins` to assign.
    ///
    /// # Returns
    ///
    /// The updated `Config` instance.
    pub fn pins(mut self, pins: Pins) -> Self {
        self.pins = pins;
        self
    }

    pub fn flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn rx_buffer_len(mut self, rx_buffer_len: usize) -> Self {
        self.rx_buffer_len = rx_buffer_len;
        self
    }

    /// Sets the receive poll interval. Zero is bumped to 1 ms so the loop always
    /// makes progress.
    pub fn poll_interval_ms(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms.max(1);
        self
    }
}

/// 19200 8-N-1 with RTS/CTS, the settings the module ships with.
impl Default for Config {
    fn default() -> Config {
        Config {
            baud_rate: 19200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::RtsCts { rx_threshold: 122 },
            pins: Pins::default(),
            rx_buffer_len: 1024,
            poll_interval_ms: 10,
        }
    }
}
