//! The DTM test state machine.
//!
//! One [`Dtm`] owns the hardware and all test state. The owner feeds command
//! words with [`Dtm::submit_command`], collects the response with
//! [`Dtm::take_event`] and calls [`Dtm::poll_tick`] every 625 µs so received
//! packets get counted. Nothing in here is shared or reentrant.

mod setup;

use crate::cmd::{Command, Event, PacketSelector};
use crate::config::Config;
#[cfg(feature = "direction-finding")]
use crate::cte::{CteConfig, IQ_CAPACITY};
use crate::pdu::{CteCheck, PacketType, Pdu};
use crate::radio::{self, channel_frequency, PacketEnd, Phy, SessionConfig};
use crate::soc::{self, Hardware};
use crate::timing::{self, TimerEvent};
use crate::vendor::{self, Diagnostics, NoDiagnostics, Operation, VendorCommand};

/// Highest DTM channel, 2480 MHz.
pub const MAX_CHANNEL: u8 = 39;

/// Command rejection reasons.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Channel above 39 on a non-vendor packet.
    IllegalChannel,
    /// Test command while a test is running, or End while idle.
    InvalidState,
    /// Payload longer than supported on a non-vendor packet.
    IllegalLength,
    /// Bad parameter, unsupported PHY/power combination or failed diagnostic.
    IllegalConfiguration,
    /// [`Dtm::init`] has not succeeded yet.
    Uninitialized,
}

/// Engine state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Uninitialized,
    Idle,
    TransmitterTest,
    CarrierTest,
    ReceiverTest,
}

impl State {
    pub const fn is_test(self) -> bool {
        matches!(self, Self::TransmitterTest | Self::CarrierTest | Self::ReceiverTest)
    }
}

/// A rejected command and the event reported for it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Reject {
    pub error: Error,
    pub event: Event,
}

impl From<Error> for Reject {
    fn from(error: Error) -> Self {
        Self {
            error,
            event: Event::ERROR,
        }
    }
}

/// Direct Test Mode engine.
pub struct Dtm<H: Hardware, D: Diagnostics = NoDiagnostics> {
    hw: H,
    diag: D,
    config: Config,
    state: State,
    phy: Phy,
    tx_power: i8,
    packet_len: u8,
    packet_type: PacketType,
    channel: u8,
    rx_packet_count: u16,
    event: Event,
    new_event: bool,
    tick: u32,
    pdu: Pdu,
    #[cfg(feature = "direction-finding")]
    cte: CteConfig,
    #[cfg(feature = "direction-finding")]
    iq: [u32; IQ_CAPACITY],
}

impl<H: Hardware, D: Diagnostics> Dtm<H, D> {
    pub fn new(hw: H, diag: D, config: Config) -> Self {
        Self {
            hw,
            diag,
            state: State::Uninitialized,
            phy: Phy::Le1M,
            tx_power: config.default_tx_power,
            packet_len: 0,
            packet_type: PacketType::Prbs9,
            channel: 0,
            rx_packet_count: 0,
            event: Event::SUCCESS,
            new_event: false,
            tick: 0,
            pdu: Pdu::new(),
            #[cfg(feature = "direction-finding")]
            cte: CteConfig::default(),
            #[cfg(feature = "direction-finding")]
            iq: [0; IQ_CAPACITY],
            config,
        }
    }

    /// Starts the clock, trigger and radio. Calling it again once initialized
    /// does nothing.
    pub fn init(&mut self) -> Result<(), Error> {
        if self.state != State::Uninitialized {
            return Ok(());
        }

        if let Err(e) = self.hw.start_hfclk() {
            error!("DTM init: HF clock failed: {:?}", e);
            return Err(Error::Uninitialized);
        }
        if let Err(e) = self.hw.init(timing::SLOT_US) {
            error!("DTM init: trigger failed: {:?}", e);
            return Err(Error::Uninitialized);
        }
        let session = self.session();
        if let Err(e) = radio::configure_session(&mut self.hw, &session) {
            error!("DTM init: radio failed: {:?}", e);
            return Err(Error::Uninitialized);
        }
        self.hw.set_radio_high_voltage(true);

        self.set_state(State::Idle);
        info!("DTM ready, tx power {} dBm", self.tx_power);
        Ok(())
    }

    /// Processes one command word. The response is left for
    /// [`take_event`](Self::take_event), replacing any unread one.
    pub fn submit_command(&mut self, word: u16) -> Result<(), Error> {
        self.new_event = true;

        let outcome = if self.state == State::Uninitialized {
            Err(Reject::from(Error::Uninitialized))
        } else {
            match Command::decode(word) {
                Command::Setup { control, parameter } => self.on_setup(control, parameter),
                Command::End => self.on_end(),
                Command::ReceiverTest {
                    channel,
                    length,
                    packet,
                } => self.on_test(true, channel, length, packet),
                Command::TransmitterTest {
                    channel,
                    length,
                    packet,
                } => self.on_test(false, channel, length, packet),
            }
        };

        match outcome {
            Ok(event) => {
                self.event = event;
                Ok(())
            }
            Err(reject) => {
                debug!("DTM command {:04x} rejected: {:?}", word, reject.error);
                self.event = reject.event;
                Err(reject.error)
            }
        }
    }

    /// Services radio and timer events until the next 625 µs tick and
    /// returns the tick count.
    pub fn poll_tick(&mut self) -> u32 {
        if self.state == State::Uninitialized {
            return self.tick;
        }

        loop {
            if self.hw.take_packet_end() && self.state == State::ReceiverTest {
                self.on_packet_received();
            }

            match self.hw.poll() {
                Some(TimerEvent::Tick) => {
                    self.tick = self.tick.wrapping_add(1);
                    return self.tick;
                }
                Some(TimerEvent::TxInterval) | None => {}
            }
        }
    }

    /// Returns the response of the last command, once.
    pub fn take_event(&mut self) -> Option<Event> {
        if self.new_event {
            self.new_event = false;
            Some(self.event)
        } else {
            None
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn phy(&self) -> Phy {
        self.phy
    }

    pub fn tx_power(&self) -> i8 {
        self.tx_power
    }

    pub fn packet_len(&self) -> u8 {
        self.packet_len
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn rx_packet_count(&self) -> u16 {
        self.rx_packet_count
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn pdu(&self) -> &Pdu {
        &self.pdu
    }

    #[cfg(feature = "direction-finding")]
    pub fn cte(&self) -> &CteConfig {
        &self.cte
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diag
    }

    /// Releases the hardware and diagnostics.
    pub fn free(self) -> (H, D) {
        (self.hw, self.diag)
    }

    fn set_state(&mut self, state: State) {
        if state != self.state {
            debug!("DTM {:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }

    fn cte_active(&self) -> bool {
        #[cfg(feature = "direction-finding")]
        {
            self.cte.is_active()
        }
        #[cfg(not(feature = "direction-finding"))]
        {
            false
        }
    }

    fn cte_length(&self) -> Option<u8> {
        #[cfg(feature = "direction-finding")]
        {
            self.cte.is_active().then_some(self.cte.length)
        }
        #[cfg(not(feature = "direction-finding"))]
        {
            None
        }
    }

    fn session(&self) -> SessionConfig {
        SessionConfig::new(self.phy, self.tx_power, self.config.access_address, self.cte_active())
    }

    fn configure_radio(&mut self) -> Result<(), Error> {
        let session = self.session();
        radio::configure_session(&mut self.hw, &session).map_err(|e| {
            debug!("radio session rejected: {:?}", e);
            Error::IllegalConfiguration
        })
    }

    /// Stops a running test: route first, then the radio.
    fn end_test(&mut self) {
        self.hw.disconnect();
        self.hw.disable();
        self.set_state(State::Idle);
    }

    fn on_end(&mut self) -> Result<Event, Reject> {
        if !self.state.is_test() {
            return Err(Error::InvalidState.into());
        }

        let report = Event::packet_report(self.rx_packet_count);
        self.end_test();
        Ok(report)
    }

    fn on_test(&mut self, receive: bool, channel: u8, length: u8, packet: PacketSelector) -> Result<Event, Reject> {
        if self.state != State::Idle {
            return Err(Error::InvalidState.into());
        }

        let packet_type = match packet {
            PacketSelector::Prbs9 => PacketType::Prbs9,
            PacketSelector::Pattern0F => PacketType::Pattern0F,
            PacketSelector::Pattern55 => PacketType::Pattern55,
            PacketSelector::PatternFfOrVendor if self.phy.is_coded() => PacketType::PatternFF,
            PacketSelector::PatternFfOrVendor => PacketType::VendorSpecific,
        };
        let packet_len = (self.packet_len & 0xC0) | (length & 0x3F);
        let vendor = packet_type == PacketType::VendorSpecific;

        if !vendor && channel > MAX_CHANNEL {
            return Err(Error::IllegalChannel.into());
        }
        if !vendor && packet_len > self.config.max_payload_octets {
            return Err(Error::IllegalLength.into());
        }
        if vendor && receive {
            return Err(Error::IllegalConfiguration.into());
        }

        self.packet_type = packet_type;
        self.packet_len = packet_len;
        self.channel = channel;
        self.rx_packet_count = 0;

        if vendor {
            // length carries the command, channel the option
            return self.on_vendor(length, channel);
        }
        if receive {
            self.start_receiver()
        } else {
            self.start_transmitter()
        }
    }

    fn packet_end(&self) -> PacketEnd {
        if self.cte_active() {
            PacketEnd::PhyEnd
        } else {
            PacketEnd::End
        }
    }

    #[cfg(feature = "direction-finding")]
    fn prepare_cte(&mut self, receive: bool) {
        if !self.cte.is_active() {
            return;
        }
        if self.cte.switches_antennas(receive) {
            self.hw.configure_antenna_pins();
            self.hw.clear_switch_pattern();
            for antenna in self.cte.switch_pattern() {
                self.hw.push_switch_pattern(antenna);
            }
        }
        let setup = self.cte.setup(receive);
        self.hw.configure_cte(&setup);
    }

    fn prepare_radio(&mut self, receive: bool) -> Result<(), Error> {
        self.configure_radio()?;
        #[cfg(feature = "direction-finding")]
        self.prepare_cte(receive);

        self.hw.set_frequency(channel_frequency(self.channel));
        if !receive {
            self.hw.set_tx_power(self.tx_power);
        }
        self.hw.load_packet(self.pdu.as_bytes());
        Ok(())
    }

    fn start_receiver(&mut self) -> Result<Event, Reject> {
        self.pdu.clear();
        self.prepare_radio(true)?;
        self.hw.start_receive(self.packet_end());

        self.set_state(State::ReceiverTest);
        Ok(Event::SUCCESS)
    }

    fn start_transmitter(&mut self) -> Result<Event, Reject> {
        let Some(pattern) = self.packet_type.pattern() else {
            return Err(Error::IllegalConfiguration.into());
        };

        #[cfg(feature = "direction-finding")]
        let cte_info = self.cte.is_active().then_some(self.cte.info);
        #[cfg(not(feature = "direction-finding"))]
        let cte_info = None;

        self.pdu.clear();
        self.pdu.build(pattern, self.packet_len, cte_info);
        self.prepare_radio(false)?;
        self.hw.arm_transmit(self.packet_end());

        let interval = timing::packet_interval_us(self.phy, self.packet_len, self.cte_length());
        timing::arm(&mut self.hw, interval);

        self.set_state(State::TransmitterTest);
        Ok(Event::SUCCESS)
    }

    fn on_vendor(&mut self, code: u8, option: u8) -> Result<Event, Reject> {
        let Some(command) = VendorCommand::from_code(code) else {
            return Err(Error::IllegalConfiguration.into());
        };

        match command.operation() {
            Operation::Carrier => {
                self.prepare_radio(false)?;
                self.hw.start_carrier();
                self.set_state(State::CarrierTest);
                Ok(Event::SUCCESS)
            }
            Operation::SetTxPower => {
                let level = vendor::tx_power_from_option(option);
                if !self.hw.supports(self.phy, level) {
                    return Err(Error::IllegalConfiguration.into());
                }
                self.tx_power = level;
                Ok(Event::SUCCESS)
            }
            Operation::Unsupported => Err(Error::IllegalConfiguration.into()),
            Operation::DeviceAddress(index) => {
                let byte = soc::device_address_byte(self.hw.device_address(), index)
                    .ok_or(Error::IllegalConfiguration)?;
                Ok(Event::success(byte as u16))
            }
            Operation::SetRadioHighVoltage => {
                self.hw.set_radio_high_voltage(option != 0);
                Ok(Event::SUCCESS)
            }
            Operation::RadioHighVoltage => Ok(Event::success(self.hw.radio_high_voltage() as u16)),
            Operation::HfclkCtrl => Ok(Event::success(self.hw.hfclk_ctrl() as u16)),
            Operation::HfclkAlwaysRun => Ok(Event::success(self.hw.hfclk_always_run() as u16)),
            Operation::Write(id) => match self.diag.write_byte(option, id) {
                Ok(()) => Ok(Event::SUCCESS),
                Err(_) => {
                    warn!("diagnostic write {:?} failed", command);
                    Err(Error::IllegalConfiguration.into())
                }
            },
            Operation::Read(id) => match self.diag.read_byte(id) {
                Ok(byte) => Ok(Event::success(byte as u16)),
                Err(_) => {
                    warn!("diagnostic read {:?} failed", command);
                    Err(Error::IllegalConfiguration.into())
                }
            },
            Operation::WriteRead(id) => match self.diag.write_then_read_byte(option, id) {
                Ok(byte) => Ok(Event::success(byte as u16)),
                Err(_) => {
                    warn!("diagnostic write/read {:?} failed", command);
                    Err(Error::IllegalConfiguration.into())
                }
            },
        }
    }

    fn on_packet_received(&mut self) {
        let crc_ok = self.hw.crc_ok();
        self.hw.read_packet(self.pdu.as_mut_bytes());
        self.hw.restart_receive();

        let cte = self.cte_check();
        if crc_ok && self.pdu.validate(self.phy, cte.as_ref()) {
            self.rx_packet_count = self.rx_packet_count.wrapping_add(1);
        } else {
            trace!("dropped packet, crc ok: {}", crc_ok);
        }

        self.pdu.clear();
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "direction-finding")] {
        impl<H: Hardware, D: Diagnostics> Dtm<H, D> {
            fn cte_check(&mut self) -> Option<CteCheck> {
                if !self.cte.is_active() {
                    return None;
                }
                let received_samples = self.hw.read_iq_samples(&mut self.iq);
                self.iq.fill(0);
                Some(CteCheck {
                    info: self.cte.info,
                    expected_samples: self.cte.expected_sample_count(),
                    received_samples,
                })
            }
        }
    } else {
        impl<H: Hardware, D: Diagnostics> Dtm<H, D> {
            fn cte_check(&mut self) -> Option<CteCheck> {
                None
            }
        }
    }
}
