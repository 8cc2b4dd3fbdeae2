//! Host-side stand-ins for the radio, trigger, SoC and board diagnostics.

use std::collections::{HashMap, VecDeque};

#[cfg(feature = "direction-finding")]
use crate::cte::CteSetup;
use crate::radio::{PacketEnd, Phy, Radio, SessionConfig};
use crate::soc::{HwError, Soc};
use crate::timing::{TimerEvent, Trigger};
use crate::vendor::{DiagnosticId, Diagnostics};

/// One recorded hardware action.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Disable,
    Configure(SessionConfig),
    SetFrequency(u16),
    SetTxPower(i8),
    LoadPacket(Vec<u8>),
    StartReceive(PacketEnd),
    ArmTransmit(PacketEnd),
    StartCarrier,
    RestartReceive,
    #[cfg(feature = "direction-finding")]
    ConfigureAntennaPins,
    #[cfg(feature = "direction-finding")]
    ClearSwitchPattern,
    #[cfg(feature = "direction-finding")]
    PushSwitchPattern(u8),
    #[cfg(feature = "direction-finding")]
    ConfigureCte(CteSetup),
    TriggerInit(u32),
    SetPeriod(u32),
    Connect,
    Disconnect,
    StartHfclk,
    SetRadioHighVoltage(bool),
}

/// A packet waiting to be "received".
#[derive(Debug, Clone)]
pub struct Incoming {
    pub bytes: Vec<u8>,
    pub crc_ok: bool,
    pub iq_samples: usize,
}

#[derive(Debug, Default)]
pub struct FakeHardware {
    pub calls: Vec<Call>,
    pub incoming: VecDeque<Incoming>,
    current: Option<Incoming>,
    /// Scripted timer events; an empty queue yields ticks.
    pub timer_events: VecDeque<TimerEvent>,
    /// Power levels above this are refused.
    pub max_supported_power: i8,
    pub fail_hfclk: bool,
    pub fail_trigger: Option<HwError>,
    pub device_address: [u32; 2],
    pub high_voltage: bool,
    pub hfclk_ctrl: u8,
    pub hfclk_always_run: u8,
}

impl FakeHardware {
    pub fn new() -> Self {
        Self {
            max_supported_power: 8,
            ..Default::default()
        }
    }

    pub fn deliver(&mut self, bytes: &[u8], crc_ok: bool) {
        self.deliver_with_iq(bytes, crc_ok, 0);
    }

    pub fn deliver_with_iq(&mut self, bytes: &[u8], crc_ok: bool, iq_samples: usize) {
        self.incoming.push_back(Incoming {
            bytes: bytes.to_vec(),
            crc_ok,
            iq_samples,
        });
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn last_configure(&self) -> Option<&SessionConfig> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Configure(s) => Some(s),
            _ => None,
        })
    }

    pub fn last_loaded(&self) -> Option<&[u8]> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::LoadPacket(p) => Some(p.as_slice()),
            _ => None,
        })
    }

    #[cfg(feature = "direction-finding")]
    pub fn switch_pattern(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::PushSwitchPattern(a) => Some(*a),
                _ => None,
            })
            .collect()
    }
}

impl Radio for FakeHardware {
    fn supports(&self, _phy: Phy, tx_power: i8) -> bool {
        tx_power <= self.max_supported_power
    }

    fn disable(&mut self) {
        self.calls.push(Call::Disable);
    }

    fn configure(&mut self, session: &SessionConfig) {
        self.calls.push(Call::Configure(*session));
    }

    fn set_frequency(&mut self, mhz: u16) {
        self.calls.push(Call::SetFrequency(mhz));
    }

    fn set_tx_power(&mut self, dbm: i8) {
        self.calls.push(Call::SetTxPower(dbm));
    }

    fn load_packet(&mut self, pdu: &[u8]) {
        self.calls.push(Call::LoadPacket(pdu.to_vec()));
    }

    fn start_receive(&mut self, end: PacketEnd) {
        self.calls.push(Call::StartReceive(end));
    }

    fn arm_transmit(&mut self, end: PacketEnd) {
        self.calls.push(Call::ArmTransmit(end));
    }

    fn start_carrier(&mut self) {
        self.calls.push(Call::StartCarrier);
    }

    fn take_packet_end(&mut self) -> bool {
        self.current = self.incoming.pop_front();
        self.current.is_some()
    }

    fn crc_ok(&self) -> bool {
        self.current.as_ref().is_some_and(|p| p.crc_ok)
    }

    fn read_packet(&mut self, buf: &mut [u8]) {
        if let Some(p) = &self.current {
            let n = p.bytes.len().min(buf.len());
            buf[..n].copy_from_slice(&p.bytes[..n]);
        }
    }

    fn restart_receive(&mut self) {
        self.calls.push(Call::RestartReceive);
    }

    #[cfg(feature = "direction-finding")]
    fn configure_antenna_pins(&mut self) {
        self.calls.push(Call::ConfigureAntennaPins);
    }

    #[cfg(feature = "direction-finding")]
    fn clear_switch_pattern(&mut self) {
        self.calls.push(Call::ClearSwitchPattern);
    }

    #[cfg(feature = "direction-finding")]
    fn push_switch_pattern(&mut self, antenna: u8) {
        self.calls.push(Call::PushSwitchPattern(antenna));
    }

    #[cfg(feature = "direction-finding")]
    fn configure_cte(&mut self, setup: &CteSetup) {
        self.calls.push(Call::ConfigureCte(*setup));
    }

    #[cfg(feature = "direction-finding")]
    fn read_iq_samples(&mut self, buf: &mut [u32]) -> usize {
        let n = self.current.as_ref().map_or(0, |p| p.iq_samples);
        for (i, s) in buf.iter_mut().take(n).enumerate() {
            *s = i as u32;
        }
        n
    }
}

impl Trigger for FakeHardware {
    fn init(&mut self, tick_us: u32) -> Result<(), HwError> {
        if let Some(e) = self.fail_trigger {
            return Err(e);
        }
        self.calls.push(Call::TriggerInit(tick_us));
        Ok(())
    }

    fn set_period(&mut self, us: u32) {
        self.calls.push(Call::SetPeriod(us));
    }

    fn connect(&mut self) {
        self.calls.push(Call::Connect);
    }

    fn disconnect(&mut self) {
        self.calls.push(Call::Disconnect);
    }

    fn poll(&mut self) -> Option<TimerEvent> {
        Some(self.timer_events.pop_front().unwrap_or(TimerEvent::Tick))
    }
}

impl Soc for FakeHardware {
    fn start_hfclk(&mut self) -> Result<(), HwError> {
        if self.fail_hfclk {
            return Err(HwError::ClockUnavailable);
        }
        self.calls.push(Call::StartHfclk);
        Ok(())
    }

    fn device_address(&self) -> [u32; 2] {
        self.device_address
    }

    fn set_radio_high_voltage(&mut self, enable: bool) {
        self.high_voltage = enable;
        self.calls.push(Call::SetRadioHighVoltage(enable));
    }

    fn radio_high_voltage(&self) -> bool {
        self.high_voltage
    }

    fn hfclk_ctrl(&self) -> u8 {
        self.hfclk_ctrl
    }

    fn hfclk_always_run(&self) -> u8 {
        self.hfclk_always_run
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DiagnosticFailed;

/// Byte store keyed by diagnostic id.
#[derive(Debug, Default)]
pub struct FakeDiagnostics {
    pub values: HashMap<u8, u8>,
    pub writes: Vec<(u8, u8)>,
    pub fail: bool,
}

impl Diagnostics for FakeDiagnostics {
    type Error = DiagnosticFailed;

    fn write_byte(&mut self, value: u8, id: DiagnosticId) -> Result<(), DiagnosticFailed> {
        if self.fail {
            return Err(DiagnosticFailed);
        }
        self.writes.push((id.raw(), value));
        self.values.insert(id.raw(), value);
        Ok(())
    }

    fn read_byte(&mut self, id: DiagnosticId) -> Result<u8, DiagnosticFailed> {
        if self.fail {
            return Err(DiagnosticFailed);
        }
        Ok(self.values.get(&id.raw()).copied().unwrap_or(0))
    }

    fn write_then_read_byte(&mut self, value: u8, id: DiagnosticId) -> Result<u8, DiagnosticFailed> {
        self.write_byte(value, id)?;
        // inputs echo the pin number with the level in bit 7
        Ok(value | 0x80)
    }
}
