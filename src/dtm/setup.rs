//! Setup command handling.
//!
//! A Setup is checked in full before anything is touched. Only an accepted
//! Setup stops the running test and is applied.

use super::{Dtm, Error, Reject};
use crate::cmd::{Event, SetupControl};
#[cfg(feature = "direction-finding")]
use crate::cte::{self, CteConfig};
use crate::radio::Phy;
use crate::soc::Hardware;
use crate::vendor::Diagnostics;

const RESET_MAX: u8 = 0x03;
const UPPER_BITS_MAX: u8 = 0x0F;
const UPPER_BITS_MASK: u8 = 0x0C;
const UPPER_BITS_SHIFT: u8 = 4;
const MODULATION_STANDARD_MAX: u8 = 0x03;
const FEATURE_READ_MAX: u8 = 0x03;

const TX_POWER_SET_MIN: u8 = 0x7E;
const TX_POWER_SET_MAX: u8 = 0x7F;
const TX_POWER_FLOOR_DBM: i8 = -127;
const TX_POWER_LIMIT_DBM: i8 = 20;

/// Transmit power response flags, above the 8-bit level.
pub(super) const TX_POWER_AT_MIN: u16 = 1 << 8;
pub(super) const TX_POWER_AT_MAX: u16 = 1 << 9;

// Supported features response bits.
pub(super) const FEATURE_DLE: u16 = 1 << 0;
pub(super) const FEATURE_2M_PHY: u16 = 1 << 1;
pub(super) const FEATURE_CODED_PHY: u16 = 1 << 3;
pub(super) const FEATURE_CTE: u16 = 1 << 4;
pub(super) const FEATURE_ANTENNA_SWITCH: u16 = 1 << 5;
pub(super) const FEATURE_AOD_1US_TX: u16 = 1 << 6;
pub(super) const FEATURE_AOD_1US_RX: u16 = 1 << 7;
pub(super) const FEATURE_AOA_1US_RX: u16 = 1 << 8;

pub(super) const fn supported_features() -> u16 {
    let mut features = FEATURE_DLE | FEATURE_2M_PHY;
    if cfg!(feature = "coded-phy") {
        features |= FEATURE_CODED_PHY;
    }
    if cfg!(feature = "direction-finding") {
        features |= FEATURE_CTE
            | FEATURE_ANTENNA_SWITCH
            | FEATURE_AOD_1US_TX
            | FEATURE_AOD_1US_RX
            | FEATURE_AOA_1US_RX;
    }
    features
}

/// An accepted Setup, ready to apply.
enum SetupAction {
    Reset,
    UpperLengthBits(u8),
    SetPhy(Phy),
    /// Answers without changing any state.
    Respond(Event),
    TxPower(i8),
    #[cfg(feature = "direction-finding")]
    Cte(CteConfig),
}

impl<H: Hardware, D: Diagnostics> Dtm<H, D> {
    pub(super) fn on_setup(&mut self, control: u8, parameter: u8) -> Result<Event, Reject> {
        let control = SetupControl::try_from(control).map_err(|_| Error::IllegalConfiguration)?;
        let action = self.check_setup(control, parameter)?;

        if self.state.is_test() {
            self.end_test();
        }
        self.apply_setup(action)
    }

    fn check_setup(&self, control: SetupControl, parameter: u8) -> Result<SetupAction, Reject> {
        match control {
            SetupControl::Reset if parameter <= RESET_MAX => Ok(SetupAction::Reset),
            SetupControl::SetUpperLengthBits if parameter <= UPPER_BITS_MAX => Ok(SetupAction::UpperLengthBits(
                (parameter & UPPER_BITS_MASK) << UPPER_BITS_SHIFT,
            )),
            SetupControl::SetPhy => Phy::from_setup_param(parameter)
                .filter(|phy| phy.is_compiled_in() && self.hw.supports(*phy, self.tx_power))
                .map(SetupAction::SetPhy)
                .ok_or(Error::IllegalConfiguration.into()),
            SetupControl::SelectModulation if parameter <= MODULATION_STANDARD_MAX => {
                Ok(SetupAction::Respond(Event::SUCCESS))
            }
            SetupControl::ReadSupportedFeatures if parameter <= FEATURE_READ_MAX => {
                Ok(SetupAction::Respond(Event::success(supported_features())))
            }
            SetupControl::ReadMaximumValues => self
                .maximum_value(parameter)
                .map(|value| SetupAction::Respond(Event::success(value)))
                .ok_or(Error::IllegalConfiguration.into()),
            SetupControl::TransmitPower => self.check_tx_power(parameter),
            #[cfg(feature = "direction-finding")]
            SetupControl::ConstantToneExtension => {
                self.cte.with_setup(parameter).map(SetupAction::Cte).map_err(cte_rejected)
            }
            #[cfg(feature = "direction-finding")]
            SetupControl::ConstantToneExtensionSlot => {
                self.cte.with_slot(parameter).map(SetupAction::Cte).map_err(cte_rejected)
            }
            #[cfg(feature = "direction-finding")]
            SetupControl::AntennaArray => self
                .cte
                .with_antennas(parameter, self.config.antenna_count)
                .map(SetupAction::Cte)
                .map_err(cte_rejected),
            _ => Err(Error::IllegalConfiguration.into()),
        }
    }

    fn apply_setup(&mut self, action: SetupAction) -> Result<Event, Reject> {
        match action {
            SetupAction::Reset => {
                self.packet_len = 0;
                self.phy = Phy::Le1M;
                #[cfg(feature = "direction-finding")]
                {
                    self.cte = CteConfig::default();
                    self.hw.clear_switch_pattern();
                }
                self.configure_radio()?;
            }
            SetupAction::UpperLengthBits(bits) => self.packet_len = bits,
            SetupAction::SetPhy(phy) => {
                let previous = self.phy;
                self.phy = phy;
                if let Err(e) = self.configure_radio() {
                    self.phy = previous;
                    return Err(e.into());
                }
            }
            SetupAction::Respond(event) => return Ok(event),
            SetupAction::TxPower(level) => {
                self.tx_power = level;
                return Ok(Event::success(self.tx_power_data(level)));
            }
            #[cfg(feature = "direction-finding")]
            SetupAction::Cte(cte) => self.cte = cte,
        }
        Ok(Event::SUCCESS)
    }

    fn maximum_value(&self, parameter: u8) -> Option<u16> {
        match parameter {
            // supportedMaxTxOctets, supportedMaxRxOctets
            0x00..=0x03 | 0x08..=0x0B => Some(self.config.max_payload_octets as u16),
            // supportedMaxTxTime, supportedMaxRxTime
            0x04..=0x07 | 0x0C..=0x0F => Some(self.config.max_rx_tx_time),
            #[cfg(feature = "direction-finding")]
            0x10 => Some(cte::MAX_LENGTH as u16),
            _ => None,
        }
    }

    /// Picks the level for a TransmitPower Setup. Requests above +20 dBm are
    /// rejected with the current level in the event.
    fn check_tx_power(&self, parameter: u8) -> Result<SetupAction, Reject> {
        let level = match parameter {
            TX_POWER_SET_MIN => self.config.min_tx_power(),
            TX_POWER_SET_MAX => self.config.max_tx_power(),
            _ => {
                let requested = parameter as i8;
                if !(TX_POWER_FLOOR_DBM..=TX_POWER_LIMIT_DBM).contains(&requested) {
                    return Err(Reject {
                        error: Error::IllegalConfiguration,
                        event: Event::error(self.tx_power_data(self.tx_power)),
                    });
                }
                self.config.nearest_tx_power(requested)
            }
        };
        Ok(SetupAction::TxPower(level))
    }

    fn tx_power_data(&self, level: i8) -> u16 {
        let flags = if level == self.config.min_tx_power() {
            TX_POWER_AT_MIN
        } else if level == self.config.max_tx_power() {
            TX_POWER_AT_MAX
        } else {
            0
        };
        level as u8 as u16 | flags
    }
}

#[cfg(feature = "direction-finding")]
fn cte_rejected(e: cte::Error) -> Reject {
    debug!("CTE setup rejected: {:?}", e);
    Error::IllegalConfiguration.into()
}
