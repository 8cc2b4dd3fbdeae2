//! Radio session configuration and the radio hardware seam.

#[cfg(feature = "direction-finding")]
use crate::cte::CteSetup;

/// Test PHY.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phy {
    #[default]
    Le1M,
    Le2M,
    /// LE Coded, S=8 (125 kbit/s).
    LeCodedS8,
    /// LE Coded, S=2 (500 kbit/s).
    LeCodedS2,
}

/// Preamble length programmed for a PHY.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Preamble {
    Bits8,
    Bits16,
    LongRange,
}

impl Phy {
    /// Maps a Setup SetPhy parameter to a PHY.
    pub const fn from_setup_param(param: u8) -> Option<Self> {
        match param {
            0x04..=0x07 => Some(Self::Le1M),
            0x08..=0x0B => Some(Self::Le2M),
            0x0C..=0x0F => Some(Self::LeCodedS8),
            0x10..=0x13 => Some(Self::LeCodedS2),
            _ => None,
        }
    }

    pub const fn preamble(self) -> Preamble {
        match self {
            Self::Le1M => Preamble::Bits8,
            Self::Le2M => Preamble::Bits16,
            Self::LeCodedS8 | Self::LeCodedS2 => Preamble::LongRange,
        }
    }

    pub const fn is_coded(self) -> bool {
        matches!(self, Self::LeCodedS8 | Self::LeCodedS2)
    }

    /// Whether this build can drive the PHY at all.
    pub const fn is_compiled_in(self) -> bool {
        !self.is_coded() || cfg!(feature = "coded-phy")
    }

    /// Air bits spent outside the payload: preamble, access address, header,
    /// CRC and, on coded PHYs, CI and TERM fields with their coding.
    pub const fn overhead_bits(self) -> u32 {
        match self {
            Self::Le1M => 80,
            Self::Le2M => 88,
            Self::LeCodedS8 => 720,
            Self::LeCodedS2 => 462,
        }
    }

    /// Symbols per payload bit.
    pub const fn coding_factor(self) -> u32 {
        match self {
            Self::LeCodedS8 => 8,
            Self::LeCodedS2 => 2,
            Self::Le1M | Self::Le2M => 1,
        }
    }

    /// Air time of one PDU byte in µs.
    pub const fn byte_time_us(self) -> u32 {
        match self {
            Self::Le1M => 8,
            Self::Le2M => 4,
            Self::LeCodedS8 => 64,
            Self::LeCodedS2 => 16,
        }
    }
}

/// BLE CRC-24 parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrcConfig {
    pub polynomial: u32,
    pub init: u32,
    /// CRC length in bytes.
    pub len: u8,
    pub skip_address: bool,
}

impl CrcConfig {
    pub const BLE: Self = Self {
        polynomial: 0x0000_065B,
        init: 0x0055_5555,
        len: 3,
        skip_address: true,
    };
}

/// Over-the-air packet layout.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketFormat {
    /// S0 field length in bytes.
    pub s0_len: u8,
    /// S1 field length in bits, 8 when a CTEInfo byte follows the length.
    pub s1_len: u8,
    /// Length field width in bits.
    pub lf_len: u8,
    /// Base address length in bytes.
    pub base_address_len: u8,
    pub static_len: u8,
    pub max_len: u8,
    /// Coding indicator length in bits, coded PHYs only.
    pub ci_len: u8,
    /// TERM1 length in bits, coded PHYs only.
    pub term_len: u8,
    pub little_endian: bool,
    pub whitening: bool,
}

/// Everything the radio needs for one test session.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    pub phy: Phy,
    pub preamble: Preamble,
    pub access_address: u32,
    pub tx_power: i8,
    pub crc: CrcConfig,
    pub format: PacketFormat,
}

impl SessionConfig {
    pub const fn new(phy: Phy, tx_power: i8, access_address: u32, with_cte: bool) -> Self {
        let coded = phy.is_coded();
        Self {
            phy,
            preamble: phy.preamble(),
            access_address,
            tx_power,
            crc: CrcConfig::BLE,
            format: PacketFormat {
                s0_len: 1,
                s1_len: if with_cte { 8 } else { 0 },
                lf_len: 8,
                base_address_len: 3,
                static_len: 0,
                max_len: 0xFF,
                ci_len: if coded { 2 } else { 0 },
                term_len: if coded { 3 } else { 0 },
                little_endian: true,
                whitening: false,
            },
        }
    }
}

/// Event ending a radio transfer and dropping the radio back to disabled.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketEnd {
    /// End of CRC.
    End,
    /// End of the last symbol on air, including any CTE.
    PhyEnd,
}

/// Radio peripheral operations used by the engine.
///
/// Every method is a direct register-level action; none of them may block
/// for more than a few µs.
pub trait Radio {
    /// Whether `tx_power` can be used with `phy`.
    fn supports(&self, phy: Phy, tx_power: i8) -> bool;

    /// Stops any transfer and returns to the disabled state.
    fn disable(&mut self);

    fn configure(&mut self, session: &SessionConfig);

    fn set_frequency(&mut self, mhz: u16);

    fn set_tx_power(&mut self, dbm: i8);

    /// Points the packet buffer at `pdu`, copying it if the radio cannot DMA
    /// from it.
    fn load_packet(&mut self, pdu: &[u8]);

    /// Enables the receiver; the radio keeps listening until `end`.
    fn start_receive(&mut self, end: PacketEnd);

    /// Prepares one transmit per external trigger, disabling after `end`.
    fn arm_transmit(&mut self, end: PacketEnd);

    /// Unmodulated carrier at the current frequency and power.
    fn start_carrier(&mut self);

    /// Returns and clears the packet-end flag.
    fn take_packet_end(&mut self) -> bool;

    fn crc_ok(&self) -> bool;

    /// Copies the last received packet into `buf`.
    fn read_packet(&mut self, buf: &mut [u8]);

    /// Re-enables the receiver after a packet end.
    fn restart_receive(&mut self);

    #[cfg(feature = "direction-finding")]
    fn configure_antenna_pins(&mut self);

    #[cfg(feature = "direction-finding")]
    fn clear_switch_pattern(&mut self);

    #[cfg(feature = "direction-finding")]
    fn push_switch_pattern(&mut self, antenna: u8);

    #[cfg(feature = "direction-finding")]
    fn configure_cte(&mut self, setup: &CteSetup);

    /// Copies captured IQ samples of the last packet and returns how many the
    /// radio stored.
    #[cfg(feature = "direction-finding")]
    fn read_iq_samples(&mut self, buf: &mut [u32]) -> usize;
}

/// Error raised by [`configure_session`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// PHY not compiled in, or the power level is not valid on it.
    UnsupportedCombination,
}

/// Resets the radio and programs a full session.
pub fn configure_session<R: Radio + ?Sized>(radio: &mut R, session: &SessionConfig) -> Result<(), Error> {
    if !session.phy.is_compiled_in() || !radio.supports(session.phy, session.tx_power) {
        return Err(Error::UnsupportedCombination);
    }

    radio.disable();
    radio.configure(session);
    Ok(())
}

/// Radio frequency in MHz for a DTM channel.
pub const fn channel_frequency(channel: u8) -> u16 {
    2402 + 2 * channel as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phy_parameter_ranges() {
        assert_eq!(Phy::from_setup_param(0x03), None);
        assert_eq!(Phy::from_setup_param(0x04), Some(Phy::Le1M));
        assert_eq!(Phy::from_setup_param(0x0B), Some(Phy::Le2M));
        assert_eq!(Phy::from_setup_param(0x0C), Some(Phy::LeCodedS8));
        assert_eq!(Phy::from_setup_param(0x13), Some(Phy::LeCodedS2));
        assert_eq!(Phy::from_setup_param(0x14), None);
    }

    #[test]
    fn coded_session_reserves_ci_and_term() {
        let coded = SessionConfig::new(Phy::LeCodedS2, 0, 0x7176_4129, false);
        assert_eq!(coded.preamble, Preamble::LongRange);
        assert_eq!(coded.format.ci_len, 2);
        assert_eq!(coded.format.term_len, 3);

        let plain = SessionConfig::new(Phy::Le2M, 0, 0x7176_4129, true);
        assert_eq!(plain.preamble, Preamble::Bits16);
        assert_eq!(plain.format.ci_len, 0);
        assert_eq!(plain.format.s1_len, 8);
        assert_eq!(plain.crc, CrcConfig::BLE);
    }

    #[test]
    fn channel_to_mhz() {
        assert_eq!(channel_frequency(0), 2402);
        assert_eq!(channel_frequency(39), 2480);
    }
}
