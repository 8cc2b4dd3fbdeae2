//! DTM command and event words.
//!
//! A command is one 16-bit word, sent MSB first over the two-wire link:
//!
//! ```text
//!  15 14 | 13 ..  8 | 7 .. 2 | 1 0
//!  class | channel  | length | packet     (receiver / transmitter)
//!  class | control  |   parameter         (setup)
//! ```

/// Packet payload selector carried in bits 1..0 of receiver/transmitter
/// commands.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PacketSelector {
    Prbs9 = 0,
    Pattern0F = 1,
    Pattern55 = 2,
    /// `0xFF` pattern on coded PHYs, vendor-specific command otherwise.
    PatternFfOrVendor = 3,
}

impl PacketSelector {
    const fn from_bits(bits: u16) -> Self {
        match bits & 0x03 {
            0 => Self::Prbs9,
            1 => Self::Pattern0F,
            2 => Self::Pattern55,
            _ => Self::PatternFfOrVendor,
        }
    }
}

/// A decoded command word.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Setup {
        control: u8,
        parameter: u8,
    },
    ReceiverTest {
        channel: u8,
        length: u8,
        packet: PacketSelector,
    },
    TransmitterTest {
        channel: u8,
        length: u8,
        packet: PacketSelector,
    },
    End,
}

impl Command {
    const SETUP: u16 = 0;
    const RECEIVER: u16 = 1;
    const TRANSMITTER: u16 = 2;
    const END: u16 = 3;

    pub const fn decode(word: u16) -> Self {
        let class = (word >> 14) & 0x03;
        let field = ((word >> 8) & 0x3F) as u8;
        let length = ((word >> 2) & 0x3F) as u8;
        let packet = PacketSelector::from_bits(word);

        match class {
            Self::SETUP => Self::Setup {
                control: field,
                parameter: word as u8,
            },
            Self::RECEIVER => Self::ReceiverTest {
                channel: field,
                length,
                packet,
            },
            Self::TRANSMITTER => Self::TransmitterTest {
                channel: field,
                length,
                packet,
            },
            _ => Self::End,
        }
    }

    /// Packs the command back into a word. Fields wider than their slot are
    /// truncated.
    pub const fn encode(&self) -> u16 {
        match *self {
            Self::Setup { control, parameter } => {
                (Self::SETUP << 14) | (((control & 0x3F) as u16) << 8) | parameter as u16
            }
            Self::ReceiverTest {
                channel,
                length,
                packet,
            } => Self::encode_test(Self::RECEIVER, channel, length, packet),
            Self::TransmitterTest {
                channel,
                length,
                packet,
            } => Self::encode_test(Self::TRANSMITTER, channel, length, packet),
            Self::End => Self::END << 14,
        }
    }

    const fn encode_test(class: u16, channel: u8, length: u8, packet: PacketSelector) -> u16 {
        (class << 14) | (((channel & 0x3F) as u16) << 8) | (((length & 0x3F) as u16) << 2) | packet as u16
    }
}

impl From<u16> for Command {
    fn from(word: u16) -> Self {
        Self::decode(word)
    }
}

/// Setup control codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SetupControl {
    Reset = 0x00,
    SetUpperLengthBits = 0x01,
    SetPhy = 0x02,
    SelectModulation = 0x03,
    ReadSupportedFeatures = 0x04,
    ReadMaximumValues = 0x05,
    ConstantToneExtension = 0x06,
    ConstantToneExtensionSlot = 0x07,
    AntennaArray = 0x08,
    TransmitPower = 0x09,
}

impl TryFrom<u8> for SetupControl {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::Reset,
            0x01 => Self::SetUpperLengthBits,
            0x02 => Self::SetPhy,
            0x03 => Self::SelectModulation,
            0x04 => Self::ReadSupportedFeatures,
            0x05 => Self::ReadMaximumValues,
            0x06 => Self::ConstantToneExtension,
            0x07 => Self::ConstantToneExtensionSlot,
            0x08 => Self::AntennaArray,
            0x09 => Self::TransmitPower,
            other => return Err(other),
        })
    }
}

/// A response word.
///
/// With bit 15 set the low 15 bits are a received packet count. Otherwise bit
/// 0 is the error flag and bits 14..1 carry response data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event(u16);

impl Event {
    pub const SUCCESS: Self = Self(0x0000);
    pub const ERROR: Self = Self(0x0001);

    const PACKET_REPORT: u16 = 0x8000;
    const DATA_MASK: u16 = 0x7FFE;

    pub const fn success(data: u16) -> Self {
        Self((data << 1) & Self::DATA_MASK)
    }

    pub const fn error(data: u16) -> Self {
        Self(((data << 1) & Self::DATA_MASK) | Self::ERROR.0)
    }

    pub const fn packet_report(count: u16) -> Self {
        Self(Self::PACKET_REPORT | (count & 0x7FFF))
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    pub const fn is_packet_report(self) -> bool {
        self.0 & Self::PACKET_REPORT != 0
    }

    pub const fn is_error(self) -> bool {
        !self.is_packet_report() && self.0 & Self::ERROR.0 != 0
    }

    /// Response data, `None` for packet reports.
    pub const fn data(self) -> Option<u16> {
        if self.is_packet_report() {
            None
        } else {
            Some((self.0 & Self::DATA_MASK) >> 1)
        }
    }

    pub const fn packet_count(self) -> Option<u16> {
        if self.is_packet_report() {
            Some(self.0 & 0x7FFF)
        } else {
            None
        }
    }

    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<Event> for u16 {
    fn from(event: Event) -> Self {
        event.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_transmitter_fields() {
        // class 2, channel 19, length 37, 0x55
        let word = (2 << 14) | (19 << 8) | (37 << 2) | 2;
        assert_eq!(
            Command::decode(word),
            Command::TransmitterTest {
                channel: 19,
                length: 37,
                packet: PacketSelector::Pattern55,
            }
        );
        assert_eq!(Command::decode(word).encode(), word);
    }

    #[test]
    fn decodes_setup_and_end() {
        assert_eq!(
            Command::decode(0x0209),
            Command::Setup {
                control: 0x02,
                parameter: 0x09,
            }
        );
        assert_eq!(Command::decode(0xC000), Command::End);
        // End ignores its payload bits
        assert_eq!(Command::decode(0xFFFF), Command::End);
    }

    #[test]
    fn receiver_ignores_top_channel_bits() {
        let cmd = Command::ReceiverTest {
            channel: 0xFF,
            length: 0x3F,
            packet: PacketSelector::PatternFfOrVendor,
        };
        assert_eq!(cmd.encode(), 0x7FFF);
    }

    #[test]
    fn setup_control_codes() {
        assert_eq!(SetupControl::try_from(0x09), Ok(SetupControl::TransmitPower));
        assert_eq!(SetupControl::try_from(0x0A), Err(0x0A));
    }

    #[test]
    fn event_framing() {
        assert_eq!(Event::success(0).raw(), 0x0000);
        assert_eq!(Event::error(0).raw(), 0x0001);
        assert_eq!(Event::success(0xFF).raw(), 0x01FE);
        assert_eq!(Event::success(0xFF).data(), Some(0xFF));
        assert!(Event::error(3).is_error());
        assert_eq!(Event::error(3).data(), Some(3));

        let report = Event::packet_report(1234);
        assert_eq!(report.raw(), 0x8000 | 1234);
        assert!(report.is_packet_report());
        assert!(!report.is_error());
        assert_eq!(report.packet_count(), Some(1234));
        assert_eq!(report.data(), None);
        assert_eq!(Event::packet_report(0xFFFF).packet_count(), Some(0x7FFF));
    }

    #[test]
    fn data_never_reaches_report_bit() {
        assert!(!Event::success(0xFFFF).is_packet_report());
        assert_eq!(Event::success(0xFFFF).raw(), 0x7FFE);
    }
}
