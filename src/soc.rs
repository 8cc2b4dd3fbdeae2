//! Local SoC registers and the combined hardware bound.

use crate::radio::Radio;
use crate::timing::Trigger;

/// Hardware bring-up failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HwError {
    /// The high frequency crystal did not start.
    ClockUnavailable,
    TimerUnavailable,
    /// No free event routing channel.
    ChannelUnavailable,
}

/// Clock, identity and regulator registers next to the radio.
pub trait Soc {
    /// Starts the high frequency crystal and waits until it runs.
    fn start_hfclk(&mut self) -> Result<(), HwError>;

    /// Factory-programmed device address words, low word first.
    fn device_address(&self) -> [u32; 2];

    fn set_radio_high_voltage(&mut self, enable: bool);

    fn radio_high_voltage(&self) -> bool;

    /// Raw HF clock control register.
    fn hfclk_ctrl(&self) -> u8;

    fn hfclk_always_run(&self) -> u8;
}

/// Everything the engine drives. Implemented for any type providing all three
/// parts.
pub trait Hardware: Radio + Trigger + Soc {}

impl<T: Radio + Trigger + Soc> Hardware for T {}

/// Device address byte `index`, 0 being the most significant. The two top
/// bits of byte 0 are forced set, marking a static random address.
pub fn device_address_byte(words: [u32; 2], index: u8) -> Option<u8> {
    let byte = match index {
        5 => words[0] as u8,
        4 => (words[0] >> 8) as u8,
        3 => (words[0] >> 16) as u8,
        2 => (words[0] >> 24) as u8,
        1 => words[1] as u8,
        0 => (words[1] >> 8) as u8 | 0xC0,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_bytes() {
        let words = [0x4433_2211, 0x0000_0655];
        assert_eq!(device_address_byte(words, 5), Some(0x11));
        assert_eq!(device_address_byte(words, 2), Some(0x44));
        assert_eq!(device_address_byte(words, 1), Some(0x55));
        assert_eq!(device_address_byte(words, 0), Some(0xC6));
        assert_eq!(device_address_byte(words, 6), None);
    }
}
