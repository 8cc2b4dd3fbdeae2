//! Constant Tone Extension (direction finding) parameters.
//!
//! The Setup commands only stage parameters here; the engine applies them to
//! the radio when a test starts.

/// IQ sample buffer size in 32-bit words.
pub const IQ_CAPACITY: usize = 128;

/// Samples taken during the 8 µs reference period.
const REFERENCE_SAMPLES: usize = 8;

pub const MIN_LENGTH: u8 = 0x02;
/// Also reported by Setup ReadMaximumValues.
pub const MAX_LENGTH: u8 = 0x14;
const MAX_ANTENNAS: u8 = 0x4B;

const LENGTH_MASK: u8 = 0x1F;
const TYPE_SHIFT: u8 = 6;
const ANTENNA_COUNT_MASK: u8 = 0x3F;
const MIRRORED_PATTERN_BIT: u8 = 0x80;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// CTE length outside 2..=20.
    LengthOutOfRange,
    UnknownType,
    UnknownSlot,
    /// Antenna count zero or larger than the array.
    AntennaCountOutOfRange,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CteMode {
    #[default]
    Off,
    /// Angle of arrival: the receiver switches antennas.
    AoA,
    /// Angle of departure: the transmitter switches antennas.
    AoD,
}

impl CteMode {
    /// Direction finding mode register encoding.
    pub const fn raw(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::AoD => 2,
            Self::AoA => 3,
        }
    }
}

/// Antenna switch and sample slot width.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CteSlot {
    Us1,
    #[default]
    Us2,
}

impl CteSlot {
    /// Switch spacing register encoding.
    pub const fn raw(self) -> u8 {
        match self {
            Self::Us1 => 3,
            Self::Us2 => 2,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AntennaPattern {
    /// 1, 2, .. N, 1, 2, .. N
    #[default]
    Linear,
    /// 1, 2, .. N, N-1, .. 2, 1
    Mirrored,
}

/// Staged CTE parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CteConfig {
    pub mode: CteMode,
    pub slot: CteSlot,
    pub pattern: AntennaPattern,
    /// Length in 8 µs units.
    pub length: u8,
    pub antenna_count: u8,
    /// CTEInfo byte as sent in the Setup command.
    pub info: u8,
}

impl CteConfig {
    pub const fn is_active(&self) -> bool {
        !matches!(self.mode, CteMode::Off)
    }

    /// Applies a Setup CTE parameter: bits 4..0 length, bits 7..6 type.
    pub fn with_setup(self, param: u8) -> Result<Self, Error> {
        let length = param & LENGTH_MASK;
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(Error::LengthOutOfRange);
        }

        let (mode, slot) = match param >> TYPE_SHIFT {
            0 => (CteMode::AoA, self.slot),
            1 => (CteMode::AoD, CteSlot::Us1),
            2 => (CteMode::AoD, CteSlot::Us2),
            _ => return Err(Error::UnknownType),
        };

        Ok(Self {
            mode,
            slot,
            length,
            info: param,
            ..self
        })
    }

    pub fn with_slot(self, param: u8) -> Result<Self, Error> {
        let slot = match param {
            1 => CteSlot::Us1,
            2 => CteSlot::Us2,
            _ => return Err(Error::UnknownSlot),
        };
        Ok(Self { slot, ..self })
    }

    /// Applies a Setup antenna array parameter: bits 5..0 antenna count, bit 7
    /// mirrored pattern.
    pub fn with_antennas(self, param: u8, board_antennas: u8) -> Result<Self, Error> {
        let count = param & ANTENNA_COUNT_MASK;
        if count == 0 || count > MAX_ANTENNAS || count > board_antennas {
            return Err(Error::AntennaCountOutOfRange);
        }

        let pattern = if param & MIRRORED_PATTERN_BIT != 0 {
            AntennaPattern::Mirrored
        } else {
            AntennaPattern::Linear
        };
        Ok(Self {
            antenna_count: count,
            pattern,
            ..self
        })
    }

    /// IQ samples a conforming CTE of the configured length yields.
    pub const fn expected_sample_count(&self) -> usize {
        let divisor = match self.slot {
            CteSlot::Us1 => 2,
            CteSlot::Us2 => 4,
        };
        REFERENCE_SAMPLES + (self.length as usize * 8) / divisor
    }

    /// Whether this side of the link switches antennas.
    pub const fn switches_antennas(&self, receive: bool) -> bool {
        matches!(
            (self.mode, receive),
            (CteMode::AoA, true) | (CteMode::AoD, false)
        )
    }

    pub fn switch_pattern(&self) -> SwitchPattern {
        SwitchPattern::new(self.antenna_count, self.pattern)
    }

    pub const fn setup(&self, receive: bool) -> CteSetup {
        CteSetup {
            mode: self.mode,
            slot: self.slot,
            length: self.length,
            receive,
            switching: self.switches_antennas(receive),
        }
    }
}

/// Radio-level CTE programming for one test.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CteSetup {
    pub mode: CteMode,
    pub slot: CteSlot,
    /// Length in 8 µs units, appended on transmit.
    pub length: u8,
    /// Parse CTEInfo from S1 and capture IQ samples.
    pub receive: bool,
    /// Program the switch spacing from `slot`.
    pub switching: bool,
}

/// Antenna switch sequence: antenna 1 for the guard and reference periods,
/// then the configured pattern.
#[derive(Debug, Clone)]
pub struct SwitchPattern {
    count: u8,
    mirrored: bool,
    pos: u16,
}

impl SwitchPattern {
    fn new(count: u8, pattern: AntennaPattern) -> Self {
        Self {
            count,
            mirrored: pattern == AntennaPattern::Mirrored,
            pos: 0,
        }
    }

    fn len_total(&self) -> u16 {
        let count = self.count as u16;
        let tail = if self.mirrored { count.saturating_sub(1) } else { 0 };
        2 + count + tail
    }
}

impl Iterator for SwitchPattern {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.pos >= self.len_total() {
            return None;
        }
        let pos = self.pos;
        self.pos += 1;

        let count = self.count as u16;
        let antenna = match pos {
            0 | 1 => 1,
            p if p - 2 < count => p - 2 + 1,
            p => count - 1 - (p - 2 - count),
        };
        Some(antenna as u8)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len_total().saturating_sub(self.pos) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for SwitchPattern {}

#[cfg(test)]
mod tests;
