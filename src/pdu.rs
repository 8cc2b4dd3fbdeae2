//! Test packet synthesis and validation.
//!
//! A DTM PDU is a 2-byte header (type nibble + CTE-present flag, length),
//! an optional CTEInfo byte, and up to 255 payload bytes.

use crate::radio::Phy;

/// Header, optional CTEInfo byte and a maximal payload.
pub const PDU_CAPACITY: usize = 258;
pub const MAX_PAYLOAD_LEN: usize = 255;

const HEADER_OFFSET: usize = 0;
const LENGTH_OFFSET: usize = 1;
const CTEINFO_OFFSET: usize = 2;
pub const HEADER_LEN: usize = 2;
pub const HEADER_WITH_CTE_LEN: usize = 3;

/// CTE-present flag in the header byte.
const CP_BIT: u8 = 0x20;
const TYPE_MASK: u8 = 0x0F;
/// CTEInfo bit 5 is reserved for future use.
const CTEINFO_MASK: u8 = 0xDF;

const PRBS9_LEN: usize = 255;

/// The PRBS9 reference payload: x^9 + x^5 + 1 seeded with all ones, each
/// byte sent LSB first.
pub static PRBS9: [u8; PRBS9_LEN] = prbs9();

const fn prbs9() -> [u8; PRBS9_LEN] {
    let mut out = [0u8; PRBS9_LEN];
    let mut state: u16 = 0x1FF;
    let mut i = 0;
    while i < PRBS9_LEN {
        let mut byte = 0u8;
        let mut bit = 0;
        while bit < 8 {
            byte |= ((state & 1) as u8) << bit;
            let feedback = (state ^ (state >> 4)) & 1;
            state = (state >> 1) | (feedback << 8);
            bit += 1;
        }
        out[i] = byte;
        i += 1;
    }
    out
}

/// Payload pattern of a standard test packet.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    Prbs9,
    Repeated0F,
    Repeated55,
    /// Only valid on coded PHYs.
    RepeatedFF,
}

impl Pattern {
    /// PDU type nibble in the packet header.
    pub const fn pdu_type(self) -> u8 {
        match self {
            Self::Prbs9 => 0x00,
            Self::Repeated0F => 0x01,
            Self::Repeated55 => 0x02,
            Self::RepeatedFF => 0x04,
        }
    }

    const fn from_pdu_type(ty: u8) -> Option<Self> {
        match ty {
            0x00 => Some(Self::Prbs9),
            0x01 => Some(Self::Repeated0F),
            0x02 => Some(Self::Repeated55),
            0x04 => Some(Self::RepeatedFF),
            _ => None,
        }
    }

    /// Fill byte of the repeated patterns.
    pub const fn fill(self) -> Option<u8> {
        match self {
            Self::Prbs9 => None,
            Self::Repeated0F => Some(0x0F),
            Self::Repeated55 => Some(0x55),
            Self::RepeatedFF => Some(0xFF),
        }
    }

    /// Expected payload byte at `index`.
    pub fn byte_at(self, index: usize) -> u8 {
        match self.fill() {
            Some(fill) => fill,
            None => PRBS9[index % PRBS9_LEN],
        }
    }
}

/// Packet type of the current test.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketType {
    #[default]
    Prbs9,
    Pattern0F,
    Pattern55,
    PatternFF,
    /// The length and channel fields carry a vendor command instead.
    VendorSpecific,
}

impl PacketType {
    pub const fn pattern(self) -> Option<Pattern> {
        match self {
            Self::Prbs9 => Some(Pattern::Prbs9),
            Self::Pattern0F => Some(Pattern::Repeated0F),
            Self::Pattern55 => Some(Pattern::Repeated55),
            Self::PatternFF => Some(Pattern::RepeatedFF),
            Self::VendorSpecific => None,
        }
    }
}

/// What a received packet's constant tone extension must look like.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CteCheck {
    /// Configured CTEInfo byte.
    pub info: u8,
    pub expected_samples: usize,
    /// IQ samples the radio actually captured.
    pub received_samples: usize,
}

/// Packet buffer shared by transmit and receive.
#[derive(Clone)]
pub struct Pdu {
    content: [u8; PDU_CAPACITY],
}

impl Default for Pdu {
    fn default() -> Self {
        Self::new()
    }
}

impl Pdu {
    pub const fn new() -> Self {
        Self {
            content: [0; PDU_CAPACITY],
        }
    }

    pub fn clear(&mut self) {
        self.content.fill(0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.content
    }

    pub fn header(&self) -> u8 {
        self.content[HEADER_OFFSET]
    }

    pub fn payload_len(&self) -> u8 {
        self.content[LENGTH_OFFSET]
    }

    /// Writes header and payload for a transmit test. With `cte_info` set the
    /// header carries the CTE-present flag and a CTEInfo byte.
    pub fn build(&mut self, pattern: Pattern, length: u8, cte_info: Option<u8>) {
        let header_len = header_len(cte_info.is_some());

        self.content[HEADER_OFFSET] = pattern.pdu_type();
        self.content[LENGTH_OFFSET] = length;
        if let Some(info) = cte_info {
            self.content[HEADER_OFFSET] |= CP_BIT;
            self.content[CTEINFO_OFFSET] = info;
        }

        let payload = &mut self.content[header_len..header_len + length as usize];
        for (i, b) in payload.iter_mut().enumerate() {
            *b = pattern.byte_at(i);
        }
    }

    /// Checks a received packet against the standard patterns allowed on
    /// `phy`, and its CTE when one is configured.
    pub fn validate(&self, phy: Phy, cte: Option<&CteCheck>) -> bool {
        let ty = self.header() & TYPE_MASK;
        let length = self.payload_len() as usize;
        let header_len = header_len(cte.is_some());

        let max_type = if phy.is_coded() {
            Pattern::RepeatedFF.pdu_type()
        } else {
            Pattern::Repeated55.pdu_type()
        };
        if ty > max_type {
            return false;
        }
        let Some(pattern) = Pattern::from_pdu_type(ty) else {
            return false;
        };

        let payload = &self.content[header_len..header_len + length];
        if !payload.iter().enumerate().all(|(i, &b)| b == pattern.byte_at(i)) {
            return false;
        }

        match cte {
            Some(check) => {
                let info = self.content[CTEINFO_OFFSET];
                (info & CTEINFO_MASK) == (check.info & CTEINFO_MASK)
                    && check.received_samples == check.expected_samples
            }
            None => true,
        }
    }
}

const fn header_len(with_cte: bool) -> usize {
    if with_cte {
        HEADER_WITH_CTE_LEN
    } else {
        HEADER_LEN
    }
}
