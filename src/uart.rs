//! Two-wire UART transport.
//!
//! Command words arrive as two bytes, MSB first. If the second byte comes
//! more than [`BYTE_TIMEOUT_TICKS`] after the first, the first is dropped and
//! the late byte starts a new word. Events go back the same way, MSB first.

use embedded_hal_nb::serial::{Read, Write};

use crate::dtm::Dtm;
use crate::soc::Hardware;
use crate::timing::SLOT_US;
use crate::vendor::Diagnostics;

/// Longest gap allowed between the two bytes of a command.
pub const BYTE_TIMEOUT_US: u32 = 5000;

/// [`BYTE_TIMEOUT_US`] in 625 µs ticks, with two ticks of slack.
pub const BYTE_TIMEOUT_TICKS: u32 = (BYTE_TIMEOUT_US + 2 * SLOT_US) / SLOT_US;

/// Pairs received bytes into command words.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandAssembler {
    msb: Option<(u8, u32)>,
}

impl CommandAssembler {
    pub const fn new() -> Self {
        Self { msb: None }
    }

    /// Feeds one byte received at tick `now`. Returns a word once both halves
    /// are in.
    pub fn push(&mut self, byte: u8, now: u32) -> Option<u16> {
        match self.msb.take() {
            Some((msb, at)) if now.wrapping_sub(at) <= BYTE_TIMEOUT_TICKS => Some(u16::from_be_bytes([msb, byte])),
            stale => {
                if let Some((msb, _)) = stale {
                    trace!("dropping stale command byte {:02x}", msb);
                }
                self.msb = Some((byte, now));
                None
            }
        }
    }

    /// Whether a first byte is waiting for its partner.
    pub fn is_pending(&self) -> bool {
        self.msb.is_some()
    }

    pub fn reset(&mut self) {
        self.msb = None;
    }
}

/// Drives a [`Dtm`] from a serial port.
pub struct DtmUart<S> {
    serial: S,
    assembler: CommandAssembler,
}

impl<S: Read<u8> + Write<u8>> DtmUart<S> {
    pub fn new(serial: S) -> Self {
        Self {
            serial,
            assembler: CommandAssembler::new(),
        }
    }

    pub fn free(self) -> S {
        self.serial
    }

    /// Runs one pass of the DTM loop: wait for the next tick, take at most one
    /// byte and answer a completed command.
    ///
    /// Command rejections are answered on the wire and do not fail this call.
    /// Only serial errors are returned; a read error also drops any half
    /// received command.
    pub fn poll<H: Hardware, D: Diagnostics>(&mut self, dtm: &mut Dtm<H, D>) -> Result<(), S::Error> {
        let now = dtm.poll_tick();

        let byte = match self.serial.read() {
            Ok(byte) => byte,
            Err(nb::Error::WouldBlock) => return Ok(()),
            Err(nb::Error::Other(e)) => {
                error!("DTM UART read failed");
                self.assembler.reset();
                return Err(e);
            }
        };

        let Some(word) = self.assembler.push(byte, now) else {
            return Ok(());
        };

        // the outcome is carried by the event
        let _ = dtm.submit_command(word);

        if let Some(event) = dtm.take_event() {
            for byte in event.to_be_bytes() {
                if let Err(e) = nb::block!(self.serial.write(byte)) {
                    error!("DTM UART write failed");
                    return Err(e);
                }
            }
        }
        Ok(())
    }
}
