//! Packet interval computation and the transmit trigger.
//!
//! The interval timer's compare event is routed straight to the radio's
//! transmit-enable task, so packets leave on the 625 µs grid without software
//! in the loop. The engine only reprograms the period and (dis)connects the
//! route.

use crate::radio::Phy;
use crate::soc::HwError;

/// Slot length; also the owner polling cadence.
pub const SLOT_US: u32 = 625;

/// Time a packet must be preceded by before the next one may start.
const INTER_PACKET_GAP_US: u32 = 249;

/// Duration of one CTE length unit.
pub const CTE_UNIT_US: u32 = 8;

/// Events surfaced by the trigger hardware.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerEvent {
    /// Packet interval comparator rolled over.
    TxInterval,
    /// One owner tick elapsed.
    Tick,
}

/// Periodic comparator plus the event route to the radio.
pub trait Trigger {
    /// Allocates the timer and routing channel and starts ticking every
    /// `tick_us`.
    fn init(&mut self, tick_us: u32) -> Result<(), HwError>;

    /// Sets the packet interval comparator.
    fn set_period(&mut self, us: u32);

    /// Routes the comparator event to the radio transmit task.
    fn connect(&mut self);

    fn disconnect(&mut self);

    /// Returns and clears the next pending timer event.
    fn poll(&mut self) -> Option<TimerEvent>;
}

/// Transmit period for a `payload_len` byte packet, rounded up to whole
/// slots. `cte_len` is the CTE length in 8 µs units, if one is appended.
pub const fn packet_interval_us(phy: Phy, payload_len: u8, cte_len: Option<u8>) -> u32 {
    // bits on air equal µs at 1 Mbit/s
    let mut air_us = payload_len as u32 * 8 * phy.coding_factor() + phy.overhead_bits();
    if matches!(phy, Phy::Le2M) {
        air_us /= 2;
    }

    if let Some(len) = cte_len {
        air_us += phy.byte_time_us() + len as u32 * CTE_UNIT_US;
    }

    (air_us + INTER_PACKET_GAP_US).div_ceil(SLOT_US) * SLOT_US
}

/// Programs the period for the next transmit test and wires the trigger.
pub(crate) fn arm<T: Trigger + ?Sized>(trigger: &mut T, interval_us: u32) {
    trigger.set_period(interval_us);
    trigger.connect();
}
