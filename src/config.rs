//! Board-dependent engine configuration.

/// Transmit power levels of the SiFli BLE radio, in dBm, ascending.
pub const DEFAULT_TX_POWER_LEVELS: &[i8] = &[-40, -20, -16, -12, -8, -7, -6, -5, -4, -3, -2, -1, 0];

/// Access address used by every DTM packet.
pub const DTM_ACCESS_ADDRESS: u32 = 0x7176_4129;

/// Engine configuration passed to [`Dtm::new`](crate::Dtm::new).
#[non_exhaustive]
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Supported transmit power levels in dBm. Must be non-empty and ascending.
    pub tx_power_levels: &'static [i8],
    /// Transmit power applied after init and reset.
    pub default_tx_power: i8,
    /// Largest payload accepted for non-vendor packets, also reported as
    /// supportedMaxTxOctets/supportedMaxRxOctets.
    pub max_payload_octets: u8,
    /// Reported as supportedMaxTxTime/supportedMaxRxTime, in µs.
    pub max_rx_tx_time: u16,
    pub access_address: u32,
    /// Number of antennas wired to the switch pins.
    #[cfg(feature = "direction-finding")]
    pub antenna_count: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tx_power_levels: DEFAULT_TX_POWER_LEVELS,
            default_tx_power: 0,
            max_payload_octets: 0xFF,
            max_rx_tx_time: 0x0424,
            access_address: DTM_ACCESS_ADDRESS,
            #[cfg(feature = "direction-finding")]
            antenna_count: 12,
        }
    }
}

impl Config {
    pub(crate) fn min_tx_power(&self) -> i8 {
        self.tx_power_levels.first().copied().unwrap_or(0)
    }

    pub(crate) fn max_tx_power(&self) -> i8 {
        self.tx_power_levels.last().copied().unwrap_or(0)
    }

    /// Nearest supported level to `dbm`, clamped to the table. Ties go to the
    /// lower level.
    pub(crate) fn nearest_tx_power(&self, dbm: i8) -> i8 {
        let levels = self.tx_power_levels;
        if dbm <= self.min_tx_power() {
            return self.min_tx_power();
        }
        if dbm >= self.max_tx_power() {
            return self.max_tx_power();
        }

        for pair in levels.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if hi > dbm {
                let to_hi = (hi as i16 - dbm as i16).abs();
                let to_lo = (lo as i16 - dbm as i16).abs();
                return if to_hi < to_lo { hi } else { lo };
            }
        }
        self.max_tx_power()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_level_clamps_and_rounds() {
        let config = Config::default();
        assert_eq!(config.nearest_tx_power(-100), -40);
        assert_eq!(config.nearest_tx_power(15), 0);
        assert_eq!(config.nearest_tx_power(-5), -5);
        // -30 is equidistant from -40 and -20
        assert_eq!(config.nearest_tx_power(-30), -40);
        assert_eq!(config.nearest_tx_power(-29), -20);
        assert_eq!(config.nearest_tx_power(-18), -20);
    }
}
