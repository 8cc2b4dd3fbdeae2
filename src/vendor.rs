//! Vendor-specific DTM commands.
//!
//! A transmitter command with packet selector 3 on an uncoded PHY carries a
//! vendor command: the length field holds the command code and the channel
//! field a 6-bit option. A few commands are served locally; the rest read or
//! write one byte through a board [`Diagnostics`] implementation.

/// Vendor command codes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum VendorCommand {
    CarrierTest = 0x00,
    /// Carrier test as issued by nRFgo Studio.
    CarrierTestStudio = 0x01,
    SetTxPower = 0x02,
    FemAntennaSelect = 0x03,
    FemGainSet = 0x04,
    FemActiveDelaySet = 0x05,
    Bme680Status = 0x06,
    Ft5336Status = 0x07,
    Gt24c256cStatus = 0x08,
    Lis3dhStatus = 0x09,
    DeviceAddressByte5 = 0x0A,
    DeviceAddressByte4 = 0x0B,
    DeviceAddressByte3 = 0x0C,
    DeviceAddressByte2 = 0x0D,
    DeviceAddressByte1 = 0x0E,
    DeviceAddressByte0 = 0x0F,
    RegulatorHighControl = 0x10,
    RegulatorHighReadback = 0x11,
    RegulatorMainControl = 0x12,
    RegulatorMainReadback = 0x13,
    RegulatorRadioControl = 0x14,
    RegulatorRadioReadback = 0x15,
    Capacitor32kControl = 0x16,
    Capacitor32kReadback = 0x17,
    Capacitor32mControl = 0x18,
    Capacitor32mReadback = 0x19,
    RadioHighVoltageControl = 0x1A,
    RadioHighVoltageReadback = 0x1B,
    VregHvOutControl = 0x1C,
    VregHvOutReadback = 0x1D,
    HfclkSrcControl = 0x1E,
    HfclkSrcReadback = 0x1F,
    LfclkSrcControl = 0x20,
    LfclkSrcReadback = 0x21,
    HfclkCtrlControl = 0x22,
    HfclkCtrlReadback = 0x23,
    HfclkAlwaysRunControl = 0x24,
    HfclkAlwaysRunReadback = 0x25,
    HfclkAudioAlwaysRunControl = 0x26,
    HfclkAudioAlwaysRunReadback = 0x27,
    Hfclk192mSrcControl = 0x28,
    Hfclk192mSrcReadback = 0x29,
    Hfclk192mAlwaysRunControl = 0x2A,
    Hfclk192mAlwaysRunReadback = 0x2B,
    Hfclk192mCtrlControl = 0x2C,
    Hfclk192mCtrlReadback = 0x2D,
    LfclkStatus = 0x2E,
    HfclkStatus = 0x2F,
    QspiControl = 0x30,
    Mx25r6435Status = 0x31,
    SpiControl = 0x32,
    Enc424j600Status = 0x33,
    I2cControl = 0x34,
    Ili9340Status = 0x35,
    NfcControl = 0x36,
    NfcStatus = 0x37,
    GpioSetAsOutput = 0x38,
    GpioSetAsInput = 0x39,
    GpioSetHigh = 0x3A,
    GpioSetLow = 0x3B,
    GpioGetInput = 0x3C,
    Mcp4725Status = 0x3D,
    Mcp7904nStatus = 0x3E,
    Tca9538Status = 0x3F,
}

impl VendorCommand {
    pub const fn from_code(code: u8) -> Option<Self> {
        use VendorCommand::*;
        Some(match code {
            0x00 => CarrierTest,
            0x01 => CarrierTestStudio,
            0x02 => SetTxPower,
            0x03 => FemAntennaSelect,
            0x04 => FemGainSet,
            0x05 => FemActiveDelaySet,
            0x06 => Bme680Status,
            0x07 => Ft5336Status,
            0x08 => Gt24c256cStatus,
            0x09 => Lis3dhStatus,
            0x0A => DeviceAddressByte5,
            0x0B => DeviceAddressByte4,
            0x0C => DeviceAddressByte3,
            0x0D => DeviceAddressByte2,
            0x0E => DeviceAddressByte1,
            0x0F => DeviceAddressByte0,
            0x10 => RegulatorHighControl,
            0x11 => RegulatorHighReadback,
            0x12 => RegulatorMainControl,
            0x13 => RegulatorMainReadback,
            0x14 => RegulatorRadioControl,
            0x15 => RegulatorRadioReadback,
            0x16 => Capacitor32kControl,
            0x17 => Capacitor32kReadback,
            0x18 => Capacitor32mControl,
            0x19 => Capacitor32mReadback,
            0x1A => RadioHighVoltageControl,
            0x1B => RadioHighVoltageReadback,
            0x1C => VregHvOutControl,
            0x1D => VregHvOutReadback,
            0x1E => HfclkSrcControl,
            0x1F => HfclkSrcReadback,
            0x20 => LfclkSrcControl,
            0x21 => LfclkSrcReadback,
            0x22 => HfclkCtrlControl,
            0x23 => HfclkCtrlReadback,
            0x24 => HfclkAlwaysRunControl,
            0x25 => HfclkAlwaysRunReadback,
            0x26 => HfclkAudioAlwaysRunControl,
            0x27 => HfclkAudioAlwaysRunReadback,
            0x28 => Hfclk192mSrcControl,
            0x29 => Hfclk192mSrcReadback,
            0x2A => Hfclk192mAlwaysRunControl,
            0x2B => Hfclk192mAlwaysRunReadback,
            0x2C => Hfclk192mCtrlControl,
            0x2D => Hfclk192mCtrlReadback,
            0x2E => LfclkStatus,
            0x2F => HfclkStatus,
            0x30 => QspiControl,
            0x31 => Mx25r6435Status,
            0x32 => SpiControl,
            0x33 => Enc424j600Status,
            0x34 => I2cControl,
            0x35 => Ili9340Status,
            0x36 => NfcControl,
            0x37 => NfcStatus,
            0x38 => GpioSetAsOutput,
            0x39 => GpioSetAsInput,
            0x3A => GpioSetHigh,
            0x3B => GpioSetLow,
            0x3C => GpioGetInput,
            0x3D => Mcp4725Status,
            0x3E => Mcp7904nStatus,
            0x3F => Tca9538Status,
            _ => return None,
        })
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// How the engine serves this command.
    pub const fn operation(self) -> Operation {
        use VendorCommand::*;
        let id = DiagnosticId(self);
        match self {
            CarrierTest | CarrierTestStudio => Operation::Carrier,
            SetTxPower => Operation::SetTxPower,
            // no front-end module on this board
            FemAntennaSelect | FemGainSet | FemActiveDelaySet => Operation::Unsupported,
            DeviceAddressByte5 => Operation::DeviceAddress(5),
            DeviceAddressByte4 => Operation::DeviceAddress(4),
            DeviceAddressByte3 => Operation::DeviceAddress(3),
            DeviceAddressByte2 => Operation::DeviceAddress(2),
            DeviceAddressByte1 => Operation::DeviceAddress(1),
            DeviceAddressByte0 => Operation::DeviceAddress(0),
            RadioHighVoltageControl => Operation::SetRadioHighVoltage,
            RadioHighVoltageReadback => Operation::RadioHighVoltage,
            HfclkCtrlReadback => Operation::HfclkCtrl,
            HfclkAlwaysRunReadback => Operation::HfclkAlwaysRun,
            RegulatorHighControl
            | RegulatorMainControl
            | RegulatorRadioControl
            | Capacitor32kControl
            | Capacitor32mControl
            | VregHvOutControl
            | HfclkSrcControl
            | LfclkSrcControl
            | HfclkCtrlControl
            | HfclkAlwaysRunControl
            | HfclkAudioAlwaysRunControl
            | Hfclk192mSrcControl
            | Hfclk192mAlwaysRunControl
            | Hfclk192mCtrlControl
            | QspiControl
            | SpiControl
            | I2cControl
            | NfcControl
            | GpioSetAsOutput
            | GpioSetAsInput
            | GpioSetHigh
            | GpioSetLow => Operation::Write(id),
            GpioGetInput => Operation::WriteRead(id),
            Bme680Status
            | Ft5336Status
            | Gt24c256cStatus
            | Lis3dhStatus
            | RegulatorHighReadback
            | RegulatorMainReadback
            | RegulatorRadioReadback
            | Capacitor32kReadback
            | Capacitor32mReadback
            | VregHvOutReadback
            | HfclkSrcReadback
            | LfclkSrcReadback
            | HfclkAudioAlwaysRunReadback
            | Hfclk192mSrcReadback
            | Hfclk192mAlwaysRunReadback
            | Hfclk192mCtrlReadback
            | LfclkStatus
            | HfclkStatus
            | Mx25r6435Status
            | Enc424j600Status
            | Ili9340Status
            | NfcStatus
            | Mcp4725Status
            | Mcp7904nStatus
            | Tca9538Status => Operation::Read(id),
        }
    }
}

/// Identifies a delegated diagnostic. Only produced by the vendor table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiagnosticId(VendorCommand);

impl DiagnosticId {
    pub const fn command(self) -> VendorCommand {
        self.0
    }

    pub const fn raw(self) -> u8 {
        self.0 as u8
    }
}

/// Resolved vendor command.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    /// Unmodulated carrier on the channel given by the option.
    Carrier,
    SetTxPower,
    Unsupported,
    /// Device address byte, 0 being the most significant.
    DeviceAddress(u8),
    SetRadioHighVoltage,
    RadioHighVoltage,
    HfclkCtrl,
    HfclkAlwaysRun,
    /// Write the option byte.
    Write(DiagnosticId),
    Read(DiagnosticId),
    /// Write the option byte, then read the answer.
    WriteRead(DiagnosticId),
}

/// Board diagnostics reachable through vendor commands. All calls block
/// until the diagnostic answered.
pub trait Diagnostics {
    type Error;

    fn write_byte(&mut self, value: u8, id: DiagnosticId) -> Result<(), Self::Error>;

    fn read_byte(&mut self, id: DiagnosticId) -> Result<u8, Self::Error>;

    fn write_then_read_byte(&mut self, value: u8, id: DiagnosticId) -> Result<u8, Self::Error>;
}

/// For boards without delegated diagnostics: every call fails.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoDiagnostics;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Unavailable;

impl Diagnostics for NoDiagnostics {
    type Error = Unavailable;

    fn write_byte(&mut self, _value: u8, _id: DiagnosticId) -> Result<(), Unavailable> {
        Err(Unavailable)
    }

    fn read_byte(&mut self, _id: DiagnosticId) -> Result<u8, Unavailable> {
        Err(Unavailable)
    }

    fn write_then_read_byte(&mut self, _value: u8, _id: DiagnosticId) -> Result<u8, Unavailable> {
        Err(Unavailable)
    }
}

/// Decodes the 6-bit TX power option. Negative levels have bit 5 or 4 set,
/// so those restore the two dropped sign bits.
pub const fn tx_power_from_option(option: u8) -> i8 {
    let option = option & 0x3F;
    if option & 0x30 != 0 {
        (option | 0xC0) as i8
    } else {
        option as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_code() {
        for code in 0..=0x3F {
            let cmd = VendorCommand::from_code(code).unwrap();
            assert_eq!(cmd.code(), code);
        }
        assert_eq!(VendorCommand::from_code(0x40), None);
    }

    #[test]
    fn local_and_delegated_split() {
        assert_eq!(VendorCommand::CarrierTestStudio.operation(), Operation::Carrier);
        assert_eq!(VendorCommand::FemGainSet.operation(), Operation::Unsupported);
        assert_eq!(VendorCommand::DeviceAddressByte0.operation(), Operation::DeviceAddress(0));
        assert_eq!(VendorCommand::HfclkCtrlReadback.operation(), Operation::HfclkCtrl);

        match VendorCommand::HfclkCtrlControl.operation() {
            Operation::Write(id) => assert_eq!(id.raw(), 0x22),
            other => panic!("unexpected {other:?}"),
        }
        match VendorCommand::GpioGetInput.operation() {
            Operation::WriteRead(id) => assert_eq!(id.command(), VendorCommand::GpioGetInput),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(VendorCommand::Tca9538Status.operation(), Operation::Read(_)));
    }

    #[test]
    fn delegated_ids_match_codes() {
        for code in 0..=0x3F {
            let cmd = VendorCommand::from_code(code).unwrap();
            match cmd.operation() {
                Operation::Write(id) | Operation::Read(id) | Operation::WriteRead(id) => {
                    assert_eq!(id.raw(), code)
                }
                _ => {}
            }
        }
    }

    #[test]
    fn tx_power_option_sign() {
        assert_eq!(tx_power_from_option(0x00), 0);
        assert_eq!(tx_power_from_option(0x04), 4);
        // -4 dBm = 0xFC, sent as 0x3C
        assert_eq!(tx_power_from_option(0x3C), -4);
        // -40 dBm = 0xD8, sent as 0x18
        assert_eq!(tx_power_from_option(0x18), -40);
    }
}
