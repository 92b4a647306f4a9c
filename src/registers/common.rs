//! Common registers
//!
//! This module contains the registers every LoRa session touches regardless of
//! modem settings:
//! - Operating mode and long-range (LoRa) modem selection
//! - Carrier frequency synthesizer
//! - Power amplifier selection
//! - Silicon version
//!
//! The address byte on the wire carries the access direction in bit 7, so
//! every register address here is 7 bits wide.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Bit 7 of the address byte selects write access.
pub const WRITE_BIT: u8 = 0x80;

/// Value of [`Version`] on SX1276/77/78/79 silicon.
pub const SX1276_VERSION: u8 = 0x12;

/// Crystal reference of the SX1276 synthesizer.
pub const F_XOSC_HZ: u64 = 32_000_000;

/// Error type for operating mode conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidMode(pub u8);

/// Transceiver operating mode (RegOpMode bits 2:0)
///
/// The chip is always in exactly one of these. Transitions are whatever the
/// host writes; the hardware does not reject any of them. After a packet is
/// sent the chip drops back to [`OperatingMode::Standby`] on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Lowest power. Only mode in which the LoRa bit may be changed.
    Sleep = 0x0,
    /// Crystal running, ready for FIFO access and configuration
    Standby = 0x1,
    /// Sends the packet loaded in the FIFO
    Transmit = 0x3,
    /// Listens until told otherwise, raising RxDone per packet
    ReceiveContinuous = 0x5,
}

impl OperatingMode {
    /// True while the RF front end is busy sending or listening.
    ///
    /// Frequency and modem settings must not be touched in these modes.
    pub fn is_rf_active(self) -> bool {
        matches!(self, Self::Transmit | Self::ReceiveContinuous)
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x0 => Ok(Self::Sleep),
            0x1 => Ok(Self::Standby),
            0x3 => Ok(Self::Transmit),
            0x5 => Ok(Self::ReceiveContinuous),
            invalid => Err(InvalidMode(invalid)),
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// # Important Notes
/// - `long_range_mode` selects the LoRa modem and may only change in Sleep
/// - The low-frequency port bit is left cleared; the RFM95 uses the HF port
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// LoRa modem selected (bit 7)
    pub long_range_mode: bool,
    /// Transceiver mode (bits 2:0)
    pub mode: OperatingMode,
}

impl OpMode {
    /// LoRa modem in the given mode.
    pub const fn lora(mode: OperatingMode) -> Self {
        Self {
            long_range_mode: true,
            mode,
        }
    }
}

/// Carrier frequency registers (addresses: 0x06 MSB, 0x07 MID, 0x08 LSB)
///
/// Holds the 24-bit synthesizer word `Frf = f_rf * 2^19 / F_XOSC`. The three
/// bytes are written as one burst starting at the MSB, which the chip spreads
/// over the three consecutive registers.
///
/// # Important Notes
/// - Only program in Sleep or Standby
/// - The new frequency takes effect when the LSB is written
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Frf {
    /// Synthesizer word, 24 bits used
    pub word: u32,
}

impl Frf {
    /// Synthesizer word for a carrier in Hz.
    pub fn from_hz(hz: u32) -> Self {
        Self {
            word: (((hz as u64) << 19) / F_XOSC_HZ) as u32 & 0x00FF_FFFF,
        }
    }

    /// Synthesizer word for a carrier in MHz.
    ///
    /// `mhz * 7110656 / 434`, i.e. `mhz * 2^14`, which is the same step as
    /// [`Frf::from_hz`].
    pub fn from_mhz(mhz: f64) -> Self {
        Self {
            word: (mhz * 7_110_656.0 / 434.0) as u32 & 0x00FF_FFFF,
        }
    }

    /// Carrier frequency in Hz this word selects.
    pub fn hz(&self) -> u32 {
        (((self.word as u64) * F_XOSC_HZ) >> 19) as u32
    }
}

/// PA configuration register (address: 0x09)
///
/// # Output Power
/// - RFO pin: Pout = Pmax - (15 - output_power), Pmax = 10.8 + 0.6 * max_power
/// - PA_BOOST pin: Pout = 17 - (15 - output_power)
///
/// The RFM95 module only routes PA_BOOST to the antenna.
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaConfig {
    /// Route the PA to the PA_BOOST pin
    pub pa_boost: bool,
    /// Max power select (3 bits)
    pub max_power: u8,
    /// Output power (4 bits)
    pub output_power: u8,
}

impl Default for PaConfig {
    fn default() -> Self {
        // Reset value 0x4F
        Self {
            pa_boost: false,
            max_power: 0x4,
            output_power: 0xF,
        }
    }
}

/// Silicon version register (address: 0x42)
///
/// Reads [`SX1276_VERSION`] on a working SX1276. Anything else means the
/// wrong part or no part at all, since a floating MISO reads 0x00 or 0xFF.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct Version {
    /// Full revision (bits 7:4) and metal mask revision (bits 3:0)
    pub revision: u8,
}

impl FromByteArray for OpMode {
    type Error = InvalidMode;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            long_range_mode: bytes[0] & 0x80 != 0,
            mode: OperatingMode::try_from(bytes[0] & 0x07)?,
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let lora = if self.long_range_mode { 0x80 } else { 0x00 };
        Ok([lora | self.mode as u8])
    }
}

impl FromByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            word: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let [_, msb, mid, lsb] = self.word.to_be_bytes();
        Ok([msb, mid, lsb])
    }
}

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            pa_boost: bytes[0] & 0x80 != 0,
            max_power: (bytes[0] >> 4) & 0x07,
            output_power: bytes[0] & 0x0F,
        })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let boost = if self.pa_boost { 0x80 } else { 0x00 };
        Ok([boost | (self.max_power & 0x07) << 4 | (self.output_power & 0x0F)])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { revision: bytes[0] })
    }
}
