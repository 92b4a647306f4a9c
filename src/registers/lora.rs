//! LoRa modem registers
//!
//! This module contains the registers defining the modulation and packet
//! format, all of them fixed at initialization:
//! - Bandwidth, coding rate and header mode (ModemConfig1)
//! - Spreading factor and payload CRC (ModemConfig2)
//! - AGC and low data rate optimization (ModemConfig3)
//! - Preamble and payload length
//!
//! and the per-packet link quality registers filled in on reception.
//!
//! Both ends of the link must agree on every modem setting; there is no
//! negotiation over the air.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Offset subtracted from [`PktRssi`] on the high-frequency port (dBm).
pub const RSSI_OFFSET_HF: i16 = 157;

/// Error type for modem configuration field conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InvalidModemField {
    /// Bandwidth field outside 0..=9
    Bandwidth(u8),
    /// Coding rate field outside 1..=4
    CodingRate(u8),
    /// Spreading factor field outside 6..=12
    SpreadingFactor(u8),
}

/// Signal bandwidth (ModemConfig1 bits 7:4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bandwidth {
    Khz7_8 = 0,
    Khz10_4 = 1,
    Khz15_6 = 2,
    Khz20_8 = 3,
    Khz31_25 = 4,
    Khz41_7 = 5,
    Khz62_5 = 6,
    Khz125 = 7,
    Khz250 = 8,
    Khz500 = 9,
}

impl TryFrom<u8> for Bandwidth {
    type Error = InvalidModemField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Khz7_8),
            1 => Ok(Self::Khz10_4),
            2 => Ok(Self::Khz15_6),
            3 => Ok(Self::Khz20_8),
            4 => Ok(Self::Khz31_25),
            5 => Ok(Self::Khz41_7),
            6 => Ok(Self::Khz62_5),
            7 => Ok(Self::Khz125),
            8 => Ok(Self::Khz250),
            9 => Ok(Self::Khz500),
            invalid => Err(InvalidModemField::Bandwidth(invalid)),
        }
    }
}

/// Error coding rate (ModemConfig1 bits 3:1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodingRate {
    Cr4_5 = 1,
    Cr4_6 = 2,
    Cr4_7 = 3,
    Cr4_8 = 4,
}

impl TryFrom<u8> for CodingRate {
    type Error = InvalidModemField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cr4_5),
            2 => Ok(Self::Cr4_6),
            3 => Ok(Self::Cr4_7),
            4 => Ok(Self::Cr4_8),
            invalid => Err(InvalidModemField::CodingRate(invalid)),
        }
    }
}

/// Spreading factor (ModemConfig2 bits 7:4)
///
/// SF6 additionally requires implicit header mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpreadingFactor {
    Sf6 = 6,
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = InvalidModemField;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            6 => Ok(Self::Sf6),
            7 => Ok(Self::Sf7),
            8 => Ok(Self::Sf8),
            9 => Ok(Self::Sf9),
            10 => Ok(Self::Sf10),
            11 => Ok(Self::Sf11),
            12 => Ok(Self::Sf12),
            invalid => Err(InvalidModemField::SpreadingFactor(invalid)),
        }
    }
}

/// Modem configuration 1 (address: 0x1D)
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig1 {
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Error coding rate
    pub coding_rate: CodingRate,
    /// Implicit header mode; false sends an explicit header
    pub implicit_header: bool,
}

/// Modem configuration 2 (address: 0x1E)
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig2 {
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Send the FIFO content back to back instead of one packet
    pub tx_continuous: bool,
    /// Append and check a payload CRC
    pub rx_payload_crc: bool,
    /// RX timeout MSB (2 bits), only used by single receive
    pub symb_timeout_msb: u8,
}

/// Modem configuration 3 (address: 0x26)
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig3 {
    /// Mandated when a symbol lasts longer than 16 ms
    pub low_data_rate_optimize: bool,
    /// LNA gain set by the internal AGC loop
    pub agc_auto_on: bool,
}

/// Preamble length in symbols (addresses: 0x20 MSB, 0x21 LSB)
///
/// The modem adds 4.25 symbols to the programmed value.
#[register(0x20u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PreambleLength {
    /// Programmed preamble length
    /// Default: 8
    pub symbols: u16,
}

/// Payload length (address: 0x22)
///
/// Number of FIFO bytes sent by the next transmission. In implicit header
/// mode it is also the expected receive length.
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PayloadLength {
    /// Payload length in bytes, never 0
    pub length: u8,
}

/// SNR of the last packet (address: 0x19, read-only)
#[register(0x19u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct PktSnr {
    /// Two's complement SNR in quarter dB
    pub quarter_db: i8,
}

impl PktSnr {
    /// SNR in dB.
    pub fn db(&self) -> f32 {
        self.quarter_db as f32 / 4.0
    }
}

/// RSSI of the last packet (address: 0x1A, read-only)
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct PktRssi {
    /// Raw RSSI value
    pub raw: u8,
}

impl PktRssi {
    /// Packet RSSI in dBm on the high-frequency port.
    pub fn dbm(&self) -> i16 {
        self.raw as i16 - RSSI_OFFSET_HF
    }
}

impl FromByteArray for ModemConfig1 {
    type Error = InvalidModemField;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            bandwidth: Bandwidth::try_from(bytes[0] >> 4)?,
            coding_rate: CodingRate::try_from((bytes[0] >> 1) & 0x07)?,
            implicit_header: bytes[0] & 0x01 != 0,
        })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.bandwidth as u8) << 4
            | (self.coding_rate as u8) << 1
            | self.implicit_header as u8])
    }
}

impl FromByteArray for ModemConfig2 {
    type Error = InvalidModemField;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            spreading_factor: SpreadingFactor::try_from(bytes[0] >> 4)?,
            tx_continuous: bytes[0] & 0x08 != 0,
            rx_payload_crc: bytes[0] & 0x04 != 0,
            symb_timeout_msb: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.spreading_factor as u8) << 4
            | (self.tx_continuous as u8) << 3
            | (self.rx_payload_crc as u8) << 2
            | self.symb_timeout_msb & 0x03])
    }
}

impl FromByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            low_data_rate_optimize: bytes[0] & 0x08 != 0,
            agc_auto_on: bytes[0] & 0x04 != 0,
        })
    }
}

impl ToByteArray for ModemConfig3 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.low_data_rate_optimize as u8) << 3 | (self.agc_auto_on as u8) << 2])
    }
}

impl FromByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            symbols: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for PreambleLength {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.symbols.to_be_bytes())
    }
}

impl FromByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { length: bytes[0] })
    }
}

impl ToByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}

impl FromByteArray for PktSnr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            quarter_db: bytes[0] as i8,
        })
    }
}

impl FromByteArray for PktRssi {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { raw: bytes[0] })
    }
}
