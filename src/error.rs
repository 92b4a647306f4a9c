//! Driver error type

use core::fmt;

use regiface::errors::Error as RegifaceError;

use crate::registers::OperatingMode;

/// Everything that can go wrong on the link.
///
/// The transceiver itself reports almost nothing, so most variants are
/// conditions the driver detects on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI transaction failed
    Bus,
    /// Register content did not decode into a known value
    Decode,
    /// Driving the reset line failed
    Reset,
    /// TxDone was not raised before the configured deadline
    TxTimeout,
    /// Operation not allowed in the current operating mode
    InvalidMode(OperatingMode),
    /// Version register did not read as an SX1276
    UnsupportedVersion(u8),
    /// A frame arrived with a bad payload CRC
    CrcMismatch,
    /// Payload does not fit in one frame
    PayloadTooLarge,
    /// Nothing to send; the chip cannot transmit a zero length frame
    EmptyPayload,
    /// Configuration the chip cannot take
    InvalidConfig,
    /// Received text is not a sensor report
    MalformedFrame,
}

impl From<RegifaceError> for Error {
    fn from(err: RegifaceError) -> Self {
        match err {
            RegifaceError::BusError => Self::Bus,
            _ => Self::Decode,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => f.write_str("spi bus error"),
            Self::Decode => f.write_str("unexpected register content"),
            Self::Reset => f.write_str("reset line error"),
            Self::TxTimeout => f.write_str("timed out waiting for tx done"),
            Self::InvalidMode(mode) => write!(f, "not allowed in {mode:?} mode"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported silicon version {version:#04x}")
            }
            Self::CrcMismatch => f.write_str("payload crc error"),
            Self::PayloadTooLarge => f.write_str("payload too large"),
            Self::EmptyPayload => f.write_str("empty payload"),
            Self::InvalidConfig => f.write_str("invalid configuration"),
            Self::MalformedFrame => f.write_str("malformed frame"),
        }
    }
}
