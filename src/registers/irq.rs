//! Interrupt flag register
//!
//! Completion of asynchronous RF operations is reported here. Flags stay
//! set until the host writes the same bit back, so every flag acted upon has
//! to be cleared right after; a stale RxDone would report the same frame
//! twice.

use core::convert::Infallible;

use bitflags::bitflags;
use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// LoRa interrupt flags (RegIrqFlags)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// No packet within the single-RX timeout
        const RX_TIMEOUT = 1 << 7;
        /// Packet received and stored in the FIFO
        const RX_DONE = 1 << 6;
        /// Received payload failed its CRC
        const PAYLOAD_CRC_ERROR = 1 << 5;
        /// Valid header received
        const VALID_HEADER = 1 << 4;
        /// Packet transmission finished
        const TX_DONE = 1 << 3;
        /// Channel activity detection finished
        const CAD_DONE = 1 << 2;
        /// Frequency hop due
        const FHSS_CHANGE_CHANNEL = 1 << 1;
        /// Activity seen during CAD
        const CAD_DETECTED = 1 << 0;
    }
}

/// IRQ flags register (address: 0x12)
///
/// Reading returns the pending flags. Writing clears every flag whose bit is
/// set in the written value and leaves the others alone.
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct IrqStatus {
    /// Pending flags on read, flags to clear on write
    pub flags: IrqFlags,
}

impl IrqStatus {
    /// Write-back value clearing `flags`.
    pub fn clear(flags: IrqFlags) -> Self {
        Self { flags }
    }
}

impl FromByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqStatus {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}
