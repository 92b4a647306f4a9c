//! FIFO pointer registers
//!
//! The SX1276 keeps one 256-byte packet buffer shared by transmit and
//! receive. It is reached through the single [`FIFO_ADDRESS`] register, whose
//! pointer ([`FifoAddrPtr`]) auto-increments on every byte accessed.
//!
//! - A transmission sends whatever sits between [`FifoTxBaseAddr`] and
//!   `FifoTxBaseAddr + PayloadLength`
//! - A reception lands at [`FifoRxCurrentAddr`] with [`RxNbBytes`] bytes

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Address of the FIFO data register.
pub const FIFO_ADDRESS: u8 = 0x00;

/// Size of the packet buffer in bytes.
pub const FIFO_SIZE: usize = 256;

/// FIFO SPI pointer (address: 0x0D)
///
/// Must be set explicitly before each burst so the access starts at the
/// right place in the buffer.
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct FifoAddrPtr {
    /// Buffer offset of the next SPI FIFO access
    pub address: u8,
}

/// TX base address in the FIFO (address: 0x0E)
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct FifoTxBaseAddr {
    /// Start of the TX region
    /// Default: 0x80
    pub address: u8,
}

/// RX base address in the FIFO (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct FifoRxBaseAddr {
    /// Start of the RX region
    /// Default: 0x00
    pub address: u8,
}

/// Start address of the last packet received (address: 0x10, read-only)
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct FifoRxCurrentAddr {
    /// Buffer offset of the last received frame
    pub address: u8,
}

/// Number of payload bytes of the last packet received (address: 0x13, read-only)
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct RxNbBytes {
    /// Received payload length
    pub count: u8,
}

macro_rules! address_register {
    ($name:ident, $field:ident) => {
        impl FromByteArray for $name {
            type Error = Infallible;
            type Array = [u8; 1];

            fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
                Ok(Self { $field: bytes[0] })
            }
        }
    };
    ($name:ident, $field:ident, writable) => {
        address_register!($name, $field);

        impl ToByteArray for $name {
            type Error = Infallible;
            type Array = [u8; 1];

            fn to_bytes(self) -> Result<Self::Array, Self::Error> {
                Ok([self.$field])
            }
        }
    };
}

address_register!(FifoAddrPtr, address, writable);
address_register!(FifoTxBaseAddr, address, writable);
address_register!(FifoRxBaseAddr, address, writable);
address_register!(FifoRxCurrentAddr, address);
address_register!(RxNbBytes, count);
