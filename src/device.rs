//! SX1276 Register Transport
//!
//! This module provides byte-level access to the SX1276 register space over a
//! chip-select gated SPI bus. Every access is one `SpiDevice` transaction, so
//! the chip select and, on a shared bus, the bus lock are held for exactly one
//! register or FIFO burst.
//!
//! The first byte of each transaction is the register address with bit 7 set
//! for a write and cleared for a read. Multi-byte registers use the chip's
//! address auto-increment; the FIFO register instead advances the FIFO
//! pointer, which is why FIFO blocks always go in a single transaction.
//!
//! Register accesses carry a settle delay as an `Operation::DelayNs` inside the
//! transaction, so chip select stays asserted while it runs: between the
//! address and the data on a read, after the data on a write. FIFO bursts have
//! none.
//!
//! # Example
//! ```ignore
//! use sx1276_link::{Device, Version};
//!
//! // Create device with SPI interface
//! let spi = // ... SPI implementation
//! let mut device = Device::new(spi);
//!
//! // Read a register
//! let version: Version = device.read_register()?;
//!
//! // Push a frame into the FIFO
//! device.write_fifo(b"hello")?;
//! ```

use core::convert::Infallible;

use regiface::{
    errors::Error as RegifaceError, ByteArray, FromByteArray, ReadableRegister, ToByteArray,
    WritableRegister,
};

use crate::registers::{FIFO_ADDRESS, WRITE_BIT};

/// Settle time applied inside register transactions, with chip select still
/// asserted.
pub const DEFAULT_SETTLE_NS: u32 = 1_000_000;

/// Register-level interface to the SX1276.
///
/// Wraps an SPI device and provides methods to read and write registers and
/// the FIFO. Synchronous operations use the embedded-hal traits, the `_async`
/// variants use embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
    settle_ns: u32,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            settle_ns: DEFAULT_SETTLE_NS,
        }
    }

    /// Overrides the settle delay placed between a register address and its
    /// data phase, and after each register write before chip select is
    /// released.
    pub fn with_settle_ns(mut self, settle_ns: u32) -> Self {
        self.settle_ns = settle_ns;
        self
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads a register value from the device.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    /// * `RegifaceError::DeserializationError` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let header = [R::id() & !WRITE_BIT];
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&header),
                embedded_hal::spi::Operation::DelayNs(self.settle_ns),
                embedded_hal::spi::Operation::Read(raw_value.as_mut()),
            ])
            .map_err(|_| RegifaceError::BusError)?;

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Writes a value to a device register.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let header = [R::id() | WRITE_BIT];
        let raw_value = register.to_bytes().unwrap_or_else(|never| match never {});

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&header),
                embedded_hal::spi::Operation::Write(raw_value.as_ref()),
                embedded_hal::spi::Operation::DelayNs(self.settle_ns),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Writes bytes into the FIFO at the current FIFO pointer.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_fifo(&mut self, bytes: &[u8]) -> Result<(), RegifaceError> {
        let header = [FIFO_ADDRESS | WRITE_BIT];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&header),
                embedded_hal::spi::Operation::Write(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Reads bytes from the FIFO starting at the current FIFO pointer.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read_fifo(&mut self, bytes: &mut [u8]) -> Result<(), RegifaceError> {
        let header = [FIFO_ADDRESS & !WRITE_BIT];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&header),
                embedded_hal::spi::Operation::Read(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously reads a register value from the device.
    ///
    /// This is the async version of [`read_register`](Device::read_register).
    pub async fn read_register_async<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let header = [R::id() & !WRITE_BIT];
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::DelayNs(self.settle_ns),
                embedded_hal_async::spi::Operation::Read(raw_value.as_mut()),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)?;

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Asynchronously writes a value to a device register.
    ///
    /// This is the async version of [`write_register`](Device::write_register).
    pub async fn write_register_async<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let header = [R::id() | WRITE_BIT];
        let raw_value = register.to_bytes().unwrap_or_else(|never| match never {});

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::Write(raw_value.as_ref()),
                embedded_hal_async::spi::Operation::DelayNs(self.settle_ns),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }

    /// Asynchronously writes bytes into the FIFO.
    ///
    /// This is the async version of [`write_fifo`](Device::write_fifo).
    pub async fn write_fifo_async(&mut self, bytes: &[u8]) -> Result<(), RegifaceError> {
        let header = [FIFO_ADDRESS | WRITE_BIT];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::Write(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }

    /// Asynchronously reads bytes from the FIFO.
    ///
    /// This is the async version of [`read_fifo`](Device::read_fifo).
    pub async fn read_fifo_async(&mut self, bytes: &mut [u8]) -> Result<(), RegifaceError> {
        let header = [FIFO_ADDRESS & !WRITE_BIT];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&header),
                embedded_hal_async::spi::Operation::Read(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }
}
