#![cfg_attr(not(test), no_std)]
//! SX1276 LoRa Link Driver
//!
//! This crate drives a Semtech SX1276 (HopeRF RFM95) transceiver as a
//! point-to-point text link between two weather stations. One node
//! broadcasts its temperature, pressure and humidity readings; the other
//! listens and takes them over as its own.
//!
//! # Features
//! - Fixed single channel profile: 915 MHz, SF7, BW 125 kHz, CR 4/5, CRC on
//! - Polled operation, no DIO line needed
//! - Blocking and async (`_async`) variants of every link operation
//! - Payloads up to 255 bytes, longer ones are cut
//!
//! # Architecture
//! The driver is organized into several modules:
//!
//! - [`device`]: Register transport over a chip-select gated SPI device
//!   - One SPI transaction per register or FIFO burst
//!   - Address byte bit 7 selects write access
//!
//! - [`registers`]: Typed SX1276 register map
//!
//! - [`Radio`]: Link driver on top of the transport
//!   - Reset, mode and synthesizer control
//!   - FIFO send and receive paths
//!   - TxDone/RxDone polling with flag clearing
//!
//! - [`report`]: Text encoding of one set of readings
//!
//! - [`station`]: Transmit/receive loop state and button handling
//!
//! # Important Notes
//! - Frequency and modem settings are only accepted in sleep or standby
//! - After `send` the radio stays in standby; call
//!   [`Radio::enter_receive_mode`] to listen again
//! - There is no addressing, acknowledgement or retransmission; every frame
//!   is a broadcast
//!
//! # Example
//! ```ignore
//! use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};
//! use sx1276_link::{Config, Error, Radio, Report};
//!
//! fn broadcast<SPI, RST, DELAY>(spi: SPI, reset: RST, delay: DELAY) -> Result<(), Error>
//! where
//!     SPI: SpiDevice,
//!     RST: OutputPin,
//!     DELAY: DelayNs,
//! {
//!     let mut radio = Radio::new(spi, reset, delay, Config::default());
//!     radio.init()?;
//!
//!     let report = Report { temperature: 23.5, pressure: 1013.2, humidity: 55.0 };
//!     radio.send(report.encode()?.as_bytes())?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod radio;
pub mod registers;
pub mod report;
pub mod station;

#[cfg(test)]
mod mock;

pub use config::Config;
pub use device::Device;
pub use error::Error;
pub use radio::Radio;
pub use registers::*;
pub use report::Report;
