//! LoRa link driver
//!
//! [`Radio`] sequences register traffic into the four things the station
//! needs from the transceiver: bring it up, send a frame, check for a frame
//! and read one out. Mode handling lives in `mode`, the FIFO paths in
//! `fifo`, and every operation has an `_async` twin in `asynch`.
//!
//! Completion of RF operations is detected by polling the IRQ flag register;
//! no DIO line is needed. Flags the driver acts on are cleared right away.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::{debug, trace, warn};

use crate::{registers::*, Config, Device, Error};

mod asynch;
mod fifo;
mod mode;

/// Interval between two TxDone polls.
pub const TX_POLL_INTERVAL_MS: u32 = 1;

/// SX1276 LoRa link over SPI with a reset line.
///
/// The radio keeps track of the last mode it commanded. The chip itself
/// returns to standby after a transmission, which the driver mirrors once the
/// TxDone flag has been seen.
pub struct Radio<SPI, RST, DELAY> {
    device: Device<SPI>,
    reset: RST,
    delay: DELAY,
    config: Config,
    mode: OperatingMode,
}

impl<SPI, RST, DELAY> Radio<SPI, RST, DELAY> {
    /// Creates a radio on top of a plain SPI device.
    ///
    /// Nothing is sent to the chip until [`init`](Radio::init).
    pub fn new(spi: SPI, reset: RST, delay: DELAY, config: Config) -> Self {
        Self::from_device(Device::new(spi), reset, delay, config)
    }

    /// Creates a radio on top of an already set up register transport.
    pub fn from_device(device: Device<SPI>, reset: RST, delay: DELAY, config: Config) -> Self {
        Self {
            device,
            reset,
            delay,
            config,
            mode: OperatingMode::Standby,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Last operating mode written to the chip.
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Gives back the bus, reset line and delay.
    pub fn release(self) -> (SPI, RST, DELAY) {
        (self.device.release(), self.reset, self.delay)
    }

    fn ensure_idle(&self) -> Result<(), Error> {
        if self.mode.is_rf_active() {
            Err(Error::InvalidMode(self.mode))
        } else {
            Ok(())
        }
    }
}

impl<SPI, RST, DELAY> Radio<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Resets the chip and applies the configuration.
    ///
    /// The LoRa bit can only be set in sleep, so the chip goes through sleep
    /// before anything else is programmed and ends up in standby.
    ///
    /// # Errors
    /// * `Error::UnsupportedVersion` - the version register is not 0x12
    pub fn init(&mut self) -> Result<(), Error> {
        self.reset()?;

        if self.config.verify_version {
            let version = self.version()?;
            if version != SX1276_VERSION {
                warn!("unexpected silicon version {:#04x}", version);
                return Err(Error::UnsupportedVersion(version));
            }
            trace!("silicon version {:#04x}", version);
        }

        self.set_mode(OperatingMode::Sleep)?;
        self.set_frequency(self.config.frequency_hz)?;
        self.configure_modem()?;
        self.set_mode(OperatingMode::Standby)?;

        debug!("radio ready on {} Hz", self.config.frequency_hz);
        Ok(())
    }

    /// Sends one frame and waits for the chip to report it gone.
    ///
    /// Payloads longer than the configured cap are cut. Returns the number of
    /// bytes put on air. The radio is left in standby either way, with
    /// TxDone cleared.
    ///
    /// The deadline counts poll sleeps only; see [`Config::tx_timeout_ms`].
    ///
    /// # Errors
    /// * `Error::TxTimeout` - TxDone not seen within `tx_timeout_ms`
    /// * `Error::EmptyPayload` - nothing to send, the chip is not touched
    pub fn send(&mut self, payload: &[u8]) -> Result<usize, Error> {
        let len = self.transmit_frame(payload)?;

        let mut waited_ms = 0;
        loop {
            let status: IrqStatus = self.device.read_register()?;
            if status.flags.contains(IrqFlags::TX_DONE) {
                self.device
                    .write_register(IrqStatus::clear(IrqFlags::TX_DONE))?;
                self.set_mode(OperatingMode::Standby)?;
                debug!("sent {} bytes after {} ms", len, waited_ms);
                return Ok(len);
            }

            if waited_ms >= self.config.tx_timeout_ms {
                warn!("no tx done after {} ms", waited_ms);
                self.set_mode(OperatingMode::Standby)?;
                // a TxDone raised after the last poll must not leak into the next send
                self.device
                    .write_register(IrqStatus::clear(IrqFlags::TX_DONE))?;
                return Err(Error::TxTimeout);
            }

            self.delay.delay_ms(TX_POLL_INTERVAL_MS);
            waited_ms += TX_POLL_INTERVAL_MS;
        }
    }

    /// True when a received frame waits in the FIFO. Leaves the flag set.
    pub fn is_data_available(&mut self) -> Result<bool, Error> {
        let status: IrqStatus = self.device.read_register()?;
        Ok(status.flags.contains(IrqFlags::RX_DONE))
    }

    /// Copies a received frame into `buffer`, if there is one.
    ///
    /// Returns the payload length. A frame longer than `buffer` or the
    /// configured cap is truncated. When room is left a NUL byte follows the
    /// payload so text consumers can treat the buffer as a C string.
    ///
    /// # Errors
    /// * `Error::CrcMismatch` - the frame failed its CRC and was dropped
    pub fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, Error> {
        self.read_frame(buffer)
    }

    /// Starts listening continuously. Frames raise RxDone as they arrive.
    pub fn enter_receive_mode(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::ReceiveContinuous)
    }

    pub fn standby(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Standby)
    }

    pub fn sleep(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Sleep)
    }

    /// Raw content of the silicon version register.
    pub fn version(&mut self) -> Result<u8, Error> {
        let version: Version = self.device.read_register()?;
        Ok(version.revision)
    }

    /// RSSI of the last frame received, in dBm.
    pub fn last_packet_rssi(&mut self) -> Result<i16, Error> {
        let rssi: PktRssi = self.device.read_register()?;
        Ok(rssi.dbm())
    }

    /// SNR of the last frame received, in dB.
    pub fn last_packet_snr(&mut self) -> Result<f32, Error> {
        let snr: PktSnr = self.device.read_register()?;
        Ok(snr.db())
    }
}
