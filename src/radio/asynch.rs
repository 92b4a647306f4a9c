//! Async link operations
//!
//! Same sequences as the blocking driver, on embedded-hal-async SPI and
//! delays. The TxDone poll yields to the executor between reads.

use embedded_hal::digital::OutputPin;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;
use log::{debug, trace, warn};

use super::fifo::{clamp_payload, frame_len, terminate};
use super::mode::{RESET_PULSE_MS, RESET_SETTLE_MS};
use super::{Radio, TX_POLL_INTERVAL_MS};
use crate::{registers::*, Error};

impl<SPI, RST, DELAY> Radio<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Async version of [`init`](Radio::init).
    pub async fn init_async(&mut self) -> Result<(), Error> {
        self.reset_async().await?;

        if self.config.verify_version {
            let version = self.version_async().await?;
            if version != SX1276_VERSION {
                warn!("unexpected silicon version {:#04x}", version);
                return Err(Error::UnsupportedVersion(version));
            }
        }

        self.set_mode_async(OperatingMode::Sleep).await?;
        self.set_frequency_async(self.config.frequency_hz).await?;
        self.configure_modem_async().await?;
        self.set_mode_async(OperatingMode::Standby).await?;

        debug!("radio ready on {} Hz", self.config.frequency_hz);
        Ok(())
    }

    /// Async version of [`send`](Radio::send).
    pub async fn send_async(&mut self, payload: &[u8]) -> Result<usize, Error> {
        let frame = clamp_payload(&self.config, payload)?;

        self.set_mode_async(OperatingMode::Standby).await?;
        self.device
            .write_register_async(FifoAddrPtr {
                address: self.config.tx_base_address,
            })
            .await?;
        self.device.write_fifo_async(frame).await?;
        self.device
            .write_register_async(PayloadLength {
                length: frame.len() as u8,
            })
            .await?;
        self.device
            .write_register_async(IrqStatus::clear(IrqFlags::TX_DONE))
            .await?;
        self.set_mode_async(OperatingMode::Transmit).await?;

        let mut waited_ms = 0;
        loop {
            let status: IrqStatus = self.device.read_register_async().await?;
            if status.flags.contains(IrqFlags::TX_DONE) {
                self.device
                    .write_register_async(IrqStatus::clear(IrqFlags::TX_DONE))
                    .await?;
                self.set_mode_async(OperatingMode::Standby).await?;
                debug!("sent {} bytes after {} ms", frame.len(), waited_ms);
                return Ok(frame.len());
            }

            if waited_ms >= self.config.tx_timeout_ms {
                warn!("no tx done after {} ms", waited_ms);
                self.set_mode_async(OperatingMode::Standby).await?;
                self.device
                    .write_register_async(IrqStatus::clear(IrqFlags::TX_DONE))
                    .await?;
                return Err(Error::TxTimeout);
            }

            self.delay.delay_ms(TX_POLL_INTERVAL_MS).await;
            waited_ms += TX_POLL_INTERVAL_MS;
        }
    }

    /// Async version of [`is_data_available`](Radio::is_data_available).
    pub async fn is_data_available_async(&mut self) -> Result<bool, Error> {
        let status: IrqStatus = self.device.read_register_async().await?;
        Ok(status.flags.contains(IrqFlags::RX_DONE))
    }

    /// Async version of [`receive`](Radio::receive).
    pub async fn receive_async(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, Error> {
        let status: IrqStatus = self.device.read_register_async().await?;
        if !status.flags.contains(IrqFlags::RX_DONE) {
            return Ok(None);
        }

        if status.flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            self.device
                .write_register_async(IrqStatus::clear(
                    IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR,
                ))
                .await?;
            warn!("dropped frame with bad crc");
            return Err(Error::CrcMismatch);
        }

        let received: RxNbBytes = self.device.read_register_async().await?;
        let len = frame_len(&self.config, received.count, buffer.len());

        let start: FifoRxCurrentAddr = self.device.read_register_async().await?;
        self.device
            .write_register_async(FifoAddrPtr {
                address: start.address,
            })
            .await?;
        self.device.read_fifo_async(&mut buffer[..len]).await?;
        terminate(buffer, len);

        self.device
            .write_register_async(IrqStatus::clear(IrqFlags::RX_DONE))
            .await?;

        debug!("received {} bytes at {:#04x}", len, start.address);
        Ok(Some(len))
    }

    /// Async version of [`enter_receive_mode`](Radio::enter_receive_mode).
    pub async fn enter_receive_mode_async(&mut self) -> Result<(), Error> {
        self.set_mode_async(OperatingMode::ReceiveContinuous).await
    }

    pub async fn standby_async(&mut self) -> Result<(), Error> {
        self.set_mode_async(OperatingMode::Standby).await
    }

    pub async fn sleep_async(&mut self) -> Result<(), Error> {
        self.set_mode_async(OperatingMode::Sleep).await
    }

    /// Async version of [`version`](Radio::version).
    pub async fn version_async(&mut self) -> Result<u8, Error> {
        let version: Version = self.device.read_register_async().await?;
        Ok(version.revision)
    }

    /// Async version of [`last_packet_rssi`](Radio::last_packet_rssi).
    pub async fn last_packet_rssi_async(&mut self) -> Result<i16, Error> {
        let rssi: PktRssi = self.device.read_register_async().await?;
        Ok(rssi.dbm())
    }

    /// Async version of [`last_packet_snr`](Radio::last_packet_snr).
    pub async fn last_packet_snr_async(&mut self) -> Result<f32, Error> {
        let snr: PktSnr = self.device.read_register_async().await?;
        Ok(snr.db())
    }

    /// Async version of [`reset`](Radio::reset).
    pub async fn reset_async(&mut self) -> Result<(), Error> {
        self.reset.set_low().map_err(|_| Error::Reset)?;
        self.delay.delay_ms(RESET_PULSE_MS).await;
        self.reset.set_high().map_err(|_| Error::Reset)?;
        self.delay.delay_ms(RESET_SETTLE_MS).await;

        self.mode = OperatingMode::Standby;
        trace!("reset done");
        Ok(())
    }

    /// Async version of [`set_mode`](Radio::set_mode).
    pub async fn set_mode_async(&mut self, mode: OperatingMode) -> Result<(), Error> {
        self.device.write_register_async(OpMode::lora(mode)).await?;
        trace!("mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Async version of [`set_frequency`](Radio::set_frequency).
    pub async fn set_frequency_async(&mut self, hz: u32) -> Result<(), Error> {
        self.ensure_idle()?;
        self.device.write_register_async(Frf::from_hz(hz)).await?;
        Ok(())
    }

    /// Async version of [`configure_modem`](Radio::configure_modem).
    pub async fn configure_modem_async(&mut self) -> Result<(), Error> {
        self.ensure_idle()?;
        self.config.validate()?;

        self.device
            .write_register_async(self.config.modem_config1())
            .await?;
        self.device
            .write_register_async(self.config.modem_config2())
            .await?;
        self.device
            .write_register_async(self.config.modem_config3())
            .await?;
        self.device
            .write_register_async(PreambleLength {
                symbols: self.config.preamble_length,
            })
            .await?;
        self.device
            .write_register_async(PayloadLength {
                length: self.config.max_payload_length,
            })
            .await?;
        self.device
            .write_register_async(FifoTxBaseAddr {
                address: self.config.tx_base_address,
            })
            .await?;
        self.device
            .write_register_async(FifoRxBaseAddr {
                address: self.config.rx_base_address,
            })
            .await?;
        if let Some(pa) = self.config.pa {
            self.device.write_register_async(pa).await?;
        }
        Ok(())
    }
}
