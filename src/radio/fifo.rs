//! Frame paths through the FIFO
//!
//! Sending loads the TX region and arms the transmitter. Receiving locates the
//! newest frame through [`FifoRxCurrentAddr`], since the RX region in
//! continuous mode keeps moving.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::{debug, warn};

use super::Radio;
use crate::{registers::*, Config, Error};

impl<SPI, RST, DELAY> Radio<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Loads `payload` into the TX region and starts the transmission.
    ///
    /// Returns how many bytes went into the frame. A TxDone left over from an
    /// earlier transmission is cleared before the transmitter is armed.
    pub(crate) fn transmit_frame(&mut self, payload: &[u8]) -> Result<usize, Error> {
        let frame = clamp_payload(&self.config, payload)?;

        self.set_mode(OperatingMode::Standby)?;
        self.device.write_register(FifoAddrPtr {
            address: self.config.tx_base_address,
        })?;
        self.device.write_fifo(frame)?;
        self.device.write_register(PayloadLength {
            length: frame.len() as u8,
        })?;
        self.device
            .write_register(IrqStatus::clear(IrqFlags::TX_DONE))?;
        self.set_mode(OperatingMode::Transmit)?;

        Ok(frame.len())
    }

    /// Reads the pending frame, if any, and acknowledges it.
    pub(crate) fn read_frame(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, Error> {
        let status: IrqStatus = self.device.read_register()?;
        if !status.flags.contains(IrqFlags::RX_DONE) {
            return Ok(None);
        }

        if status.flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
            self.device.write_register(IrqStatus::clear(
                IrqFlags::RX_DONE | IrqFlags::PAYLOAD_CRC_ERROR,
            ))?;
            warn!("dropped frame with bad crc");
            return Err(Error::CrcMismatch);
        }

        let received: RxNbBytes = self.device.read_register()?;
        let len = frame_len(&self.config, received.count, buffer.len());

        let start: FifoRxCurrentAddr = self.device.read_register()?;
        self.device.write_register(FifoAddrPtr {
            address: start.address,
        })?;
        self.device.read_fifo(&mut buffer[..len])?;
        terminate(buffer, len);

        self.device
            .write_register(IrqStatus::clear(IrqFlags::RX_DONE))?;

        debug!("received {} bytes at {:#04x}", len, start.address);
        Ok(Some(len))
    }
}

/// Part of `payload` that fits in one frame.
///
/// # Errors
/// * `Error::EmptyPayload` - nothing is left to send
pub(super) fn clamp_payload<'p>(config: &Config, payload: &'p [u8]) -> Result<&'p [u8], Error> {
    let capacity = config.tx_capacity();
    let frame = if payload.len() > capacity {
        warn!("cutting {} byte payload to {}", payload.len(), capacity);
        &payload[..capacity]
    } else {
        payload
    };

    if frame.is_empty() {
        return Err(Error::EmptyPayload);
    }
    Ok(frame)
}

/// Bytes to pull out of the FIFO for a frame of `received` bytes.
pub(super) fn frame_len(config: &Config, received: u8, room: usize) -> usize {
    let len = (received as usize)
        .min(config.max_payload_length as usize)
        .min(room);
    if len < received as usize {
        warn!("truncating {} byte frame to {}", received, len);
    }
    len
}

/// NUL after the payload, when the buffer has room for it.
pub(super) fn terminate(buffer: &mut [u8], len: usize) {
    if let Some(end) = buffer.get_mut(len) {
        *end = 0;
    }
}
