//! Mode controller
//!
//! The chip accepts any mode write at any time, so the only guard kept here
//! is the one the synthesizer needs: frequency and modem settings are only
//! written while the RF front end is idle.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::trace;

use super::Radio;
use crate::{registers::*, Error};

/// Reset line held low for this long.
pub(crate) const RESET_PULSE_MS: u32 = 10;

/// Time the chip needs after reset before it answers on SPI.
pub(crate) const RESET_SETTLE_MS: u32 = 10;

impl<SPI, RST, DELAY> Radio<SPI, RST, DELAY>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DELAY: DelayNs,
{
    /// Pulses the reset line. All registers return to their defaults.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.reset.set_low().map_err(|_| Error::Reset)?;
        self.delay.delay_ms(RESET_PULSE_MS);
        self.reset.set_high().map_err(|_| Error::Reset)?;
        self.delay.delay_ms(RESET_SETTLE_MS);

        self.mode = OperatingMode::Standby;
        trace!("reset done");
        Ok(())
    }

    /// Writes the operating mode, LoRa modem selected.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        self.device.write_register(OpMode::lora(mode))?;
        trace!("mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Programs the carrier frequency.
    ///
    /// # Errors
    /// * `Error::InvalidMode` - the radio is transmitting or receiving
    pub fn set_frequency(&mut self, hz: u32) -> Result<(), Error> {
        self.ensure_idle()?;
        let frf = Frf::from_hz(hz);
        self.device.write_register(frf)?;
        trace!("frf {:#08x} for {} Hz", frf.word, hz);
        Ok(())
    }

    /// Writes modem settings, payload cap and FIFO layout from the config.
    ///
    /// # Errors
    /// * `Error::InvalidMode` - the radio is transmitting or receiving
    /// * `Error::InvalidConfig` - the payload cap is 0
    pub fn configure_modem(&mut self) -> Result<(), Error> {
        self.ensure_idle()?;
        self.config.validate()?;

        self.device.write_register(self.config.modem_config1())?;
        self.device.write_register(self.config.modem_config2())?;
        self.device.write_register(self.config.modem_config3())?;
        self.device.write_register(PreambleLength {
            symbols: self.config.preamble_length,
        })?;
        self.device.write_register(PayloadLength {
            length: self.config.max_payload_length,
        })?;
        self.device.write_register(FifoTxBaseAddr {
            address: self.config.tx_base_address,
        })?;
        self.device.write_register(FifoRxBaseAddr {
            address: self.config.rx_base_address,
        })?;
        if let Some(pa) = self.config.pa {
            self.device.write_register(pa)?;
        }

        trace!(
            "modem {:?} {:?} {:?}, preamble {}",
            self.config.spreading_factor,
            self.config.bandwidth,
            self.config.coding_rate,
            self.config.preamble_length
        );
        Ok(())
    }
}
