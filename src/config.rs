//! Wrapper for link configuration parameters.

use crate::{registers::*, Error};

/// Configuration applied by [`Radio::init`](crate::Radio::init).
///
/// There is no negotiation with the peer, so both nodes must be built with
/// the same modem settings. The default is the station's fixed profile:
/// 915 MHz, BW 125 kHz, CR 4/5, SF7, explicit header, CRC on, 8 symbol
/// preamble, 255 byte payload cap.
#[derive(Debug, Clone)]
pub struct Config {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// Signal bandwidth
    pub bandwidth: Bandwidth,
    /// Error coding rate
    pub coding_rate: CodingRate,
    /// Implicit header mode
    pub implicit_header: bool,
    /// Spreading factor
    pub spreading_factor: SpreadingFactor,
    /// Payload CRC generation and check
    pub crc: bool,
    /// LNA gain set by the AGC
    pub agc_auto: bool,
    /// Low data rate optimization, needed from SF11 at 125 kHz
    pub low_data_rate_optimize: bool,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Largest payload sent or accepted; longer payloads are cut
    pub max_payload_length: u8,
    /// Start of the TX region in the FIFO
    pub tx_base_address: u8,
    /// Start of the RX region in the FIFO
    pub rx_base_address: u8,
    /// How long `send` polls for TxDone before giving up, in ms
    ///
    /// Only the sleeps between polls count. Each poll also reads the IRQ
    /// register, which takes the transport settle time on top, so with the
    /// default 1 ms settle the wall clock wait is up to about twice this.
    pub tx_timeout_ms: u32,
    /// Power amplifier setting, `None` keeps the chip default
    pub pa: Option<PaConfig>,
    /// Check the silicon version right after reset
    pub verify_version: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frequency_hz: 915_000_000,
            bandwidth: Bandwidth::Khz125,
            coding_rate: CodingRate::Cr4_5,
            implicit_header: false,
            spreading_factor: SpreadingFactor::Sf7,
            crc: true,
            agc_auto: true,
            low_data_rate_optimize: false,
            preamble_length: 8,
            max_payload_length: 255,
            tx_base_address: 0x00,
            rx_base_address: 0x00,
            tx_timeout_ms: 2_000,
            pa: None,
            verify_version: true,
        }
    }
}

impl Config {
    pub(crate) fn modem_config1(&self) -> ModemConfig1 {
        ModemConfig1 {
            bandwidth: self.bandwidth,
            coding_rate: self.coding_rate,
            implicit_header: self.implicit_header,
        }
    }

    pub(crate) fn modem_config2(&self) -> ModemConfig2 {
        ModemConfig2 {
            spreading_factor: self.spreading_factor,
            tx_continuous: false,
            rx_payload_crc: self.crc,
            symb_timeout_msb: 0,
        }
    }

    pub(crate) fn modem_config3(&self) -> ModemConfig3 {
        ModemConfig3 {
            low_data_rate_optimize: self.low_data_rate_optimize,
            agc_auto_on: self.agc_auto,
        }
    }

    /// Rejects settings the chip would misbehave with.
    ///
    /// RegPayloadLength must not be 0, so a zero payload cap is refused.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.max_payload_length == 0 {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }

    /// Longest payload that both the cap and the TX region allow.
    pub(crate) fn tx_capacity(&self) -> usize {
        (self.max_payload_length as usize).min(FIFO_SIZE - self.tx_base_address as usize)
    }
}
