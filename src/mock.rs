//! Simulated SX1276 for unit tests.
//!
//! Models what the driver relies on: register address auto-increment, the
//! FIFO pointer, write-one-to-clear IRQ flags, the automatic return to
//! standby after a transmission and register defaults restored by the reset
//! line. SPI, reset pin and delay handles share one [`Chip`].

use core::convert::Infallible;
use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal::spi::Operation;

use crate::registers::{
    IrqFlags, OperatingMode, FIFO_ADDRESS, FIFO_SIZE, SX1276_VERSION, WRITE_BIT,
};

const REG_OP_MODE: u8 = 0x01;
const REG_FIFO_ADDR_PTR: u8 = 0x0D;
const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
const REG_IRQ_FLAGS: u8 = 0x12;
const REG_RX_NB_BYTES: u8 = 0x13;
const REG_PAYLOAD_LENGTH: u8 = 0x22;
const REG_VERSION: u8 = 0x42;
const READ_ONLY: [u8; 5] = [0x10, 0x13, 0x19, 0x1A, 0x42];

const POR_DEFAULTS: [(u8, u8); 14] = [
    (0x01, 0x09),
    (0x06, 0x6C),
    (0x07, 0x80),
    (0x08, 0x00),
    (0x09, 0x4F),
    (0x0E, 0x80),
    (0x0F, 0x00),
    (0x1D, 0x72),
    (0x1E, 0x70),
    (0x20, 0x00),
    (0x21, 0x08),
    (0x22, 0x01),
    (0x23, 0xFF),
    (0x26, 0x00),
];

/// Bus level activity seen by the chip.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Register burst write starting at `address`
    Write { address: u8, bytes: Vec<u8> },
    /// Register burst read starting at `address`
    Read { address: u8, len: usize },
    /// FIFO write starting at the FIFO pointer
    FifoWrite { pointer: u8, bytes: Vec<u8> },
    /// FIFO read starting at the FIFO pointer
    FifoRead { pointer: u8, len: usize },
    /// Delay requested inside a transaction, chip select still asserted
    Settle { ns: u32 },
    /// Reset line released after being held low
    Reset,
}

pub struct Chip {
    regs: [u8; 0x80],
    fifo: [u8; FIFO_SIZE],
    /// Every transaction's address byte, access flag included
    pub headers: Vec<u8>,
    pub events: Vec<Event>,
    /// Modes written by the host, in order
    pub modes: Vec<OperatingMode>,
    /// IRQ flag reads in Transmit before TxDone is raised, `None` never
    pub tx_done_after: Option<u32>,
    /// Value the version register comes up with after reset
    pub silicon_version: u8,
    tx_polls: u32,
    reset_low: bool,
}

impl Chip {
    fn new() -> Self {
        let mut chip = Self {
            regs: [0; 0x80],
            fifo: [0; FIFO_SIZE],
            headers: Vec::new(),
            events: Vec::new(),
            modes: Vec::new(),
            tx_done_after: Some(2),
            silicon_version: SX1276_VERSION,
            tx_polls: 0,
            reset_low: false,
        };
        chip.load_defaults();
        chip
    }

    fn load_defaults(&mut self) {
        self.regs = [0; 0x80];
        self.fifo = [0; FIFO_SIZE];
        for (address, value) in POR_DEFAULTS {
            self.regs[address as usize] = value;
        }
        self.regs[REG_VERSION as usize] = self.silicon_version;
    }

    pub fn reg(&self, address: u8) -> u8 {
        self.regs[address as usize]
    }

    /// Sets a register as if the chip had updated it.
    pub fn poke(&mut self, address: u8, value: u8) {
        self.regs[address as usize] = value;
    }

    pub fn fifo(&self, start: u8, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.fifo[(start as usize + i) % FIFO_SIZE])
            .collect()
    }

    pub fn irq_flags(&self) -> IrqFlags {
        IrqFlags::from_bits_retain(self.reg(REG_IRQ_FLAGS))
    }

    pub fn current_mode(&self) -> Option<OperatingMode> {
        OperatingMode::try_from(self.reg(REG_OP_MODE) & 0x07).ok()
    }

    pub fn fifo_writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::FifoWrite { pointer, bytes } => Some((*pointer, bytes.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn register_writes(&self, address: u8) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Write { address: a, bytes } if *a == address => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    /// Lands a frame in the RX region the way the modem does.
    pub fn deliver(&mut self, payload: &[u8]) {
        self.deliver_reported(payload, payload.len() as u8);
    }

    /// Hands the last transmitted frame to the receiver, as a peer would.
    pub fn loop_back(&mut self) {
        let frame = self.fifo(
            self.reg(REG_FIFO_TX_BASE_ADDR),
            self.reg(REG_PAYLOAD_LENGTH) as usize,
        );
        self.deliver(&frame);
    }

    /// Lands a frame but reports `reported` bytes in RegRxNbBytes.
    pub fn deliver_reported(&mut self, payload: &[u8], reported: u8) {
        let base = self.reg(REG_FIFO_RX_BASE_ADDR);
        for (i, byte) in payload.iter().enumerate() {
            self.fifo[(base as usize + i) % FIFO_SIZE] = *byte;
        }
        self.regs[REG_FIFO_RX_CURRENT_ADDR as usize] = base;
        self.regs[REG_RX_NB_BYTES as usize] = reported;
        self.regs[REG_IRQ_FLAGS as usize] |= IrqFlags::RX_DONE.bits();
    }

    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) {
        let mut header = None;
        let mut cursor = 0u8;

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let data = match header {
                        Some(_) => &bytes[..],
                        None => {
                            let Some((&first, rest)) = bytes.split_first() else {
                                continue;
                            };
                            header = Some(first);
                            cursor = first & !WRITE_BIT;
                            self.headers.push(first);
                            rest
                        }
                    };
                    if !data.is_empty() {
                        assert!(
                            header.is_some_and(|h| h & WRITE_BIT != 0),
                            "data phase on a read access"
                        );
                        cursor = self.write_at(cursor, data);
                    }
                }
                Operation::Read(buffer) => {
                    assert!(
                        header.is_some_and(|h| h & WRITE_BIT == 0),
                        "read phase on a write access"
                    );
                    cursor = self.read_at(cursor, buffer);
                }
                Operation::DelayNs(ns) => self.events.push(Event::Settle { ns: *ns }),
                Operation::Transfer(..) | Operation::TransferInPlace(_) => {
                    panic!("driver never uses full duplex transfers")
                }
            }
        }
    }

    fn write_at(&mut self, address: u8, data: &[u8]) -> u8 {
        if address == FIFO_ADDRESS {
            let pointer = self.reg(REG_FIFO_ADDR_PTR);
            let mut next = pointer;
            for byte in data {
                self.fifo[next as usize] = *byte;
                next = next.wrapping_add(1);
            }
            self.regs[REG_FIFO_ADDR_PTR as usize] = next;
            self.events.push(Event::FifoWrite {
                pointer,
                bytes: data.to_vec(),
            });
            return FIFO_ADDRESS;
        }

        self.events.push(Event::Write {
            address,
            bytes: data.to_vec(),
        });
        let mut next = address;
        for byte in data {
            self.write_reg(next, *byte);
            next += 1;
        }
        next
    }

    fn read_at(&mut self, address: u8, buffer: &mut [u8]) -> u8 {
        if address == FIFO_ADDRESS {
            let pointer = self.reg(REG_FIFO_ADDR_PTR);
            let mut next = pointer;
            for byte in buffer.iter_mut() {
                *byte = self.fifo[next as usize];
                next = next.wrapping_add(1);
            }
            self.regs[REG_FIFO_ADDR_PTR as usize] = next;
            self.events.push(Event::FifoRead {
                pointer,
                len: buffer.len(),
            });
            return FIFO_ADDRESS;
        }

        self.events.push(Event::Read {
            address,
            len: buffer.len(),
        });
        let mut next = address;
        for byte in buffer.iter_mut() {
            *byte = self.read_reg(next);
            next += 1;
        }
        next
    }

    fn write_reg(&mut self, address: u8, value: u8) {
        match address {
            REG_IRQ_FLAGS => self.regs[address as usize] &= !value,
            REG_OP_MODE => {
                self.regs[address as usize] = value;
                if let Ok(mode) = OperatingMode::try_from(value & 0x07) {
                    self.modes.push(mode);
                }
                self.tx_polls = 0;
            }
            a if READ_ONLY.contains(&a) => {}
            _ => self.regs[address as usize] = value,
        }
    }

    fn read_reg(&mut self, address: u8) -> u8 {
        if address == REG_IRQ_FLAGS && self.current_mode() == Some(OperatingMode::Transmit) {
            self.tx_polls += 1;
            if self.tx_done_after.is_some_and(|after| self.tx_polls > after) {
                self.regs[REG_IRQ_FLAGS as usize] |= IrqFlags::TX_DONE.bits();
                let op_mode = self.reg(REG_OP_MODE) & !0x07;
                self.regs[REG_OP_MODE as usize] = op_mode | OperatingMode::Standby as u8;
            }
        }
        self.regs[address as usize]
    }
}

pub type Shared = Rc<RefCell<Chip>>;

#[derive(Clone)]
pub struct SimSpi(Shared);

pub struct SimReset(Shared);

/// Delay that only accumulates the requested time.
#[derive(Clone, Default)]
pub struct SimDelay(Rc<RefCell<u64>>);

impl SimDelay {
    pub fn elapsed_ms(&self) -> u64 {
        *self.0.borrow() / 1_000_000
    }
}

/// A fresh chip and handles onto it.
pub fn sim() -> (Shared, SimSpi, SimReset, SimDelay) {
    let chip = Rc::new(RefCell::new(Chip::new()));
    (
        chip.clone(),
        SimSpi(chip.clone()),
        SimReset(chip),
        SimDelay::default(),
    )
}

impl embedded_hal::spi::ErrorType for SimSpi {
    type Error = Infallible;
}

impl embedded_hal::spi::SpiDevice for SimSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        self.0.borrow_mut().transaction(operations);
        Ok(())
    }
}

impl embedded_hal_async::spi::SpiDevice for SimSpi {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Infallible> {
        self.0.borrow_mut().transaction(operations);
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for SimReset {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for SimReset {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().reset_low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut chip = self.0.borrow_mut();
        if chip.reset_low {
            chip.reset_low = false;
            chip.load_defaults();
            chip.events.push(Event::Reset);
        }
        Ok(())
    }
}

impl embedded_hal::delay::DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += ns as u64;
    }
}

impl embedded_hal_async::delay::DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        *self.0.borrow_mut() += ns as u64;
    }
}
