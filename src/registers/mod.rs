//! Register definitions for the SX1276 LoRa modem
//! Generated from the SX1276/77/78/79 datasheet, rev. 7

mod common;
mod fifo;
mod irq;
mod lora;

pub use common::*;
pub use fifo::*;
pub use irq::*;
pub use lora::*;
