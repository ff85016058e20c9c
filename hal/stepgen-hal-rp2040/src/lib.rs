//! RP2040 backend for the stepgen pulse engine
//!
//! Implements the `stepgen-hal` traits on RP2040 peripherals:
//!
//! - [`sequencer::PioLane`] - a PIO state machine running the pulse program
//! - [`sequencer::PioLaneHalt`] - register-level lane shutdown for the
//!   completion interrupt
//! - [`dma::Rp2040Dma`] - DMA channel programming, completions on `DMA_IRQ_1`
//! - [`dma::DmaPool`] - DMA channels handed over from `embassy_rp::init`
//!
//! The firmware binds `DMA_IRQ_1` itself and calls the dispatcher from it.

#![no_std]

pub mod dma;
pub mod pio;
pub mod sequencer;

pub use dma::{DmaPool, Rp2040Dma, NUM_DMA_CHANNELS};
pub use pio::{EntryOffsets, PioBlock, StepGenProgram};
pub use sequencer::{PioLane, PioLaneHalt};
