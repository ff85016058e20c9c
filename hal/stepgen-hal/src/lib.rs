//! Stepgen Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the pulse engine drives. Chip
//! HALs (currently only RP2040) implement them, and `stepgen-core` programs
//! against them so the engine can be exercised on the host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  stepgen-firmware                       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stepgen-core (orchestrator, profiles)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  stepgen-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ stepgen-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`sequencer::PulseSequencer`] - one lane emitting (high, low) cycle pairs
//! - [`sequencer::LaneHalt`] - interrupt-safe "silence this lane" capability
//! - [`transfer::TransferController`] - autonomous word-copy channels
//! - [`transfer::ChannelPool`] - channel claim/release

#![no_std]
#![deny(unsafe_code)]

pub mod sequencer;
pub mod transfer;

// Re-export key traits at crate root for convenience
pub use sequencer::{EntryPoint, LaneHalt, PulseSequencer};
pub use transfer::{
    ChannelId, ChannelPool, PacingSignal, Ring, TransferConfig, TransferController, Trigger,
    WordSize,
};
