//! Board-agnostic core of the stepgen pulse engine
//!
//! This crate contains everything that does not touch registers directly:
//!
//! - Cycle math (frequency/period to high/low cycle pairs)
//! - S-curve ramp profile generation
//! - Bounded pair buffers that transfer channels read from
//! - The channel orchestrator ([`StepGen`]) that chains ramp and cruise
//!   transfers and arms the interrupt-driven stop
//! - The completion dispatcher and its instance registry
//! - Configuration type definitions
//!
//! Hardware is reached only through the `stepgen-hal` traits.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

pub mod buffer;
pub mod config;
pub mod cycles;
pub mod dispatcher;
pub mod error;
pub mod profile;
pub mod registry;
pub mod state;
pub mod stepgen;

#[cfg(test)]
pub(crate) mod mock;

pub use buffer::{CyclePair, PairBuffer, SteadyBuffer};
pub use config::StepGenConfig;
pub use cycles::{split, Period};
pub use dispatcher::CompletionDispatcher;
pub use error::{BufferError, ConfigError, InitError, RegistryError};
pub use profile::build_ramp;
pub use registry::{InstanceRegistry, Registration};
pub use state::MotionState;
pub use stepgen::{StepGen, DEFAULT_MAX_STEPS};
