//! Error types
//!
//! Runtime parameters (frequencies, step counts, duty) are clamped rather
//! than rejected, so these only surface at setup time or from explicit
//! buffer and config operations.

/// Instance creation failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// Fewer than three transfer channels were free
    ChannelsExhausted,
    /// The stop channel could not be bound to the dispatcher
    Registry(RegistryError),
}

impl From<RegistryError> for InitError {
    fn from(e: RegistryError) -> Self {
        InitError::Registry(e)
    }
}

/// Dispatcher registration failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// Every binding slot is in use
    Full,
    /// The channel is already bound to another instance
    ChannelTaken,
    /// The registration was issued by a different registry
    ForeignRegistration,
}

/// Pair buffer failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BufferError {
    /// More pairs were offered than the buffer can hold
    CapacityExceeded { requested: usize, capacity: usize },
}

/// Configuration validation failures
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Step pin is not a bank-0 GPIO
    InvalidPin(u8),
    /// Duty cycle must be strictly between 0 and 1
    InvalidDuty(f32),
    /// Frequencies must be finite and at least 0.1 Hz
    InvalidFrequency(f32),
    /// Ramps need at least two steps
    InvalidRampSteps(u16),
}
