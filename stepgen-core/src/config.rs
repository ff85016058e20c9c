//! Configuration type definitions
//!
//! Defaults reproduce the reference bench setup: STEP on GPIO16, 10 Hz to
//! 1 kHz over 128 samples at 50% duty.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cycles::MIN_FREQUENCY_HZ;
use crate::error::ConfigError;
use crate::profile::MIN_RAMP_STEPS;

/// Number of bank-0 GPIOs usable as a STEP output
pub const NUM_BANK0_GPIOS: u8 = 30;

/// Per-axis pulse generator configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepGenConfig {
    /// STEP output GPIO
    pub step_pin: u8,
    /// High fraction of each period
    pub duty: f32,
    /// Frequency the up-ramp starts from (Hz)
    pub start_hz: f32,
    /// Cruise frequency (Hz); also used if `stop` precedes any `start`
    pub target_hz: f32,
    /// Frequency the down-ramp ends at (Hz)
    pub end_hz: f32,
    /// Samples per ramp
    pub ramp_steps: u16,
}

impl Default for StepGenConfig {
    fn default() -> Self {
        Self {
            step_pin: 16,
            duty: 0.5,
            start_hz: 10.0,
            target_hz: 1000.0,
            end_hz: 10.0,
            ramp_steps: 128,
        }
    }
}

impl StepGenConfig {
    /// Check every field is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_pin >= NUM_BANK0_GPIOS {
            return Err(ConfigError::InvalidPin(self.step_pin));
        }
        if !(self.duty > 0.0 && self.duty < 1.0) {
            return Err(ConfigError::InvalidDuty(self.duty));
        }
        for freq in [self.start_hz, self.target_hz, self.end_hz] {
            if !freq.is_finite() || freq < MIN_FREQUENCY_HZ {
                return Err(ConfigError::InvalidFrequency(freq));
            }
        }
        if usize::from(self.ramp_steps) < MIN_RAMP_STEPS {
            return Err(ConfigError::InvalidRampSteps(self.ramp_steps));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(StepGenConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_out_of_range_fields() {
        let base = StepGenConfig::default();

        let cfg = StepGenConfig { step_pin: 30, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidPin(30)));

        let cfg = StepGenConfig { duty: 1.0, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidDuty(1.0)));

        let cfg = StepGenConfig { target_hz: 0.05, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidFrequency(0.05)));

        let cfg = StepGenConfig { end_hz: f32::INFINITY, ..base.clone() };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidFrequency(f32::INFINITY)));

        let cfg = StepGenConfig { ramp_steps: 1, ..base };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRampSteps(1)));
    }

    #[test]
    fn test_nan_duty_rejected() {
        let cfg = StepGenConfig { duty: f32::NAN, ..StepGenConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDuty(_))));
    }
}
