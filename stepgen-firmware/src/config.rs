//! Axis configuration compiled in from stepgen.toml
//!
//! build.rs has already range-checked every value; [`axis`] runs the same
//! checks again through [`StepGenConfig::validate`] at boot.

use embassy_time::Duration;
use stepgen_core::StepGenConfig;

include!(concat!(env!("OUT_DIR"), "/stepgen_config.rs"));

/// Time spent cruising before each stop
pub const RUN_TIME: Duration = Duration::from_millis(RUN_MS);

/// Idle time between a completed stop and the next start
pub const IDLE_TIME: Duration = Duration::from_millis(IDLE_MS);

pub fn axis() -> StepGenConfig {
    StepGenConfig {
        step_pin: STEP_PIN,
        duty: DUTY,
        start_hz: START_HZ,
        target_hz: TARGET_HZ,
        end_hz: END_HZ,
        ramp_steps: RAMP_STEPS,
    }
}
