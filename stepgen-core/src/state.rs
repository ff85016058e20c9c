//! Per-instance motion state
//!
//! ```text
//! Idle ──start──▶ RampingUp ──ramp done──▶ Cruising
//!  ▲                  ▲                       │
//!  │                  └────────start──────────┤
//!  │                                          stop
//!  └──stop complete── RampingDown ◀───────────┘
//! ```
//!
//! `start` from any state restarts the up-ramp. `stop` from any state
//! ramps down from the last recorded target frequency. `square_wave` and
//! `burst` move any state to `FixedRate`, which only `start`, `stop` or
//! `release` leave.

/// Where an instance is in its start/cruise/stop cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// Output silent
    #[default]
    Idle,
    /// Ramp channel streaming the up-ramp
    RampingUp,
    /// Steady channel re-reading the cruise pair
    Cruising,
    /// Stop channel streaming the down-ramp
    RampingDown,
    /// Lane running a square wave or burst on its own, no channels involved
    ///
    /// A burst parks the lane after its last pulse without reporting back,
    /// so this state persists until the next call.
    FixedRate,
}

impl MotionState {
    /// Check if pulses are being emitted
    pub fn is_running(&self) -> bool {
        !matches!(self, MotionState::Idle)
    }

    /// Check if the frequency is changing
    pub fn is_ramping(&self) -> bool {
        matches!(self, MotionState::RampingUp | MotionState::RampingDown)
    }
}
