//! Pulse sequencer abstractions
//!
//! A sequencer lane consumes 32-bit words from a feed queue and turns each
//! (high, low) pair into one output period, counting system clock cycles.

/// Program entry points a lane can be forced into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryPoint {
    /// Pop one (high, low) pair, then repeat it forever
    Indefinite,
    /// Pop a count, then one pair, emit count + 1 pulses and halt
    Burst,
    /// Pop pairs continuously; the pin idles low while the feed is empty
    DmaStream,
}

/// One hardware pulse sequencer lane
///
/// `set_pin_level` only takes effect while the lane is disabled.
pub trait PulseSequencer {
    /// Interrupt-side handle for this lane
    type Halt: LaneHalt;

    /// Start or stop instruction execution
    fn set_enabled(&mut self, enabled: bool);

    /// Drop every word still queued in the feed
    fn clear_queue(&mut self);

    /// Execute an immediate jump to one of the program entry points
    fn force_jump(&mut self, entry: EntryPoint);

    /// Drive the output pin to a fixed level
    fn set_pin_level(&mut self, high: bool);

    /// Push one word, waiting for room in the feed
    fn push_blocking(&mut self, word: u32);

    /// Bus address of the feed register, used as a transfer destination
    fn feed_address(&self) -> u32;

    /// Data-request signal raised while the feed has room
    fn pacing_signal(&self) -> crate::transfer::PacingSignal;

    /// Frequency of the clock the lane counts, in Hz
    fn clock_hz(&self) -> u32;

    /// Handle the completion interrupt uses to silence this lane
    fn halt_handle(&self) -> Self::Halt;
}

/// Capability to silence a lane from interrupt context
///
/// Implementations must not block, allocate, or take locks that the
/// foreground could hold for long.
pub trait LaneHalt {
    /// Disable the lane, force its pin low, and clear its queue
    fn on_stop_complete(&self);
}
