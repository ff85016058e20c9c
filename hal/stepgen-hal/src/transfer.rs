//! Channel-transfer abstractions
//!
//! Channels copy words from memory into a peripheral register without CPU
//! involvement, paced by the peripheral's data-request signal. All channels
//! share one completion-pending bitmask and one interrupt line.

/// Hardware channel number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(pub u8);

impl ChannelId {
    /// Bit for this channel in the completion-pending mask
    pub const fn mask(self) -> u32 {
        1 << self.0
    }
}

/// Data-request signal number a transfer is paced by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacingSignal(pub u8);

/// Size of each transferred element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WordSize {
    Byte,
    HalfWord,
    Word,
}

/// Address wrapping applied to one side of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ring {
    /// Wrap the write address instead of the read address
    pub on_write: bool,
    /// Wrap after 2^size_bits bytes (buffer must be aligned to that size)
    pub size_bits: u8,
}

/// When a configured channel starts moving data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// Start immediately
    Now,
    /// Stay armed until another channel chains to it
    Deferred,
}

/// Full programming of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferConfig {
    pub read_addr: u32,
    pub write_addr: u32,
    pub word_size: WordSize,
    pub increment_read: bool,
    pub increment_write: bool,
    pub ring: Option<Ring>,
    pub pacing: PacingSignal,
    /// Channel to trigger once this one completes
    pub chain_to: Option<ChannelId>,
    /// Number of elements to move
    pub count: u32,
}

impl TransferConfig {
    /// Word-sized memory-to-peripheral transfer with an incrementing source
    pub fn to_peripheral(read_addr: u32, write_addr: u32, pacing: PacingSignal, count: u32) -> Self {
        Self {
            read_addr,
            write_addr,
            word_size: WordSize::Word,
            increment_read: true,
            increment_write: false,
            ring: None,
            pacing,
            chain_to: None,
            count,
        }
    }

    /// Wrap the read address after 2^size_bits bytes
    pub fn with_read_ring(mut self, size_bits: u8) -> Self {
        self.ring = Some(Ring {
            on_write: false,
            size_bits,
        });
        self
    }

    /// Trigger `next` when this transfer finishes
    pub fn with_chain_to(mut self, next: ChannelId) -> Self {
        self.chain_to = Some(next);
        self
    }
}

/// The channel-transfer controller
///
/// Methods taking `&self` are used from interrupt context.
pub trait TransferController {
    /// Program a channel and optionally start it
    fn configure(&mut self, channel: ChannelId, config: &TransferConfig, trigger: Trigger);

    /// Stop a channel and wait until it is idle; a no-op on an idle channel
    fn abort(&mut self, channel: ChannelId);

    /// Whether the channel is still moving data
    fn is_busy(&self, channel: ChannelId) -> bool;

    /// Route (or stop routing) the channel's completion to the interrupt line
    fn set_completion_irq(&mut self, channel: ChannelId, enabled: bool);

    /// Acknowledge a pending completion
    fn clear_completion(&self, channel: ChannelId);

    /// Snapshot of the completion-pending mask for the shared interrupt line
    fn pending_completions(&self) -> u32;

    /// Unmask the shared interrupt line at the interrupt controller
    fn enable_interrupt_line(&mut self);
}

/// Allocation of channels to owners
pub trait ChannelPool {
    /// Claim any unused channel
    fn claim(&mut self) -> Option<ChannelId>;

    /// Return a channel to the pool
    fn release(&mut self, channel: ChannelId);
}
