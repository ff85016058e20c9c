//! Host-side stand-ins for the sequencer, transfer controller and channel
//! pool. Clones share state so a test can keep a handle after moving one
//! into a `StepGen`.

use core::cell::RefCell;
use std::rc::Rc;
use std::vec::Vec;

use stepgen_hal::{
    ChannelId, ChannelPool, EntryPoint, LaneHalt, PacingSignal, PulseSequencer, TransferConfig,
    TransferController, Trigger,
};

pub const CLOCK_HZ: u32 = 125_000_000;
pub const NUM_CHANNELS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneOp {
    Enable(bool),
    ClearQueue,
    Jump(EntryPoint),
    PinLevel(bool),
}

#[derive(Debug, Default)]
struct LaneState {
    enabled: bool,
    pin_high: bool,
    entry: Option<EntryPoint>,
    queue: Vec<u32>,
    ops: Vec<LaneOp>,
    halts: u32,
}

#[derive(Debug, Clone)]
pub struct MockLane {
    id: u8,
    state: Rc<RefCell<LaneState>>,
}

impl MockLane {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            state: Rc::new(RefCell::new(LaneState::default())),
        }
    }

    pub fn halt(&self) -> MockHalt {
        MockHalt(self.state.clone())
    }

    pub fn halts(&self) -> u32 {
        self.state.borrow().halts
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn pin_high(&self) -> bool {
        self.state.borrow().pin_high
    }

    pub fn entry(&self) -> Option<EntryPoint> {
        self.state.borrow().entry
    }

    pub fn queue(&self) -> Vec<u32> {
        self.state.borrow().queue.clone()
    }

    pub fn ops(&self) -> Vec<LaneOp> {
        self.state.borrow().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }
}

impl PulseSequencer for MockLane {
    type Halt = MockHalt;

    fn set_enabled(&mut self, enabled: bool) {
        let mut s = self.state.borrow_mut();
        s.enabled = enabled;
        s.ops.push(LaneOp::Enable(enabled));
    }

    fn clear_queue(&mut self) {
        let mut s = self.state.borrow_mut();
        s.queue.clear();
        s.ops.push(LaneOp::ClearQueue);
    }

    fn force_jump(&mut self, entry: EntryPoint) {
        let mut s = self.state.borrow_mut();
        s.entry = Some(entry);
        s.ops.push(LaneOp::Jump(entry));
    }

    fn set_pin_level(&mut self, high: bool) {
        let mut s = self.state.borrow_mut();
        if !s.enabled {
            s.pin_high = high;
        }
        s.ops.push(LaneOp::PinLevel(high));
    }

    fn push_blocking(&mut self, word: u32) {
        self.state.borrow_mut().queue.push(word);
    }

    fn feed_address(&self) -> u32 {
        0x5020_0010 + 4 * u32::from(self.id)
    }

    fn pacing_signal(&self) -> PacingSignal {
        PacingSignal(self.id)
    }

    fn clock_hz(&self) -> u32 {
        CLOCK_HZ
    }

    fn halt_handle(&self) -> MockHalt {
        self.halt()
    }
}

#[derive(Debug, Clone)]
pub struct MockHalt(Rc<RefCell<LaneState>>);

impl LaneHalt for MockHalt {
    fn on_stop_complete(&self) {
        let mut s = self.0.borrow_mut();
        s.enabled = false;
        s.pin_high = false;
        s.queue.clear();
        s.halts += 1;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ChannelState {
    pub config: Option<TransferConfig>,
    pub trigger: Option<Trigger>,
    /// Configured and not yet finished or aborted
    pub armed: bool,
    /// Moving data right now
    pub busy: bool,
    pub irq_enabled: bool,
    pub aborts: u32,
}

#[derive(Debug, Default)]
struct DmaState {
    channels: [ChannelState; NUM_CHANNELS],
    pending: u32,
    line_enables: u32,
    abort_latches: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockDma {
    state: Rc<RefCell<DmaState>>,
}

impl MockDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, ch: ChannelId) -> ChannelState {
        self.state.borrow().channels[ch.0 as usize]
    }

    pub fn line_enables(&self) -> u32 {
        self.state.borrow().line_enables
    }

    /// Make every abort latch a completion, as RP2040 erratum E13 does
    pub fn set_abort_latches(&self, latches: bool) {
        self.state.borrow_mut().abort_latches = latches;
    }

    /// Set a pending bit without touching channel state
    pub fn raise(&self, ch: ChannelId) {
        self.state.borrow_mut().pending |= ch.mask();
    }

    /// Finish the channel's transfer, following its chain link
    pub fn complete(&self, ch: ChannelId) {
        let mut s = self.state.borrow_mut();
        let channel = &mut s.channels[ch.0 as usize];
        channel.busy = false;
        channel.armed = false;
        let irq = channel.irq_enabled;
        let chain = channel.config.and_then(|c| c.chain_to);

        if irq {
            s.pending |= ch.mask();
        }
        if let Some(next) = chain {
            let next = &mut s.channels[next.0 as usize];
            if next.armed {
                next.busy = true;
            }
        }
    }
}

impl TransferController for MockDma {
    fn configure(&mut self, channel: ChannelId, config: &TransferConfig, trigger: Trigger) {
        let mut s = self.state.borrow_mut();
        let ch = &mut s.channels[channel.0 as usize];
        ch.config = Some(*config);
        ch.trigger = Some(trigger);
        ch.armed = true;
        ch.busy = trigger == Trigger::Now;
    }

    fn abort(&mut self, channel: ChannelId) {
        let mut s = self.state.borrow_mut();
        let ch = &mut s.channels[channel.0 as usize];
        ch.armed = false;
        ch.busy = false;
        ch.aborts += 1;
        if s.abort_latches {
            s.pending |= channel.mask();
        }
    }

    fn is_busy(&self, channel: ChannelId) -> bool {
        self.state.borrow().channels[channel.0 as usize].busy
    }

    fn set_completion_irq(&mut self, channel: ChannelId, enabled: bool) {
        self.state.borrow_mut().channels[channel.0 as usize].irq_enabled = enabled;
    }

    fn clear_completion(&self, channel: ChannelId) {
        self.state.borrow_mut().pending &= !channel.mask();
    }

    fn pending_completions(&self) -> u32 {
        self.state.borrow().pending
    }

    fn enable_interrupt_line(&mut self) {
        self.state.borrow_mut().line_enables += 1;
    }
}

#[derive(Debug, Clone)]
pub struct MockPool {
    pub free: Vec<u8>,
    pub released: Vec<u8>,
}

impl MockPool {
    pub fn with_channels(channels: &[u8]) -> Self {
        Self {
            free: channels.to_vec(),
            released: Vec::new(),
        }
    }
}

impl ChannelPool for MockPool {
    fn claim(&mut self) -> Option<ChannelId> {
        if self.free.is_empty() {
            return None;
        }
        Some(ChannelId(self.free.remove(0)))
    }

    fn release(&mut self, channel: ChannelId) {
        self.free.push(channel.0);
        self.released.push(channel.0);
    }
}
