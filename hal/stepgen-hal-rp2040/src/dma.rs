//! DMA channels as pulse transfer channels
//!
//! embassy-rp services `DMA_IRQ_0` for its own transfers and unmasks every
//! channel there. Completions here are routed through `DMA_IRQ_1` instead,
//! and each channel claimed by [`DmaPool`] is masked out of `INTE0` so the
//! embassy handler never acknowledges them first.

use core::sync::atomic::{compiler_fence, Ordering};

use embassy_rp::dma::{AnyChannel, Channel};
use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_rp::pac;
use embassy_rp::pac::dma::regs::CtrlTrig;
use embassy_rp::pac::dma::vals::{DataSize, TreqSel};
use embassy_rp::Peri;
use heapless::Vec;
use stepgen_hal::{
    ChannelId, ChannelPool, TransferConfig, TransferController, Trigger, WordSize,
};

/// DMA channels on the RP2040
pub const NUM_DMA_CHANNELS: usize = 12;

/// Interrupt index used for completions (`INTE1`/`INTS1`)
const COMPLETION_IRQ: usize = 1;

/// Index embassy-rp uses for its own channels
const EMBASSY_IRQ: usize = 0;

/// Priority of the completion interrupt; above embassy's DMA handler
const COMPLETION_PRIORITY: Priority = Priority::P1;

/// Register-level DMA controller
///
/// Holds no state, so a fresh one can be made inside the interrupt handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rp2040Dma {
    _private: (),
}

impl Rp2040Dma {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

fn data_size(word_size: WordSize) -> DataSize {
    match word_size {
        WordSize::Byte => DataSize::SIZE_BYTE,
        WordSize::HalfWord => DataSize::SIZE_HALFWORD,
        WordSize::Word => DataSize::SIZE_WORD,
    }
}

impl TransferController for Rp2040Dma {
    fn configure(&mut self, channel: ChannelId, config: &TransferConfig, trigger: Trigger) {
        let ch = pac::DMA.ch(usize::from(channel.0));

        ch.read_addr().write_value(config.read_addr);
        ch.write_addr().write_value(config.write_addr);
        ch.trans_count().write_value(config.count);

        let mut ctrl = CtrlTrig(0);
        ctrl.set_en(true);
        ctrl.set_data_size(data_size(config.word_size));
        ctrl.set_incr_read(config.increment_read);
        ctrl.set_incr_write(config.increment_write);
        if let Some(ring) = config.ring {
            ctrl.set_ring_sel(ring.on_write);
            ctrl.set_ring_size(ring.size_bits);
        }
        ctrl.set_treq_sel(TreqSel::from_bits(config.pacing.0));
        // Chaining to itself disables chaining
        ctrl.set_chain_to(config.chain_to.unwrap_or(channel).0);

        compiler_fence(Ordering::SeqCst);

        match trigger {
            Trigger::Now => ch.ctrl_trig().write_value(ctrl),
            Trigger::Deferred => ch.al1_ctrl().write_value(ctrl.0),
        }
    }

    fn abort(&mut self, channel: ChannelId) {
        let mask = channel.mask();
        pac::DMA.chan_abort().write(|w| w.set_chan_abort(mask as u16));
        while pac::DMA.chan_abort().read().chan_abort() & (mask as u16) != 0 {}
        compiler_fence(Ordering::SeqCst);
    }

    fn is_busy(&self, channel: ChannelId) -> bool {
        pac::DMA.ch(usize::from(channel.0)).ctrl_trig().read().busy()
    }

    fn set_completion_irq(&mut self, channel: ChannelId, enabled: bool) {
        let mask = channel.mask();
        pac::DMA.inte(COMPLETION_IRQ).modify(|w| {
            if enabled {
                *w |= mask;
            } else {
                *w &= !mask;
            }
        });
    }

    fn clear_completion(&self, channel: ChannelId) {
        pac::DMA.ints(COMPLETION_IRQ).write_value(channel.mask());
    }

    fn pending_completions(&self) -> u32 {
        pac::DMA.ints(COMPLETION_IRQ).read()
    }

    fn enable_interrupt_line(&mut self) {
        interrupt::DMA_IRQ_1.set_priority(COMPLETION_PRIORITY);
        // SAFETY: the handler only touches lanes through the dispatcher's
        // registry, which is guarded by a critical section.
        unsafe { interrupt::DMA_IRQ_1.enable() };
    }
}

/// Pool of DMA channels handed over at startup
pub struct DmaPool<'d> {
    free: Vec<Peri<'d, AnyChannel>, NUM_DMA_CHANNELS>,
    claimed: Vec<Peri<'d, AnyChannel>, NUM_DMA_CHANNELS>,
}

impl<'d> DmaPool<'d> {
    pub fn new(channels: impl IntoIterator<Item = Peri<'d, AnyChannel>>) -> Self {
        let mut free = Vec::new();
        for ch in channels {
            if free.push(ch).is_err() {
                break;
            }
        }
        Self {
            free,
            claimed: Vec::new(),
        }
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }
}

impl<'d> ChannelPool for DmaPool<'d> {
    fn claim(&mut self) -> Option<ChannelId> {
        let ch = self.free.pop()?;
        let id = ChannelId(ch.number());

        pac::DMA.inte(EMBASSY_IRQ).modify(|w| *w &= !id.mask());

        // Both vecs share one capacity and a channel lives in exactly one
        if let Err(ch) = self.claimed.push(ch) {
            let _ = self.free.push(ch);
            return None;
        }
        Some(id)
    }

    fn release(&mut self, channel: ChannelId) {
        let Some(pos) = self.claimed.iter().position(|ch| ch.number() == channel.0) else {
            return;
        };
        let ch = self.claimed.swap_remove(pos);
        let _ = self.free.push(ch);
    }
}
