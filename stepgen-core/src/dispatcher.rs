//! Completion interrupt dispatcher
//!
//! One dispatcher serves every instance sharing the transfer controller's
//! interrupt line. Each invocation snapshots the completion-pending mask
//! once, then silences the lane behind every armed stop channel found in it.
//! Distinct instances never share a channel, so simultaneous completions
//! are handled independently.
//!
//! [`CompletionDispatcher::dispatch`] is the only code here that runs in
//! interrupt context. It does not block beyond a short critical section and
//! never allocates.

use core::sync::atomic::{AtomicBool, Ordering};

use stepgen_hal::{ChannelId, LaneHalt, TransferController};

use crate::error::RegistryError;
use crate::registry::{InstanceRegistry, Registration};

/// Shared stop-completion handler with its registry
pub struct CompletionDispatcher<H, const N: usize> {
    registry: InstanceRegistry<H, N>,
    installed: AtomicBool,
}

impl<H, const N: usize> Default for CompletionDispatcher<H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, const N: usize> CompletionDispatcher<H, N> {
    /// Create a dispatcher with an empty registry (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            registry: InstanceRegistry::new(),
            installed: AtomicBool::new(false),
        }
    }

    /// Bind a stop channel to the lane it silences
    pub fn register(&self, channel: ChannelId, target: H) -> Result<Registration<'_>, RegistryError> {
        self.registry.register(channel, target)
    }

    /// Drop a binding
    pub fn deregister(&self, registration: Registration<'_>) -> Result<(), RegistryError> {
        self.registry.deregister(registration)
    }

    pub fn registry(&self) -> &InstanceRegistry<H, N> {
        &self.registry
    }

    /// Run `enable_line` the first time only
    ///
    /// Returns whether this call performed the installation. Only called
    /// from the foreground during setup.
    pub fn install(&self, enable_line: impl FnOnce()) -> bool {
        if self.installed.load(Ordering::Acquire) {
            return false;
        }
        self.installed.store(true, Ordering::Release);
        enable_line();
        true
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }
}

impl<H: LaneHalt, const N: usize> CompletionDispatcher<H, N> {
    /// Handle one interrupt; returns how many lanes were silenced
    ///
    /// Pending bits that match no binding are left alone. A bound channel
    /// that completes while disarmed is acknowledged but does not silence
    /// its lane: it belongs to a stop that a later `start` superseded.
    pub fn dispatch<C: TransferController + ?Sized>(&self, controller: &C) -> usize {
        let pending = controller.pending_completions();
        if pending == 0 {
            return 0;
        }

        let mut halted = 0;
        self.registry.for_each(|channel, target, armed| {
            if pending & channel.mask() == 0 {
                return;
            }
            controller.clear_completion(channel);

            if armed.load(Ordering::Acquire) {
                armed.store(false, Ordering::Release);
                target.on_stop_complete();
                halted += 1;
                trace!("stop complete: channel {}", channel.0);
            } else {
                trace!("stale completion dropped: channel {}", channel.0);
            }
        });
        halted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockDma, MockLane};

    #[test]
    fn test_install_runs_once() {
        let dispatcher = CompletionDispatcher::<u8, 1>::new();
        let mut calls = 0;
        assert!(dispatcher.install(|| calls += 1));
        assert!(!dispatcher.install(|| calls += 1));
        assert_eq!(calls, 1);
        assert!(dispatcher.is_installed());
    }

    #[test]
    fn test_dispatch_silences_only_armed_match() {
        let dma = MockDma::new();
        let lane_a = MockLane::new(1);
        let lane_b = MockLane::new(2);
        let dispatcher = CompletionDispatcher::<_, 2>::new();

        let a = dispatcher.register(ChannelId(2), lane_a.halt()).unwrap();
        let _b = dispatcher.register(ChannelId(5), lane_b.halt()).unwrap();
        a.arm();

        dma.raise(ChannelId(2));
        assert_eq!(dispatcher.dispatch(&dma), 1);
        assert_eq!(lane_a.halts(), 1);
        assert_eq!(lane_b.halts(), 0);
        assert!(!a.is_armed());
        assert_eq!(dma.pending_completions(), 0);
    }

    #[test]
    fn test_dispatch_simultaneous_completions() {
        let dma = MockDma::new();
        let lanes = [MockLane::new(0), MockLane::new(1), MockLane::new(2)];
        let dispatcher = CompletionDispatcher::<_, 4>::new();

        let regs: std::vec::Vec<_> = lanes
            .iter()
            .enumerate()
            .map(|(i, lane)| dispatcher.register(ChannelId(3 * i as u8 + 2), lane.halt()).unwrap())
            .collect();
        regs[0].arm();
        regs[2].arm();

        dma.raise(ChannelId(2));
        dma.raise(ChannelId(8));
        assert_eq!(dispatcher.dispatch(&dma), 2);
        assert_eq!(lanes[0].halts(), 1);
        assert_eq!(lanes[1].halts(), 0);
        assert_eq!(lanes[2].halts(), 1);
    }

    #[test]
    fn test_foreign_bits_ignored() {
        let dma = MockDma::new();
        let lane = MockLane::new(0);
        let dispatcher = CompletionDispatcher::<_, 2>::new();
        let reg = dispatcher.register(ChannelId(4), lane.halt()).unwrap();
        reg.arm();

        dma.raise(ChannelId(0));
        dma.raise(ChannelId(11));
        assert_eq!(dispatcher.dispatch(&dma), 0);
        assert_eq!(lane.halts(), 0);
        assert!(reg.is_armed());
        // Foreign bits belong to someone else's handler
        assert_eq!(dma.pending_completions(), ChannelId(0).mask() | ChannelId(11).mask());
    }

    #[test]
    fn test_stale_completion_dropped() {
        let dma = MockDma::new();
        let lane = MockLane::new(0);
        let dispatcher = CompletionDispatcher::<_, 1>::new();
        let _reg = dispatcher.register(ChannelId(6), lane.halt()).unwrap();

        dma.raise(ChannelId(6));
        assert_eq!(dispatcher.dispatch(&dma), 0);
        assert_eq!(lane.halts(), 0);
        assert_eq!(dma.pending_completions(), 0);
    }
}
