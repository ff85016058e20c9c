//! Channel orchestrator
//!
//! One [`StepGen`] drives one axis: a sequencer lane plus three transfer
//! channels.
//!
//! - **ramp**: one-shot, streams the up-ramp table, then chains to steady
//! - **steady**: re-reads the 2-word cruise pair forever through an 8-byte
//!   read ring
//! - **stop**: one-shot, streams the down-ramp table; its completion
//!   interrupt silences the lane
//!
//! Every transfer is paced by the lane's data-request signal, so once a
//! `start` or `stop` returns the hardware runs without the CPU.
//!
//! # Buffer lifetime
//!
//! Transfers read the instance's own buffers by address. Once `start` or
//! `stop` has been called the instance must not move until it has been
//! stopped or released; keep it in a `static` cell.
//!
//! # Ordering against the completion interrupt
//!
//! `start`, the blocking helpers and `release` disarm the stop channel
//! (interrupt masked, pending flag cleared, registry entry disarmed) before
//! touching any channel, so a completion left over from an earlier stop can
//! never silence a lane that has just been restarted. `stop` arms only after
//! all channels are aborted and the lane is re-synchronised.

use stepgen_hal::{
    ChannelId, ChannelPool, EntryPoint, PulseSequencer, TransferConfig, TransferController,
    Trigger,
};

use crate::buffer::{PairBuffer, SteadyBuffer};
use crate::config::StepGenConfig;
use crate::cycles::{self, Period, MIN_FREQUENCY_HZ};
use crate::dispatcher::CompletionDispatcher;
use crate::error::InitError;
use crate::profile::{self, MIN_RAMP_STEPS};
use crate::registry::Registration;
use crate::state::MotionState;

/// Default ramp table capacity, in (high, low) pairs
pub const DEFAULT_MAX_STEPS: usize = 256;

/// Transfer count for the steady stream; never reached in practice
const UNBOUNDED_COUNT: u32 = u32::MAX;

/// S-curve pulse generator for one axis
pub struct StepGen<'d, S, D, const MAX_STEPS: usize = DEFAULT_MAX_STEPS>
where
    S: PulseSequencer,
    D: TransferController,
{
    lane: S,
    dma: D,

    ramp_ch: ChannelId,
    steady_ch: ChannelId,
    stop_ch: ChannelId,
    stop_binding: Registration<'d>,

    duty: f32,
    start_hz: f32,
    target_hz: f32,
    ramp_steps: usize,
    state: MotionState,

    ramp_buf: PairBuffer<MAX_STEPS>,
    stop_buf: PairBuffer<MAX_STEPS>,
    steady_buf: SteadyBuffer,
}

impl<'d, S, D, const MAX_STEPS: usize> StepGen<'d, S, D, MAX_STEPS>
where
    S: PulseSequencer,
    D: TransferController,
{
    const CAPACITY_CHECK: () = assert!(
        MAX_STEPS >= MIN_RAMP_STEPS,
        "ramp buffers need at least two pairs"
    );

    /// Claim three channels and bind the stop channel to `dispatcher`
    ///
    /// The first instance created also unmasks the shared interrupt line.
    /// Running out of channels is a setup failure; nothing is left claimed.
    pub fn new<P, const R: usize>(
        lane: S,
        mut dma: D,
        pool: &mut P,
        dispatcher: &'d CompletionDispatcher<S::Halt, R>,
        config: &StepGenConfig,
    ) -> Result<Self, InitError>
    where
        P: ChannelPool,
    {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_CHECK;

        let [ramp_ch, steady_ch, stop_ch] = claim_channels(pool)?;

        let stop_binding = match dispatcher.register(stop_ch, lane.halt_handle()) {
            Ok(binding) => binding,
            Err(e) => {
                warn!("stop channel {} could not be registered", stop_ch.0);
                for ch in [ramp_ch, steady_ch, stop_ch] {
                    pool.release(ch);
                }
                return Err(e.into());
            }
        };

        if dispatcher.install(|| dma.enable_interrupt_line()) {
            debug!("completion interrupt line enabled");
        }

        info!(
            "stepgen ready: ramp={} steady={} stop={}",
            ramp_ch.0, steady_ch.0, stop_ch.0
        );

        Ok(Self {
            lane,
            dma,
            ramp_ch,
            steady_ch,
            stop_ch,
            stop_binding,
            duty: config.duty,
            start_hz: config.start_hz,
            target_hz: config.target_hz,
            ramp_steps: usize::from(config.ramp_steps).clamp(MIN_RAMP_STEPS, MAX_STEPS),
            state: MotionState::Idle,
            ramp_buf: PairBuffer::new(),
            stop_buf: PairBuffer::new(),
            steady_buf: SteadyBuffer::new(),
        })
    }

    /// Ramp from `f_start_hz` to `f_target_hz`, then cruise indefinitely
    ///
    /// `ramp_steps` is clamped to `[2, MAX_STEPS]`. Any transfer already in
    /// flight, including a down-ramp, is abandoned.
    pub fn start(&mut self, f_start_hz: f32, f_target_hz: f32, duty: f32, ramp_steps: usize) {
        let steps = ramp_steps.clamp(MIN_RAMP_STEPS, MAX_STEPS);
        self.start_hz = f_start_hz;
        self.target_hz = f_target_hz;
        self.duty = duty;
        self.ramp_steps = steps;

        self.quiesce();

        let clock_hz = self.lane.clock_hz();
        self.refill(
            BufferSel::Ramp,
            profile::build_ramp(clock_hz, steps, f_start_hz, f_target_hz, duty),
        );
        self.steady_buf
            .set(cycles::pair_for_frequency(clock_hz, f_target_hz, duty));

        self.resync(EntryPoint::DmaStream);

        let feed = self.lane.feed_address();
        let pacing = self.lane.pacing_signal();

        let steady = TransferConfig::to_peripheral(
            self.steady_buf.read_address(),
            feed,
            pacing,
            UNBOUNDED_COUNT,
        )
        .with_read_ring(SteadyBuffer::RING_SIZE_BITS);
        self.dma.configure(self.steady_ch, &steady, Trigger::Deferred);

        let ramp = TransferConfig::to_peripheral(
            self.ramp_buf.read_address(),
            feed,
            pacing,
            self.ramp_buf.word_count(),
        )
        .with_chain_to(self.steady_ch);
        self.dma.configure(self.ramp_ch, &ramp, Trigger::Now);

        self.state = MotionState::RampingUp;
        debug!(
            "start: {} Hz -> {} Hz over {} steps",
            f_start_hz, f_target_hz, steps
        );
    }

    /// Ramp down from the recorded cruise frequency to `f_end_hz`
    ///
    /// Once the down-ramp has drained, the completion interrupt disables the
    /// lane and drives its pin low. Called before any `start`, the ramp
    /// begins from the configured target frequency.
    pub fn stop(&mut self, f_end_hz: f32, ramp_steps: usize) {
        let steps = ramp_steps.clamp(MIN_RAMP_STEPS, MAX_STEPS);
        let f_end_hz = f_end_hz.max(MIN_FREQUENCY_HZ);

        self.quiesce();

        let clock_hz = self.lane.clock_hz();
        self.refill(
            BufferSel::Stop,
            profile::build_ramp(clock_hz, steps, self.target_hz, f_end_hz, self.duty),
        );

        self.resync(EntryPoint::DmaStream);

        self.stop_binding.arm();
        self.dma.set_completion_irq(self.stop_ch, true);

        let stop = TransferConfig::to_peripheral(
            self.stop_buf.read_address(),
            self.lane.feed_address(),
            self.lane.pacing_signal(),
            self.stop_buf.word_count(),
        );
        self.dma.configure(self.stop_ch, &stop, Trigger::Now);

        self.state = MotionState::RampingDown;
        debug!(
            "stop: {} Hz -> {} Hz over {} steps",
            self.target_hz, f_end_hz, steps
        );
    }

    /// Emit a fixed square wave until the next `start`, `stop` or helper call
    ///
    /// Blocks only until the pair fits in the lane's queue.
    pub fn square_wave(&mut self, period: Period, duty: f32) {
        let pair = cycles::split(period.total_cycles(self.lane.clock_hz()), duty);

        self.quiesce();
        self.resync(EntryPoint::Indefinite);

        self.lane.push_blocking(pair.high);
        self.lane.push_blocking(pair.low);
        self.state = MotionState::FixedRate;
    }

    /// Emit exactly `count` pulses, then let the lane halt itself
    ///
    /// A zero count does nothing.
    pub fn burst(&mut self, count: u32, period: Period, duty: f32) {
        if count == 0 {
            return;
        }
        let pair = cycles::split(period.total_cycles(self.lane.clock_hz()), duty);

        self.quiesce();
        self.resync(EntryPoint::Burst);

        // The lane loop runs once more than the count it pops
        self.lane.push_blocking(count - 1);
        self.lane.push_blocking(pair.high);
        self.lane.push_blocking(pair.low);
        self.state = MotionState::FixedRate;
    }

    /// Current motion state
    ///
    /// Cruising is inferred from the ramp channel having finished; Idle after
    /// a stop from the dispatcher having consumed the armed completion.
    pub fn state(&self) -> MotionState {
        match self.state {
            MotionState::RampingUp if !self.dma.is_busy(self.ramp_ch) => MotionState::Cruising,
            MotionState::RampingDown if !self.stop_binding.is_armed() => MotionState::Idle,
            state => state,
        }
    }

    /// Tear the instance down and hand back its lane and controller
    ///
    /// Output is silenced, all three channels are aborted and returned to
    /// `pool`, and the stop binding is removed from `dispatcher`. Passing a
    /// dispatcher other than the one given to [`StepGen::new`] leaves every
    /// registry untouched; the stale binding stays disarmed.
    pub fn release<P, const R: usize>(
        mut self,
        pool: &mut P,
        dispatcher: &'d CompletionDispatcher<S::Halt, R>,
    ) -> (S, D)
    where
        P: ChannelPool,
    {
        self.lane.set_enabled(false);
        self.lane.set_pin_level(false);
        self.lane.clear_queue();

        self.quiesce();

        for ch in [self.ramp_ch, self.steady_ch, self.stop_ch] {
            pool.release(ch);
        }
        if let Err(e) = dispatcher.deregister(self.stop_binding) {
            warn!("stop binding left in place: {}", e);
        }
        info!("stepgen released");

        (self.lane, self.dma)
    }

    /// Channels as (ramp, steady, stop)
    pub fn channels(&self) -> (ChannelId, ChannelId, ChannelId) {
        (self.ramp_ch, self.steady_ch, self.stop_ch)
    }

    /// Cruise frequency the next `stop` ramps down from
    pub fn target_hz(&self) -> f32 {
        self.target_hz
    }

    /// Frequency the last `start` ramped up from
    pub fn start_hz(&self) -> f32 {
        self.start_hz
    }

    pub fn duty(&self) -> f32 {
        self.duty
    }

    /// Samples in the last programmed ramp
    pub fn ramp_steps(&self) -> usize {
        self.ramp_steps
    }

    pub fn ramp_buffer(&self) -> &PairBuffer<MAX_STEPS> {
        &self.ramp_buf
    }

    pub fn stop_buffer(&self) -> &PairBuffer<MAX_STEPS> {
        &self.stop_buf
    }

    pub fn steady_buffer(&self) -> &SteadyBuffer {
        &self.steady_buf
    }

    /// Disarm the stop channel, then abort all three channels
    ///
    /// The pending flag is cleared after the aborts: aborting a channel can
    /// latch a completion of its own.
    fn quiesce(&mut self) {
        self.dma.set_completion_irq(self.stop_ch, false);
        self.stop_binding.disarm();

        self.dma.abort(self.ramp_ch);
        self.dma.abort(self.steady_ch);
        self.dma.abort(self.stop_ch);

        self.dma.clear_completion(self.stop_ch);
    }

    /// Stop the lane, drop its queue and restart it at `entry`
    fn resync(&mut self, entry: EntryPoint) {
        self.lane.set_enabled(false);
        self.lane.clear_queue();
        self.lane.force_jump(entry);
        self.lane.set_enabled(true);
    }

    fn refill(&mut self, which: BufferSel, ramp: profile::FrequencyProfile) {
        let buf = match which {
            BufferSel::Ramp => &mut self.ramp_buf,
            BufferSel::Stop => &mut self.stop_buf,
        };
        // Steps were clamped to MAX_STEPS above, so this cannot overflow
        if let Err(e) = buf.fill(ramp) {
            warn!("ramp table rejected: {}", e);
        }
    }
}

#[derive(Clone, Copy)]
enum BufferSel {
    Ramp,
    Stop,
}

fn claim_channels<P: ChannelPool>(pool: &mut P) -> Result<[ChannelId; 3], InitError> {
    let mut claimed = [ChannelId(0); 3];
    for i in 0..claimed.len() {
        match pool.claim() {
            Some(ch) => claimed[i] = ch,
            None => {
                for &ch in &claimed[..i] {
                    pool.release(ch);
                }
                return Err(InitError::ChannelsExhausted);
            }
        }
    }
    Ok(claimed)
}
