//! PIO state machine as a pulse lane
//!
//! Foreground control goes through embassy's [`StateMachine`]. The halt
//! handle used from the completion interrupt only holds the block and
//! state machine numbers and writes the PIO registers directly.

use embassy_rp::clocks;
use embassy_rp::gpio::Level;
use embassy_rp::pio::{Common, Config, Direction as PioDirection, Instance, Pin, PioPin, StateMachine};
use embassy_rp::Peri;
use fixed::types::U24F8;
use pio::{InstructionOperands, SetDestination};
use stepgen_hal::{EntryPoint, LaneHalt, PacingSignal, PulseSequencer};

use crate::pio::{EntryOffsets, PioBlock, StepGenProgram};

/// One state machine running the pulse program on one step pin
pub struct PioLane<'d, PIO: Instance, const SM: usize> {
    sm: StateMachine<'d, PIO, SM>,
    pin: Pin<'d, PIO>,
    block: PioBlock,
    entries: EntryOffsets,
}

impl<'d, PIO: Instance, const SM: usize> PioLane<'d, PIO, SM> {
    /// Configure `sm` to run `program` on `step_pin`
    ///
    /// `block` must name the block `PIO` refers to; it selects the DREQ and
    /// FIFO address handed to transfer channels. The lane starts disabled
    /// with the pin low.
    pub fn new<STEP: PioPin>(
        common: &mut Common<'d, PIO>,
        program: &StepGenProgram<'d, PIO>,
        mut sm: StateMachine<'d, PIO, SM>,
        step_pin: Peri<'d, STEP>,
        block: PioBlock,
    ) -> Self {
        let pin = common.make_pio_pin(step_pin);

        let mut cfg = Config::default();
        cfg.use_program(&program.loaded, &[]);
        cfg.set_set_pins(&[&pin]);

        // Divider 1.0: loop counts are in system clock cycles
        cfg.clock_divider = U24F8::from_bits(1 << 8);

        sm.set_config(&cfg);
        sm.set_pin_dirs(PioDirection::Out, &[&pin]);
        sm.set_pins(Level::Low, &[&pin]);

        Self {
            sm,
            pin,
            block,
            entries: program.entries(),
        }
    }

    pub fn block(&self) -> PioBlock {
        self.block
    }
}

impl<'d, PIO: Instance, const SM: usize> PulseSequencer for PioLane<'d, PIO, SM> {
    type Halt = PioLaneHalt;

    fn set_enabled(&mut self, enabled: bool) {
        self.sm.set_enable(enabled);
    }

    fn clear_queue(&mut self) {
        self.sm.clear_fifos();
    }

    fn force_jump(&mut self, entry: EntryPoint) {
        let addr = self.entries.of(entry);
        // SAFETY: `addr` is a public label of the program this lane was
        // configured with, so it lies inside that program's memory.
        unsafe { self.sm.exec_jmp(addr) };
    }

    fn set_pin_level(&mut self, high: bool) {
        let level = if high { Level::High } else { Level::Low };
        self.sm.set_pins(level, &[&self.pin]);
    }

    fn push_blocking(&mut self, word: u32) {
        while !self.sm.tx().try_push(word) {}
    }

    fn feed_address(&self) -> u32 {
        self.block.regs().txf(SM).as_ptr() as u32
    }

    fn pacing_signal(&self) -> PacingSignal {
        self.block.tx_dreq(SM as u8)
    }

    fn clock_hz(&self) -> u32 {
        clocks::clk_sys_freq()
    }

    fn halt_handle(&self) -> PioLaneHalt {
        PioLaneHalt {
            block: self.block,
            sm: SM as u8,
        }
    }
}

/// Register-level "silence this lane" handle, safe to use from an interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PioLaneHalt {
    block: PioBlock,
    sm: u8,
}

impl LaneHalt for PioLaneHalt {
    fn on_stop_complete(&self) {
        let regs = self.block.regs();
        let mask = 1u8 << self.sm;

        regs.ctrl().modify(|w| w.set_sm_enable(w.sm_enable() & !mask));

        let sm = regs.sm(usize::from(self.sm));
        let set_low = InstructionOperands::SET {
            destination: SetDestination::PINS,
            data: 0,
        }
        .encode();
        sm.instr().write(|w| w.set_instr(set_low));

        // Toggling the RX join flushes both FIFOs
        sm.shiftctrl().modify(|w| w.set_fjoin_rx(!w.fjoin_rx()));
        sm.shiftctrl().modify(|w| w.set_fjoin_rx(!w.fjoin_rx()));
    }
}
