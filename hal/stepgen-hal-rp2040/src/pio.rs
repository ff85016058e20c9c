//! Pulse program and PIO block plumbing
//!
//! One program serves every lane in a block. It has three public entry
//! points, selected by forcing a jump:
//!
//! - `dma_stream` (wrap region, initial pc): pull a high count, hold the pin
//!   high, pull a low count, hold it low, repeat. Transfer channels feed it.
//! - `infinite`: pull one (high, low) pair, then loop on it forever.
//! - `burst`: pull `count - 1`, then one pair; emit `count` periods and park.
//!
//! Each phase holds its level for `count + 1` loop iterations, plus the
//! instructions around the loop.

use embassy_rp::pac;
use embassy_rp::pio::{Common, Instance, LoadedProgram};
use stepgen_hal::{EntryPoint, PacingSignal};

/// Number of DREQ lines per PIO block (4 TX then 4 RX)
const DREQS_PER_BLOCK: u8 = 8;

/// Instructions occupied by the pulse program
pub const PROGRAM_LEN: usize = 31;

/// PIO block hosting a lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PioBlock {
    Pio0,
    Pio1,
}

impl PioBlock {
    pub const fn index(self) -> u8 {
        match self {
            PioBlock::Pio0 => 0,
            PioBlock::Pio1 => 1,
        }
    }

    pub(crate) fn regs(self) -> pac::pio::Pio {
        match self {
            PioBlock::Pio0 => pac::PIO0,
            PioBlock::Pio1 => pac::PIO1,
        }
    }

    /// Data request raised when `sm`'s TX FIFO has room
    pub const fn tx_dreq(self, sm: u8) -> PacingSignal {
        PacingSignal(self.index() * DREQS_PER_BLOCK + sm)
    }
}

/// Absolute instruction-memory addresses of the public entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryOffsets {
    pub dma_stream: u8,
    pub infinite: u8,
    pub burst: u8,
}

impl EntryOffsets {
    pub const fn of(&self, entry: EntryPoint) -> u8 {
        match entry {
            EntryPoint::DmaStream => self.dma_stream,
            EntryPoint::Indefinite => self.infinite,
            EntryPoint::Burst => self.burst,
        }
    }
}

/// The pulse program, loaded into one PIO block
pub struct StepGenProgram<'d, PIO: Instance> {
    pub(crate) loaded: LoadedProgram<'d, PIO>,
    entries: EntryOffsets,
}

impl<'d, PIO: Instance> StepGenProgram<'d, PIO> {
    /// Load the program into `common`'s instruction memory
    ///
    /// Needs 31 free instruction slots.
    pub fn load(common: &mut Common<'d, PIO>) -> Self {
        let (program, relative) = assemble();
        let loaded = common.load_program(&program);

        let origin = loaded.origin;
        let entries = EntryOffsets {
            dma_stream: origin + relative.dma_stream,
            infinite: origin + relative.infinite,
            burst: origin + relative.burst,
        };

        Self { loaded, entries }
    }

    pub fn entries(&self) -> EntryOffsets {
        self.entries
    }
}

/// Assemble the program; entry offsets are relative to its origin
fn assemble() -> (pio::Program<32>, EntryOffsets) {
    let prg = pio::pio_asm!(
        ".wrap_target",
        "public dma_stream:",
        "    pull block",
        "    set pins, 1",
        "    mov y, osr",
        "stream_high:",
        "    jmp y-- stream_high",
        "    pull block",
        "    set pins, 0",
        "    mov y, osr",
        "stream_low:",
        "    jmp y-- stream_low",
        ".wrap",
        "public infinite:",
        "    pull block",
        "    mov x, osr",
        "    pull block",
        "infinite_loop:",
        "    set pins, 1",
        "    mov y, x",
        "infinite_high:",
        "    jmp y-- infinite_high",
        "    set pins, 0",
        "    mov y, osr",
        "infinite_low:",
        "    jmp y-- infinite_low",
        "    jmp infinite_loop",
        "public burst:",
        "    pull block",
        "    mov x, osr",
        "    pull block",
        "    mov isr, osr",
        "    pull block",
        "burst_loop:",
        "    set pins, 1",
        "    mov y, isr",
        "burst_high:",
        "    jmp y-- burst_high",
        "    set pins, 0",
        "    mov y, osr",
        "burst_low:",
        "    jmp y-- burst_low",
        "    jmp x-- burst_loop",
        "burst_done:",
        "    jmp burst_done",
    );

    let entries = EntryOffsets {
        dma_stream: prg.public_defines.dma_stream as u8,
        infinite: prg.public_defines.infinite as u8,
        burst: prg.public_defines.burst as u8,
    };
    (prg.program, entries)
}
