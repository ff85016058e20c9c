//! Stepgen - S-curve step pulse demo firmware
//!
//! Drives one STEP output from PIO0 state machine 0. The axis ramps up to
//! its cruise frequency, cruises for a while, ramps down and goes quiet,
//! then starts over. Everything after each `start`/`stop` call runs on
//! PIO and DMA; the CPU only wakes for the timers and the stop interrupt.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::dma::AnyChannel;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Pio;
use embassy_rp::{bind_interrupts, interrupt, Peri};
use embassy_time::{Duration, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use stepgen_core::{CompletionDispatcher, MotionState, StepGen};
use stepgen_hal_rp2040::{DmaPool, PioBlock, PioLane, PioLaneHalt, Rp2040Dma, StepGenProgram};

#[macro_use]
mod config;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => embassy_rp::pio::InterruptHandler<PIO0>;
});

/// Axes that can share the completion interrupt
const MAX_AXES: usize = 4;

/// How often to check whether a down-ramp has finished
const IDLE_POLL: Duration = Duration::from_millis(10);

type Axis = StepGen<'static, PioLane<'static, PIO0, 0>, Rp2040Dma>;

static DISPATCHER: CompletionDispatcher<PioLaneHalt, MAX_AXES> = CompletionDispatcher::new();

// The axis must not move once transfers read its buffers
static AXIS: StaticCell<Axis> = StaticCell::new();

#[interrupt]
unsafe fn DMA_IRQ_1() {
    DISPATCHER.dispatch(&Rp2040Dma::new());
}

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Stepgen firmware starting...");

    let cfg = config::axis();
    if let Err(e) = cfg.validate() {
        defmt::panic!("invalid axis config: {}", e);
    }

    let p = embassy_rp::init(Default::default());
    let step_pin = take_step_pin!(p);

    let Pio {
        mut common, sm0, ..
    } = Pio::new(p.PIO0, Irqs);
    let program = StepGenProgram::load(&mut common);
    let lane = PioLane::new(&mut common, &program, sm0, step_pin, PioBlock::Pio0);
    info!("pulse program loaded at {}", program.entries());

    let channels: [Peri<'static, AnyChannel>; 3] =
        [p.DMA_CH0.into(), p.DMA_CH1.into(), p.DMA_CH2.into()];
    let mut pool = DmaPool::new(channels);

    let axis = match Axis::new(lane, Rp2040Dma::new(), &mut pool, &DISPATCHER, &cfg) {
        Ok(axis) => AXIS.init(axis),
        Err(e) => defmt::panic!("stepgen init failed: {}", e),
    };
    info!("STEP on GPIO{}, {} DMA channels spare", config::STEP_PIN, pool.available());

    let ramp_steps = usize::from(cfg.ramp_steps);
    loop {
        info!("ramping {} Hz -> {} Hz", cfg.start_hz, cfg.target_hz);
        axis.start(cfg.start_hz, cfg.target_hz, cfg.duty, ramp_steps);

        Timer::after(config::RUN_TIME).await;
        debug!("state before stop: {}", axis.state());

        info!("ramping down to {} Hz", cfg.end_hz);
        axis.stop(cfg.end_hz, ramp_steps);
        while axis.state() != MotionState::Idle {
            Timer::after(IDLE_POLL).await;
        }
        info!("axis idle");

        Timer::after(config::IDLE_TIME).await;
    }
}
