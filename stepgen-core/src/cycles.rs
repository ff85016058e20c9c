//! Cycle math
//!
//! Converts frequencies and periods into the (high, low) cycle-count pairs a
//! sequencer lane consumes. Every function here is total: out-of-range input
//! is clamped before any division, never reported.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest period a lane can emit (one high cycle, two low)
pub const MIN_TOTAL_CYCLES: u32 = 3;

/// Largest period; keeps the lane's down-counter positive
pub const MAX_TOTAL_CYCLES: u32 = 0x7fff_ffff;

/// Frequencies are floored here before dividing
pub const MIN_FREQUENCY_HZ: f32 = 0.1;

/// One output period, as clock cycles spent high then low
///
/// Laid out as two consecutive words so a buffer of pairs can be streamed
/// word by word. The 8-byte alignment lets a single pair be read with a
/// 2^3-byte address ring.
#[repr(C, align(8))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CyclePair {
    pub high: u32,
    pub low: u32,
}

impl CyclePair {
    /// Full period in cycles
    pub fn total(&self) -> u32 {
        self.high + self.low
    }
}

/// Split a period into high and low phases
///
/// `total_cycles` is raised to [`MIN_TOTAL_CYCLES`]; the high phase is
/// `round(total * duty)` clamped so neither phase is ever zero.
pub fn split(total_cycles: u32, duty: f32) -> CyclePair {
    let total = total_cycles.max(MIN_TOTAL_CYCLES);

    // NaN and negative products saturate to 0 in the cast
    let high = libm::round(f64::from(total) * f64::from(duty)) as u64;
    let high = high.clamp(1, u64::from(total - 1)) as u32;

    CyclePair {
        high,
        low: total - high,
    }
}

/// Cycles per period at `freq_hz`, clamped to the emittable range
pub fn total_cycles_for(clock_hz: u32, freq_hz: f32) -> u32 {
    // f32::max drops NaN in favour of the floor
    let freq = freq_hz.max(MIN_FREQUENCY_HZ);
    let cycles = libm::round(f64::from(clock_hz) / f64::from(freq)) as u64;
    clamp_cycles(cycles)
}

/// Constant-frequency pair
pub fn pair_for_frequency(clock_hz: u32, freq_hz: f32, duty: f32) -> CyclePair {
    split(total_cycles_for(clock_hz, freq_hz), duty)
}

fn clamp_cycles(cycles: u64) -> u32 {
    cycles.clamp(u64::from(MIN_TOTAL_CYCLES), u64::from(MAX_TOTAL_CYCLES)) as u32
}

/// Period of a fixed-rate wave, used by the blocking helpers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Period {
    Millis(u32),
    Micros(u32),
    Nanos(u32),
}

impl Period {
    /// Period length in clock cycles, clamped to the emittable range
    pub fn total_cycles(self, clock_hz: u32) -> u32 {
        let clock = u64::from(clock_hz);
        let cycles = match self {
            Period::Millis(ms) => u64::from(ms) * (clock / 1_000),
            Period::Micros(us) => u64::from(us) * clock / 1_000_000,
            Period::Nanos(ns) => u64::from(ns) * clock / 1_000_000_000,
        };
        clamp_cycles(cycles)
    }
}
