//! S-curve ramp profiles
//!
//! A ramp samples a smoothstep curve between two frequencies. Smoothstep has
//! zero slope at both ends, so the period changes without an acceleration
//! step where the ramp meets the cruise phase. Deceleration ramps are the
//! same curve with the endpoints swapped.

use crate::cycles::{self, CyclePair, MIN_FREQUENCY_HZ};

/// Fewest samples a ramp can have (both endpoints)
pub const MIN_RAMP_STEPS: usize = 2;

/// Cubic `3t² - 2t³`, clamped to 0 below 0 and 1 above 1
pub fn smoothstep(t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    t * t * (3.0 - 2.0 * t)
}

/// Lazily evaluated ramp from `f_start` to `f_end`
///
/// Yields exactly `len()` cycle pairs; the first is at `f_start`, the last at
/// `f_end`, up to rounding and clamping.
#[derive(Debug, Clone)]
pub struct FrequencyProfile {
    clock_hz: u32,
    steps: usize,
    f_start_hz: f32,
    f_end_hz: f32,
    duty: f32,
    index: usize,
}

impl FrequencyProfile {
    /// Frequency of sample `i`, floored to [`MIN_FREQUENCY_HZ`]
    ///
    /// The first and last samples return `f_start` and `f_end` exactly, so
    /// the final up-ramp pair equals the cruise pair.
    pub fn frequency_at(&self, i: usize) -> f32 {
        let t = i as f32 / (self.steps - 1) as f32;
        let s = f64::from(smoothstep(t));
        let f = f64::from(self.f_start_hz) * (1.0 - s) + f64::from(self.f_end_hz) * s;
        (f as f32).max(MIN_FREQUENCY_HZ)
    }
}

impl Iterator for FrequencyProfile {
    type Item = CyclePair;

    fn next(&mut self) -> Option<CyclePair> {
        if self.index >= self.steps {
            return None;
        }
        let f = self.frequency_at(self.index);
        self.index += 1;
        Some(cycles::pair_for_frequency(self.clock_hz, f, self.duty))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.steps - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrequencyProfile {}

/// Build a ramp of `steps` samples (raised to [`MIN_RAMP_STEPS`])
///
/// No upper bound is applied here; callers size it to their buffer.
pub fn build_ramp(
    clock_hz: u32,
    steps: usize,
    f_start_hz: f32,
    f_end_hz: f32,
    duty: f32,
) -> FrequencyProfile {
    FrequencyProfile {
        clock_hz,
        steps: steps.max(MIN_RAMP_STEPS),
        f_start_hz,
        f_end_hz,
        duty,
        index: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycles::{total_cycles_for, MAX_TOTAL_CYCLES};
    use proptest::prelude::*;
    use std::vec::Vec;

    const CLOCK_HZ: u32 = 125_000_000;

    fn collect(steps: usize, f0: f32, f1: f32, duty: f32) -> Vec<CyclePair> {
        build_ramp(CLOCK_HZ, steps, f0, f1, duty).collect()
    }

    #[test]
    fn test_smoothstep_shape() {
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(2.0), 1.0);

        // Flat at both ends: first sample moves far less than linear
        assert!(smoothstep(0.01) < 0.001);
        assert!(1.0 - smoothstep(0.99) < 0.001);
    }

    #[test]
    fn test_two_step_ramp_hits_endpoints() {
        let ramp = collect(2, 10.0, 1000.0, 0.5);
        assert_eq!(ramp.len(), 2);
        assert_eq!(ramp[0].total(), 12_500_000);
        assert_eq!(ramp[1].total(), 125_000);
        assert_eq!(ramp[1], CyclePair { high: 62_500, low: 62_500 });
    }

    #[test]
    fn test_steps_raised_to_minimum() {
        assert_eq!(collect(0, 10.0, 1000.0, 0.5).len(), 2);
        assert_eq!(collect(1, 10.0, 1000.0, 0.5).len(), 2);
        assert_eq!(build_ramp(CLOCK_HZ, 1, 10.0, 1000.0, 0.5).len(), 2);
    }

    #[test]
    fn test_acceleration_ramp_is_monotonic() {
        let ramp = collect(128, 10.0, 1000.0, 0.5);
        assert_eq!(ramp.len(), 128);
        for window in ramp.windows(2) {
            assert!(window[1].total() <= window[0].total());
        }
    }

    #[test]
    fn test_slow_start_is_clamped() {
        // 0.01 Hz is floored to 0.1 Hz; 1 Hz on a fast clock saturates
        let ramp: Vec<CyclePair> = build_ramp(u32::MAX, 2, 0.01, 1.0, 0.5).collect();
        assert_eq!(ramp[0].total(), MAX_TOTAL_CYCLES);
        assert_eq!(ramp[1].total(), MAX_TOTAL_CYCLES);
    }

    #[test]
    fn test_frequency_floor_applies_mid_ramp() {
        let profile = build_ramp(CLOCK_HZ, 5, 100.0, -100.0, 0.5);
        assert_eq!(profile.frequency_at(4), MIN_FREQUENCY_HZ);
        assert_eq!(profile.frequency_at(2), MIN_FREQUENCY_HZ);
        assert_eq!(profile.frequency_at(0), 100.0);
    }

    #[test]
    fn test_last_sample_matches_cruise_pair() {
        let (f0, f1, duty) = (6806.6563, 205.40025, 0.05);
        let profile = build_ramp(CLOCK_HZ, 2, f0, f1, duty);
        assert_eq!(profile.frequency_at(0), f0);
        assert_eq!(profile.frequency_at(1), f1);

        let ramp: Vec<CyclePair> = profile.collect();
        assert_eq!(ramp[1], cycles::pair_for_frequency(CLOCK_HZ, f1, duty));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let mut profile = build_ramp(CLOCK_HZ, 4, 10.0, 20.0, 0.5);
        assert_eq!(profile.len(), 4);
        profile.next();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.by_ref().count(), 3);
        assert!(profile.next().is_none());
    }

    proptest! {
        #[test]
        fn prop_ramp_length_and_endpoints(
            steps in 2usize..300,
            f0 in 1.0f32..50_000.0,
            f1 in 1.0f32..50_000.0,
            duty in 0.05f32..0.95,
        ) {
            let ramp = collect(steps, f0, f1, duty);
            prop_assert_eq!(ramp.len(), steps);

            let first = ramp[0].total();
            let last = ramp[steps - 1].total();
            prop_assert_eq!(first, total_cycles_for(CLOCK_HZ, f0));
            prop_assert_eq!(last, total_cycles_for(CLOCK_HZ, f1));
        }

        #[test]
        fn prop_reversed_ramp_mirrors(
            steps in 2usize..300,
            f0 in 1.0f32..50_000.0,
            f1 in 1.0f32..50_000.0,
        ) {
            let up = collect(steps, f0, f1, 0.5);
            let down = collect(steps, f1, f0, 0.5);
            for k in 0..steps {
                let a = f64::from(up[k].total());
                let b = f64::from(down[steps - 1 - k].total());
                // Mirrored samples may round to neighbouring cycle counts
                prop_assert!((a - b).abs() <= 1.0 + a * 1.0e-6, "k={} a={} b={}", k, a, b);
            }
        }
    }
}
