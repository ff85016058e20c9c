//! Transfer source buffers
//!
//! Transfer channels read these by address. A buffer must stay in place and
//! unmodified while a transfer that references it is armed; the orchestrator
//! only refills a buffer after aborting every channel that reads it.

use heapless::Vec;

use crate::error::BufferError;

pub use crate::cycles::CyclePair;

/// Bounded table of cycle pairs with an explicit length
///
/// Holds at most `N` pairs (`2 * N` words). Oversized fills are rejected
/// rather than truncated.
#[derive(Debug)]
pub struct PairBuffer<const N: usize> {
    pairs: Vec<CyclePair, N>,
}

impl<const N: usize> Default for PairBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PairBuffer<N> {
    /// Create an empty buffer
    pub const fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Replace the contents with `pairs`
    ///
    /// Leaves the buffer untouched if `pairs` would not fit.
    pub fn fill<I>(&mut self, pairs: I) -> Result<(), BufferError>
    where
        I: ExactSizeIterator<Item = CyclePair>,
    {
        let requested = pairs.len();
        if requested > N {
            return Err(BufferError::CapacityExceeded {
                requested,
                capacity: N,
            });
        }

        self.pairs.clear();
        for pair in pairs {
            self.pairs
                .push(pair)
                .map_err(|_| BufferError::CapacityExceeded {
                    requested,
                    capacity: N,
                })?;
        }
        Ok(())
    }

    /// Number of pairs currently held
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Check if the buffer holds no pairs
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Maximum number of pairs
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of 32-bit words a transfer must move to drain the buffer
    pub fn word_count(&self) -> u32 {
        (self.pairs.len() * 2) as u32
    }

    /// Bus address of the first word
    pub fn read_address(&self) -> u32 {
        self.pairs.as_ptr() as usize as u32
    }

    /// Pairs currently held
    pub fn as_slice(&self) -> &[CyclePair] {
        &self.pairs
    }
}

/// The single cruise pair the steady channel re-reads forever
///
/// Always holds the current cruise pair; updates overwrite it in place.
#[derive(Debug, Default)]
pub struct SteadyBuffer {
    pair: CyclePair,
}

impl SteadyBuffer {
    /// log2 of the buffer size in bytes, for the read-address ring
    pub const RING_SIZE_BITS: u8 = 3;

    pub const fn new() -> Self {
        Self {
            pair: CyclePair { high: 0, low: 0 },
        }
    }

    pub fn set(&mut self, pair: CyclePair) {
        self.pair = pair;
    }

    pub fn get(&self) -> CyclePair {
        self.pair
    }

    /// Bus address of the pair (8-byte aligned)
    pub fn read_address(&self) -> u32 {
        &self.pair as *const CyclePair as usize as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{align_of, size_of};

    fn pairs(n: u32) -> impl ExactSizeIterator<Item = CyclePair> {
        (0..n).map(|i| CyclePair { high: i + 1, low: i + 2 })
    }

    #[test]
    fn test_pair_layout_is_two_words() {
        assert_eq!(size_of::<CyclePair>(), 8);
        assert_eq!(align_of::<CyclePair>(), 8);
        assert_eq!(size_of::<[CyclePair; 4]>(), 32);
    }

    #[test]
    fn test_fill_and_word_count() {
        let mut buf = PairBuffer::<8>::new();
        assert!(buf.is_empty());

        buf.fill(pairs(5)).unwrap();
        assert_eq!(buf.len(), 5);
        assert_eq!(buf.word_count(), 10);
        assert_eq!(buf.as_slice()[4], CyclePair { high: 5, low: 6 });
    }

    #[test]
    fn test_refill_replaces_contents() {
        let mut buf = PairBuffer::<8>::new();
        buf.fill(pairs(8)).unwrap();
        buf.fill(pairs(2)).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.as_slice()[1], CyclePair { high: 2, low: 3 });
    }

    #[test]
    fn test_oversized_fill_rejected() {
        let mut buf = PairBuffer::<4>::new();
        assert_eq!(buf.capacity(), 4);
        buf.fill(pairs(3)).unwrap();

        let err = buf.fill(pairs(5)).unwrap_err();
        assert_eq!(
            err,
            BufferError::CapacityExceeded {
                requested: 5,
                capacity: 4
            }
        );
        // Previous contents survive a rejected fill
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_steady_buffer_overwrites() {
        let mut steady = SteadyBuffer::new();
        steady.set(CyclePair { high: 10, low: 20 });
        steady.set(CyclePair { high: 30, low: 40 });
        assert_eq!(steady.get(), CyclePair { high: 30, low: 40 });
        assert_eq!(steady.read_address() % 8, 0);
    }
}
