//! Random sources.
//!
//! Generation must produce identical output on every client, so it draws
//! from [`SeededRandom`]. Cosmetic choices (player names, avatar art) draw
//! from [`EntropyRandom`]. Both sit behind [`RandomSource`] so a test harness
//! can substitute a fixed sequence anywhere.

use rand::RngCore;

/// A source of random numbers, passed explicitly to whoever needs one.
pub trait RandomSource {
    /// Next raw 64-bit value.
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `[min, max]` (inclusive). Returns `min` if the
    /// range is empty.
    fn range_inclusive(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max as i64 - min as i64 + 1) as u64;
        // Multiply-shift keeps the result independent of platform word size.
        let r = ((self.next_u64() >> 32) * span) >> 32;
        (min as i64 + r as i64) as i32
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on empty range");
        self.range_inclusive(0, len.saturating_sub(1) as i32) as usize
    }

    /// True with probability `numerator / denominator`.
    fn chance(&mut self, numerator: u32, denominator: u32) -> bool {
        if denominator == 0 {
            return false;
        }
        (self.range_inclusive(0, denominator as i32 - 1) as u32) < numerator
    }

    /// Pick an element of a slice.
    fn pick<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if slice.is_empty() {
            None
        } else {
            Some(&slice[self.index(slice.len())])
        }
    }
}

/// Deterministic generator: identical seed, identical sequence, on every
/// platform.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u64,
}

impl SeededRandom {
    /// Source seeded with `seed`; equal seeds give equal sequences.
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        splitmix64(self.state)
    }
}

/// Splitmix64 finalizer.
fn splitmix64(state: u64) -> u64 {
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Non-deterministic source backed by the thread-local OS-seeded generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntropyRandom;

impl RandomSource for EntropyRandom {
    fn next_u64(&mut self) -> u64 {
        rand::thread_rng().next_u64()
    }
}
