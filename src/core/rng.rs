//! Deterministic Random Number Generator
//!
//! Linear congruential generator that drives all procedural generation.
//! Given the same seed, produces the identical sequence on all platforms.

/// LCG modulus: 2^31.
pub const LCG_MODULUS: u64 = 1 << 31;

/// LCG multiplier.
pub const LCG_MULTIPLIER: u64 = 1_103_515_245;

/// LCG increment.
pub const LCG_INCREMENT: u64 = 12_345;

/// Deterministic PRNG using a 31-bit linear congruential generator.
///
/// # Determinism Guarantee
///
/// The state update is evaluated in IEEE-754 doubles: `a * state` is rounded
/// to 53 bits before the modulus, exactly as browser clients compute it, so a
/// seed rebuilds the same island on both ends. The rounded product is always
/// an integer, so the state stays integral.
///
/// # Example
///
/// ```
/// use royale::core::rng::DeterministicRng;
///
/// let mut rng = DeterministicRng::new(1);
/// assert_eq!(rng.next_int(), 1_103_527_590);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeterministicRng {
    state: u64,
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Create a new RNG from a seed.
    pub fn new(seed: u32) -> Self {
        Self { state: seed as u64 }
    }

    /// Advance the generator and return the raw state value in `[0, 2^31)`.
    #[inline]
    pub fn next_int(&mut self) -> u64 {
        let next = (LCG_MULTIPLIER as f64 * self.state as f64 + LCG_INCREMENT as f64)
            % LCG_MODULUS as f64;
        self.state = next as u64;
        self.state
    }

    /// Generate a float in `[0, 1]`.
    #[inline]
    pub fn next_float(&mut self) -> f64 {
        self.next_int() as f64 / (LCG_MODULUS - 1) as f64
    }

    /// Generate an integer-valued float in `[start, end)`.
    ///
    /// The offset from `start` is truncated toward zero, so for integral
    /// bounds the result is always integral.
    #[inline]
    pub fn next_range(&mut self, start: f64, end: f64) -> f64 {
        let range = end - start;
        let random_under_1 = self.next_int() as f64 / LCG_MODULUS as f64;
        start + (random_under_1 * range).trunc()
    }

    /// Get current state (for checkpointing/debugging).
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Restore from saved state.
    pub fn set_state(&mut self, state: u64) {
        self.state = state % LCG_MODULUS;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(12345);

        for _ in 0..1000 {
            assert_eq!(rng1.next_int(), rng2.next_int());
        }
    }

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = DeterministicRng::new(12345);
        let mut rng2 = DeterministicRng::new(54321);

        assert_ne!(rng1.next_int(), rng2.next_int());
    }

    #[test]
    fn test_rng_known_values() {
        // These values must never change: terrain and zones depend on them.
        let mut rng = DeterministicRng::new(0);
        assert_eq!(rng.next_int(), 12345);
        assert_eq!(rng.next_int(), 1406932606);
        assert_eq!(rng.next_int(), 654583808);
        assert_eq!(rng.next_int(), 1358247936);
    }

    #[test]
    fn test_product_is_rounded_like_browsers() {
        // 1103515245 * 128476320 exceeds 2^53; the third draw depends on the
        // rounded product.
        let mut rng = DeterministicRng::new(1234);
        let stream: Vec<u64> = (0..6).map(|_| rng.next_int()).collect();
        assert_eq!(
            stream,
            vec![233191843, 128476320, 85706848, 2116141344, 2079795712, 319361536]
        );

        let mut rng = DeterministicRng::new(1);
        let stream: Vec<u64> = (0..6).map(|_| rng.next_int()).collect();
        assert_eq!(
            stream,
            vec![1103527590, 377401600, 333417792, 314102912, 611429056, 1995203584]
        );
    }

    #[test]
    fn test_next_float_bounds() {
        let mut rng = DeterministicRng::new(777);
        for _ in 0..10_000 {
            let f = rng.next_float();
            assert!((0.0..=1.0).contains(&f));
        }
    }

    #[test]
    fn test_next_range_is_integral() {
        let mut rng = DeterministicRng::new(42);
        for _ in 0..1000 {
            let v = rng.next_range(-20.0, 20.0);
            assert_eq!(v, v.trunc());
            assert!(v >= -20.0 && v < 20.0);
        }
    }

    #[test]
    fn test_state_checkpoint() {
        let mut rng = DeterministicRng::new(5555);
        for _ in 0..50 {
            rng.next_int();
        }

        let saved_state = rng.state();
        let next_values: Vec<u64> = (0..10).map(|_| rng.next_int()).collect();

        rng.set_state(saved_state);
        for expected in next_values {
            assert_eq!(rng.next_int(), expected);
        }
    }

    proptest! {
        #[test]
        fn next_range_stays_in_bounds(seed in 0u32..10_000, draws in 1usize..200) {
            let mut rng = DeterministicRng::new(seed);
            for _ in 0..draws {
                let v = rng.next_range(0.0, 10.0);
                prop_assert!((0.0..10.0).contains(&v), "value {} out of [0, 10)", v);
            }
        }

        #[test]
        fn same_seed_same_stream(seed in any::<u32>()) {
            let mut a = DeterministicRng::new(seed);
            let mut b = DeterministicRng::new(seed);
            for _ in 0..32 {
                prop_assert_eq!(a.next_int(), b.next_int());
            }
        }
    }
}
