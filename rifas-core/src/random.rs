//! Randomness behind shuffling and drawing.
//!
//! Services take a [`RandomSource`] instead of reaching for a global RNG so
//! tests can script the outcome of a draw.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform samples in `[0, 1)`.
pub trait RandomSource {
    fn next_uniform(&mut self) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    /// A generator seeded from the operating system.
    pub fn from_os_rng() -> Self {
        RngSource(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_uniform(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when it runs out.
///
/// A source that only yields values close to 1 leaves [`shuffle`] input untouched.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    samples: Vec<f64>,
    cursor: usize,
}

#[cfg(any(test, feature = "test-utils"))]
impl ScriptedSource {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0 }
    }

    /// Keeps every shuffle in input order.
    pub fn identity() -> Self {
        Self::new(vec![0.999_999_999])
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl RandomSource for ScriptedSource {
    fn next_uniform(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        sample
    }
}

/// Fisher–Yates shuffle driven by `source`.
///
/// Walks from the last position down to 1, swapping position `i` with
/// `floor(u * (i + 1))`. Samples outside `[0, 1)` are clamped into range.
pub fn shuffle<T>(items: &mut [T], source: &mut impl RandomSource) {
    for i in (1..items.len()).rev() {
        let j = ((source.next_uniform() * (i + 1) as f64) as usize).min(i);
        items.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_identity_source_keeps_order() {
        let mut items = vec![1, 2, 3, 4, 5];
        shuffle(&mut items, &mut ScriptedSource::identity());
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_source_rotates() {
        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        shuffle(&mut items, &mut ScriptedSource::new(vec![0.0]));
        assert_eq!(items, vec!['b', 'c', 'd', 'e', 'a']);
    }

    #[test]
    fn test_out_of_range_samples_are_clamped() {
        let mut items = vec![1, 2, 3];
        shuffle(&mut items, &mut ScriptedSource::new(vec![1.5, -0.5]));
        items.sort_unstable();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_shuffle_is_roughly_uniform() {
        let mut source = RngSource::seeded(42);
        let mut counts: HashMap<Vec<u8>, u32> = HashMap::new();
        let rounds = 60_000;
        for _ in 0..rounds {
            let mut items = vec![0u8, 1, 2];
            shuffle(&mut items, &mut source);
            *counts.entry(items).or_default() += 1;
        }
        assert_eq!(counts.len(), 6);
        let expected = rounds / 6;
        for (permutation, count) in counts {
            assert!(
                count.abs_diff(expected) < expected / 10,
                "{permutation:?} drawn {count} times, expected about {expected}"
            );
        }
    }
}
