use std::fmt::Debug;
use std::ops::Range;

use rand::Rng;
use rand::SeedableRng;

/// The source of randomness of the solver: value selection, shuffled and weighted neighborhoods.
///
/// Any seeded [`rand`] generator is a [`Random`]; tests substitute scripted draws.
pub trait Random: Debug {
    /// A uniformly drawn value in `range`.
    ///
    /// # Example
    /// ```rust
    /// # use rand::rngs::SmallRng;
    /// # use rand::SeedableRng;
    /// # use trellis_core::Random;
    /// let mut rng = SmallRng::seed_from_u64(42);
    /// let index = rng.generate_usize_in_range(0..4);
    /// assert!(index < 4);
    /// ```
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize;

    /// A uniformly drawn value in `[0, 1)`.
    fn generate_f64(&mut self) -> f64;

    /// Draws an index with probability proportional to its weight.
    ///
    /// Indices with a weight of zero are never drawn; without any positive weight the result is
    /// [`None`].
    fn get_weighted_choice(&mut self, weights: &[f64]) -> Option<usize> {
        let total = weights.iter().filter(|weight| **weight > 0.0).sum::<f64>();
        if total <= 0.0 {
            return None;
        }

        let target = self.generate_f64() * total;
        let mut cumulative = 0.0;
        let mut last_positive = None;
        for (index, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_positive = Some(index);
            if target < cumulative {
                return Some(index);
            }
        }

        // rounding
        last_positive
    }

    /// A uniformly drawn permutation of `0..len` (Fisher-Yates).
    fn generate_permutation(&mut self, len: usize) -> Vec<usize> {
        let mut permutation = (0..len).collect::<Vec<_>>();
        for position in (1..len).rev() {
            let other = self.generate_usize_in_range(0..position + 1);
            permutation.swap(position, other);
        }
        permutation
    }
}

impl<T> Random for T
where
    T: SeedableRng + Rng + Debug,
{
    fn generate_usize_in_range(&mut self, range: Range<usize>) -> usize {
        self.gen_range(range)
    }

    fn generate_f64(&mut self) -> f64 {
        self.gen_range(0.0..1.0)
    }
}
