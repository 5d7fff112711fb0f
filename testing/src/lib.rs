//! Test utilities shared by the workspace crates.

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::cell::Cell;

use rand::distributions::Distribution;

/// This distribution ignores the random number generator altogether and returns the values it
/// was constructed with, one by one, starting over once it runs out of them.
///
/// This is meant for testing, e.g., to script arrival and service times so that the exact
/// course of a simulation can be computed by hand.
///
/// # Panics
///
/// Sampling panics if the distribution was constructed with no values.
///
/// # Examples
///
/// ```
/// # use rand::distributions::Distribution;
/// # use testing::ScriptedDistribution;
/// let dist = ScriptedDistribution::new(vec![1.0, 2.0]);
/// let mut rng = rand::rngs::mock::StepRng::new(0, 1);
/// assert_eq!(dist.sample(&mut rng), 1.0);
/// assert_eq!(dist.sample(&mut rng), 2.0);
/// assert_eq!(dist.sample(&mut rng), 1.0);
/// ```
pub struct ScriptedDistribution {
    values: Vec<f64>,
    next: Cell<usize>,
}

impl ScriptedDistribution {
    /// Constructs a new distribution cycling through `values`.
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            next: Cell::new(0),
        }
    }

    /// Number of values sampled so far.
    #[must_use]
    pub fn sampled(&self) -> usize {
        self.next.get()
    }
}

impl Distribution<f64> for ScriptedDistribution {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> f64 {
        let idx = self.next.get();
        self.next.replace(idx + 1);
        self.values[idx % self.values.len()]
    }
}

/// Always produces the same value.
pub struct ConstantDistribution(f64);

impl ConstantDistribution {
    /// Constructs a distribution always returning `value`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }
}

impl Distribution<f64> for ConstantDistribution {
    fn sample<R: rand::Rng + ?Sized>(&self, _: &mut R) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scripted_distribution_cycles() {
        let dist = ScriptedDistribution::new(vec![0.5, 1.5, 2.5]);
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        let sampled: Vec<f64> = (0..5).map(|_| dist.sample(&mut rng)).collect();
        assert_eq!(sampled, vec![0.5, 1.5, 2.5, 0.5, 1.5]);
        assert_eq!(dist.sampled(), 5);
    }

    #[test]
    fn test_constant_distribution() {
        let dist = ConstantDistribution::new(3.0);
        let mut rng = rand::rngs::mock::StepRng::new(0, 1);
        assert!((0..3).all(|_| (dist.sample(&mut rng) - 3.0).abs() < f64::EPSILON));
    }
}
