//! Random interarrival and service times.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp};

use crate::SimulationConfig;

/// Source of the random durations driving a simulation.
pub trait Variates {
    /// Time until the next customer arrives.
    fn interarrival_time(&mut self) -> f64;
    /// Time it takes a server to serve a customer.
    fn service_time(&mut self) -> f64;
}

/// Draws interarrival and service times from the given distributions, each from its own random
/// number generator, so that the two streams do not interfere with each other.
pub struct RandomVariates<R, A, S>
where
    R: Rng,
    A: Distribution<f64>,
    S: Distribution<f64>,
{
    arrival_rng: R,
    service_rng: R,
    interarrival_dist: A,
    service_dist: S,
}

/// Exponentially distributed variates drawn from two streams of a seeded ChaCha generator.
pub type ExponentialVariates = RandomVariates<ChaCha8Rng, Exp<f64>, Exp<f64>>;

impl<R, A, S> RandomVariates<R, A, S>
where
    R: Rng,
    A: Distribution<f64>,
    S: Distribution<f64>,
{
    /// Constructs variates from two random number generators and the two distributions.
    pub fn new(arrival_rng: R, service_rng: R, interarrival_dist: A, service_dist: S) -> Self {
        Self {
            arrival_rng,
            service_rng,
            interarrival_dist,
            service_dist,
        }
    }
}

impl ExponentialVariates {
    /// Constructs exponential variates with the rates given in `config`. Arrivals and services
    /// are drawn from streams 0 and 1 of a generator seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: &SimulationConfig, seed: u64) -> crate::Result<Self> {
        config.validate()?;
        let arrival_rng = ChaCha8Rng::seed_from_u64(seed);
        let mut service_rng = ChaCha8Rng::seed_from_u64(seed);
        service_rng.set_stream(1);
        let interarrival_dist = Exp::new(config.arrival_rate())
            .map_err(|_| crate::ConfigError::InvalidArrivalRate(config.arrival_rate()))?;
        let service_dist = Exp::new(config.service_rate())
            .map_err(|_| crate::ConfigError::InvalidServiceRate(config.service_rate()))?;
        Ok(Self::new(
            arrival_rng,
            service_rng,
            interarrival_dist,
            service_dist,
        ))
    }
}

/// Negative and NaN durations are treated as zero.
fn non_negative(time: f64) -> f64 {
    match time.partial_cmp(&0_f64) {
        None | Some(std::cmp::Ordering::Less) => 0_f64,
        _ => time,
    }
}

impl<R, A, S> Variates for RandomVariates<R, A, S>
where
    R: Rng,
    A: Distribution<f64>,
    S: Distribution<f64>,
{
    fn interarrival_time(&mut self) -> f64 {
        non_negative(self.interarrival_dist.sample(&mut self.arrival_rng))
    }

    fn service_time(&mut self) -> f64 {
        non_negative(self.service_dist.sample(&mut self.service_rng))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;
    use rand::rngs::mock::StepRng;
    use testing::{ConstantDistribution, ScriptedDistribution};

    #[test]
    fn test_scripted_variates() {
        let mut variates = RandomVariates::new(
            StepRng::new(0, 1),
            StepRng::new(0, 1),
            ScriptedDistribution::new(vec![1.0, 2.0]),
            ConstantDistribution::new(0.5),
        );
        assert!(approx_eq!(f64, variates.interarrival_time(), 1.0));
        assert!(approx_eq!(f64, variates.service_time(), 0.5));
        assert!(approx_eq!(f64, variates.interarrival_time(), 2.0));
        assert!(approx_eq!(f64, variates.interarrival_time(), 1.0));
    }

    #[test]
    fn test_negative_and_nan_samples_clamped() {
        let mut variates = RandomVariates::new(
            StepRng::new(0, 1),
            StepRng::new(0, 1),
            ConstantDistribution::new(-3.0),
            ConstantDistribution::new(f64::NAN),
        );
        assert!(approx_eq!(f64, variates.interarrival_time(), 0.0));
        assert!(approx_eq!(f64, variates.service_time(), 0.0));
    }

    #[test]
    fn test_exponential_means() {
        let config = SimulationConfig::new(1, 2.0, 0.5).unwrap();
        let mut variates = ExponentialVariates::from_config(&config, 42).unwrap();
        let n = 100_000;
        let arrivals: f64 = (0..n).map(|_| variates.interarrival_time()).sum::<f64>() / n as f64;
        let services: f64 = (0..n).map(|_| variates.service_time()).sum::<f64>() / n as f64;
        assert!((arrivals - 0.5).abs() < 0.02, "mean interarrival {}", arrivals);
        assert!((services - 2.0).abs() < 0.08, "mean service {}", services);
    }

    #[test]
    fn test_streams_are_independent() {
        let config = SimulationConfig::new(1, 1.0, 1.0).unwrap();
        let mut interleaved = ExponentialVariates::from_config(&config, 7).unwrap();
        let mut arrivals_only = ExponentialVariates::from_config(&config, 7).unwrap();
        let lhs: Vec<f64> = (0..10)
            .map(|_| {
                let _ = interleaved.service_time();
                interleaved.interarrival_time()
            })
            .collect();
        let rhs: Vec<f64> = (0..10).map(|_| arrivals_only.interarrival_time()).collect();
        assert_eq!(lhs, rhs);
        let mut fresh = ExponentialVariates::from_config(&config, 7).unwrap();
        assert!((fresh.interarrival_time() - fresh.service_time()).abs() > 0.0);
    }
}
