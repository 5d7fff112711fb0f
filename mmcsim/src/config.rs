use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Parameters of an M/M/c queue.
///
/// Constructed with [`SimulationConfig::new`], which validates the parameters. A configuration
/// can also be deserialized, e.g., from a JSON file:
///
/// ```
/// # use mmcsim::SimulationConfig;
/// let config: SimulationConfig = serde_json::from_str(
///     r#"{"num_servers": 3, "arrival_rate": 2.0, "service_rate": 1.0, "seed": 7}"#,
/// ).unwrap();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.num_servers(), 3);
/// ```
///
/// Deserialized values are validated once they are passed to a simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    num_servers: usize,
    arrival_rate: f64,
    service_rate: f64,
    #[serde(default)]
    seed: Option<u64>,
}

impl SimulationConfig {
    /// Constructs a configuration with `num_servers` servers, mean arrival rate `arrival_rate`,
    /// and mean service rate `service_rate` of a single server.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no servers or any of the rates is not a positive number.
    pub fn new(num_servers: usize, arrival_rate: f64, service_rate: f64) -> crate::Result<Self> {
        let config = Self {
            num_servers,
            arrival_rate,
            service_rate,
            seed: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the seed of the random number generator.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks that all parameters are within their bounds.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_servers == 0 {
            return Err(ConfigError::ZeroServers);
        }
        if !valid_rate(self.arrival_rate) {
            return Err(ConfigError::InvalidArrivalRate(self.arrival_rate));
        }
        if !valid_rate(self.service_rate) {
            return Err(ConfigError::InvalidServiceRate(self.service_rate));
        }
        Ok(())
    }

    /// Number of servers, `c`.
    #[must_use]
    pub fn num_servers(&self) -> usize {
        self.num_servers
    }

    /// Mean number of arrivals per time unit, `λ`.
    #[must_use]
    pub fn arrival_rate(&self) -> f64 {
        self.arrival_rate
    }

    /// Mean number of services per time unit of a single server, `μ`.
    #[must_use]
    pub fn service_rate(&self) -> f64 {
        self.service_rate
    }

    /// Seed of the random number generator, if set.
    #[must_use]
    pub fn random_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Traffic intensity `ρ = λ / (c μ)`. The queue is stable only if `ρ < 1`.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        self.arrival_rate / (self.num_servers as f64 * self.service_rate)
    }
}

/// Determines when a simulation run stops.
///
/// At least one of the bounds must be set; otherwise, the run would never end, as arrivals keep
/// scheduling further arrivals indefinitely.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StopCondition {
    max_time: Option<f64>,
    max_customers: Option<usize>,
}

impl StopCondition {
    /// Constructs a stop condition from optional bounds.
    #[must_use]
    pub fn new(max_time: Option<f64>, max_customers: Option<usize>) -> Self {
        Self {
            max_time,
            max_customers,
        }
    }

    /// Stops before processing the first event occurring after `max_time`.
    #[must_use]
    pub fn time(max_time: f64) -> Self {
        Self::new(Some(max_time), None)
    }

    /// Stops once `max_customers` customers have been served.
    #[must_use]
    pub fn customers(max_customers: usize) -> Self {
        Self::new(None, Some(max_customers))
    }

    /// Adds a time bound.
    #[must_use]
    pub fn max_time(mut self, max_time: f64) -> Self {
        self.max_time = Some(max_time);
        self
    }

    /// Adds a customer bound.
    #[must_use]
    pub fn max_customers(mut self, max_customers: usize) -> Self {
        self.max_customers = Some(max_customers);
        self
    }

    /// The time bound, if any.
    #[must_use]
    pub fn time_limit(&self) -> Option<f64> {
        self.max_time
    }

    /// The customer bound, if any.
    #[must_use]
    pub fn customer_limit(&self) -> Option<usize> {
        self.max_customers
    }

    /// Checks that the condition is satisfiable.
    ///
    /// # Errors
    ///
    /// Returns an error if no bound is set, if the time bound is not a positive finite number,
    /// or if the customer bound is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.max_time, self.max_customers) {
            (None, None) => Err(ConfigError::UnboundedRun),
            (Some(time), _) if !time.is_finite() || time <= 0.0 => {
                Err(ConfigError::InvalidMaxTime(time))
            }
            (_, Some(0)) => Err(ConfigError::ZeroMaxCustomers),
            _ => Ok(()),
        }
    }

    /// Whether an event occurring at `time` lies beyond the time bound.
    #[must_use]
    pub fn exceeds_time(&self, time: f64) -> bool {
        self.max_time.map_or(false, |max| time > max)
    }

    /// Whether `served` customers satisfy the customer bound.
    #[must_use]
    pub fn reached_customers(&self, served: usize) -> bool {
        self.max_customers.map_or(false, |max| served >= max)
    }
}
