//! Discrete-event simulation of M/M/c queues.
//!
//! Customers arrive according to a Poisson process and are served by `c` identical servers with
//! exponentially distributed service times. Customers that find all servers busy wait in a single
//! FIFO line. The simulated averages can be compared against the closed-form predictions of
//! queueing theory, see [`TheoreticalStatistics`].
//!
//! # Examples
//!
//! ```
//! # use mmcsim::{Simulation, SimulationConfig, StopCondition};
//! # fn main() -> mmcsim::Result<()> {
//! let config = SimulationConfig::new(2, 1.5, 1.0)?.seed(17);
//! let mut simulation = Simulation::from_config(config)?;
//! simulation.run_until(StopCondition::time(500.0))?;
//! let stats = simulation.statistics();
//! assert!(stats.customers_served > 0);
//! assert!(stats.server_utilization <= 1.0);
//! assert!(simulation.theoretical_statistics().is_stable());
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::cast_precision_loss
)]
#![deny(unsafe_code)]

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

mod config;
pub use config::{SimulationConfig, StopCondition};

mod customer;
pub use customer::Customer;

mod event;
pub use event::{Event, EventKind, EventQueue};

mod variates;
pub use variates::{ExponentialVariates, RandomVariates, Variates};

mod statistics;
pub use statistics::{History, HistoryPoint, Statistics};

mod simulation;
pub use simulation::{Halt, Simulation};

mod theory;
pub use theory::{QueueMetrics, TheoreticalStatistics};

mod report;
pub use report::{Comparison, Report};

/// Customer ID.
#[derive(
    From,
    Into,
    Debug,
    PartialEq,
    PartialOrd,
    Eq,
    Ord,
    Serialize,
    Deserialize,
    Copy,
    Clone,
    Hash,
    Display,
)]
pub struct CustomerId(u64);

/// Invalid simulation parameters or run bounds.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// There must be at least one server.
    #[error("There must be at least one server.")]
    ZeroServers,
    /// Arrival rate is zero, negative, or not a finite number.
    #[error("Arrival rate must be a positive finite number, got {0}.")]
    InvalidArrivalRate(f64),
    /// Service rate is zero, negative, or not a finite number.
    #[error("Service rate must be a positive finite number, got {0}.")]
    InvalidServiceRate(f64),
    /// Neither the time nor the customer bound was given, so the run would never end.
    #[error("At least one of maximum time or maximum customers must be given.")]
    UnboundedRun,
    /// Maximum time is zero, negative, infinite, or not a number.
    #[error("Maximum simulation time must be a positive finite number, got {0}.")]
    InvalidMaxTime(f64),
    /// Maximum number of customers is zero.
    #[error("Maximum number of customers must be positive.")]
    ZeroMaxCustomers,
}

/// Error type encompassing all simulation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Invalid configuration; see [`ConfigError`].
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// Attempted to schedule an event before the current simulation time.
    #[error("Cannot schedule an event at {time} before the current time {now}.")]
    InvalidTime {
        /// Requested event time.
        time: f64,
        /// Simulation time at the moment of scheduling.
        now: f64,
    },
    /// Attempted to schedule an event the simulation cannot process.
    #[error("Cannot schedule {kind:?} of customer {customer}: {reason}.")]
    InvalidEvent {
        /// Requested event type.
        kind: EventKind,
        /// Customer the event concerns.
        customer: CustomerId,
        /// What is wrong with the event.
        reason: &'static str,
    },
}

/// Result alias using [`Error`](enum.Error.html).
pub type Result<T> = std::result::Result<T, Error>;
