use std::collections::VecDeque;

use rand::Rng;

use crate::event::Origin;
use crate::statistics::Accumulator;
use crate::{
    Customer, CustomerId, Error, EventKind, EventQueue, ExponentialVariates, History,
    SimulationConfig, Statistics, StopCondition, TheoreticalStatistics, Variates,
};

/// The reason why a run has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The next event occurs after the time bound.
    TimeLimit,
    /// The requested number of customers has been served.
    CustomerLimit,
    /// There are no more events to process.
    Exhausted,
}

/// The main simulation object.
///
/// A simulation owns its clock, the pending events, the waiting line, and the source of random
/// durations. Arrivals schedule themselves: each processed arrival schedules the next one, so
/// there is always exactly one arrival pending, starting with the one scheduled at construction.
///
/// A run can be stopped and continued: the event beyond the time bound stays pending, and the
/// next call to [`Simulation::run`] picks up where the previous one left off.
pub struct Simulation<V: Variates = ExponentialVariates> {
    config: SimulationConfig,
    variates: V,
    current_time: f64,
    events: EventQueue,
    waiting: VecDeque<Customer>,
    busy_servers: usize,
    next_customer_id: u64,
    accumulator: Accumulator,
    history: History,
    last_departure: Option<Customer>,
}

impl Simulation<ExponentialVariates> {
    /// Constructs a simulation of an M/M/c queue with `num_servers` servers, arrival rate
    /// `arrival_rate`, and service rate `service_rate` of each server.
    ///
    /// The random number generator is seeded from the system entropy source.
    /// Use [`Simulation::from_config`] for reproducible runs.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the parameters is out of bounds.
    pub fn new(num_servers: usize, arrival_rate: f64, service_rate: f64) -> crate::Result<Self> {
        Self::from_config(SimulationConfig::new(
            num_servers,
            arrival_rate,
            service_rate,
        )?)
    }

    /// Constructs a simulation from the given configuration. If the configuration has no seed,
    /// a random one is drawn and stored in [`Simulation::config`], so that the run can be
    /// repeated.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: SimulationConfig) -> crate::Result<Self> {
        config.validate()?;
        let config = match config.random_seed() {
            Some(_) => config,
            None => {
                let seed = rand::thread_rng().gen();
                log::debug!("No seed given, using {}", seed);
                config.seed(seed)
            }
        };
        let seed = config.random_seed().unwrap_or_default();
        let variates = ExponentialVariates::from_config(&config, seed)?;
        Self::with_variates(config, variates)
    }

    /// Discards all state and starts over with the same configuration and seed.
    ///
    /// # Errors
    ///
    /// Returns an error only if the configuration has become invalid, which cannot happen for
    /// a simulation constructed through one of the constructors.
    pub fn reset(&mut self) -> crate::Result<()> {
        *self = Self::from_config(self.config.clone())?;
        Ok(())
    }
}

impl<V: Variates> Simulation<V> {
    /// Constructs a simulation drawing interarrival and service times from `variates`.
    /// The rates in `config` are then used only for validation and theoretical statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_variates(config: SimulationConfig, variates: V) -> crate::Result<Self> {
        config.validate()?;
        let mut simulation = Self {
            config,
            variates,
            current_time: 0.0,
            events: EventQueue::default(),
            waiting: VecDeque::new(),
            busy_servers: 0,
            next_customer_id: 0,
            accumulator: Accumulator::default(),
            history: History::default(),
            last_departure: None,
        };
        simulation.schedule_next_arrival();
        Ok(simulation)
    }

    /// Simulation configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current simulation time, i.e., the time of the last processed event.
    #[must_use]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Number of customers waiting for a server.
    #[must_use]
    pub fn queue_length(&self) -> usize {
        self.waiting.len()
    }

    /// Number of servers serving a customer.
    #[must_use]
    pub fn busy_servers(&self) -> usize {
        self.busy_servers
    }

    /// Pending events.
    #[must_use]
    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Number of pending arrival events.
    #[must_use]
    pub fn pending_arrivals(&self) -> usize {
        self.events.count(EventKind::Arrival)
    }

    /// Time series of the queue state.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The customer that departed most recently.
    #[must_use]
    pub fn last_departure(&self) -> Option<&Customer> {
        self.last_departure.as_ref()
    }

    /// Schedules `kind` event for `customer` at `time`.
    ///
    /// Only arrivals can be scheduled from outside. An injected arrival joins the system like
    /// any other customer but, unlike arrivals generated by the simulation, does not schedule
    /// the arrival that follows it. Departures are always scheduled by the simulation itself
    /// when a server picks up a customer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTime`] if `time` is earlier than the current time or not a number,
    /// and [`Error::InvalidEvent`] if the event is a departure or the customer is not a fresh
    /// customer arriving no later than `time`.
    pub fn schedule(&mut self, time: f64, kind: EventKind, customer: Customer) -> crate::Result<()> {
        if time.is_nan() || time < self.current_time {
            return Err(Error::InvalidTime {
                time,
                now: self.current_time,
            });
        }
        let invalid = |reason| Error::InvalidEvent {
            kind,
            customer: customer.id(),
            reason,
        };
        match kind {
            EventKind::Departure => {
                return Err(invalid("departures are scheduled when service starts"));
            }
            EventKind::Arrival => {
                if customer.service_start_time().is_some() || customer.departure_time().is_some() {
                    return Err(invalid("customer has already been served"));
                }
                let arrival_time = customer.arrival_time();
                if arrival_time.is_nan() || arrival_time > time {
                    return Err(invalid("customer arrives after the event time"));
                }
            }
        }
        self.events.push_from(Origin::External, time, kind, customer);
        Ok(())
    }

    /// Runs until one of the bounds is reached. See [`StopCondition`] for details.
    ///
    /// # Errors
    ///
    /// Returns an error if both bounds are missing or any of them is not positive.
    /// In such case, the state is left intact.
    pub fn run(
        &mut self,
        max_time: Option<f64>,
        max_customers: Option<usize>,
    ) -> crate::Result<Halt> {
        self.run_until(StopCondition::new(max_time, max_customers))
    }

    /// Runs until `stop` condition is satisfied.
    ///
    /// # Errors
    ///
    /// Returns an error if `stop` is invalid; see [`StopCondition::validate`].
    pub fn run_until(&mut self, stop: StopCondition) -> crate::Result<Halt> {
        self.run_with(stop, |_| {})
    }

    /// Runs until `stop` condition is satisfied, calling `observer` after each processed event.
    ///
    /// # Errors
    ///
    /// Returns an error if `stop` is invalid; see [`StopCondition::validate`].
    pub fn run_with<F>(&mut self, stop: StopCondition, mut observer: F) -> crate::Result<Halt>
    where
        F: FnMut(&Self),
    {
        stop.validate()?;
        log::debug!(
            "Running M/M/{} simulation (λ={}, μ={}) from {} until {:?}",
            self.config.num_servers(),
            self.config.arrival_rate(),
            self.config.service_rate(),
            self.current_time,
            stop
        );
        let halt = loop {
            let time = match self.events.peek() {
                Some(event) => event.time,
                None => break Halt::Exhausted,
            };
            if stop.exceeds_time(time) {
                break Halt::TimeLimit;
            }
            if stop.reached_customers(self.accumulator.customers_served) {
                break Halt::CustomerLimit;
            }
            if let Some((event, origin)) = self.events.pop_with_origin() {
                self.accumulator
                    .advance(event.time, self.waiting.len(), self.busy_servers);
                debug_assert!(event.time >= self.current_time, "time went backwards");
                self.current_time = event.time;
                self.history
                    .record(self.current_time, self.waiting.len(), self.busy_servers);
                log::trace!(
                    "[{:.6}] {:?} of customer {}",
                    self.current_time,
                    event.kind,
                    event.customer.id()
                );
                match event.kind {
                    EventKind::Arrival => self.handle_arrival(event.customer, origin),
                    EventKind::Departure => self.handle_departure(event.customer),
                }
                observer(self);
            }
        };
        log::debug!(
            "Simulation halted at {} ({:?}): {} arrived, {} served",
            self.current_time,
            halt,
            self.accumulator.customers_arrived,
            self.accumulator.customers_served
        );
        Ok(halt)
    }

    /// Snapshot of the current statistics.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.accumulator.snapshot(
            self.current_time,
            self.config.num_servers(),
            self.waiting.len(),
            self.busy_servers,
        )
    }

    /// Statistics predicted by queueing theory for this configuration.
    #[must_use]
    pub fn theoretical_statistics(&self) -> TheoreticalStatistics {
        TheoreticalStatistics::from_config(&self.config)
    }

    fn next_customer_id(&mut self) -> CustomerId {
        let id = CustomerId::from(self.next_customer_id);
        self.next_customer_id += 1;
        id
    }

    fn schedule_next_arrival(&mut self) {
        let time = self.current_time + self.variates.interarrival_time();
        let customer = Customer::new(self.next_customer_id(), time);
        self.events.push(time, EventKind::Arrival, customer);
    }

    fn start_service(&mut self, mut customer: Customer) {
        customer.start_service(self.current_time);
        let time = self.current_time + self.variates.service_time();
        self.events.push(time, EventKind::Departure, customer);
    }

    fn handle_arrival(&mut self, customer: Customer, origin: Origin) {
        self.accumulator.customers_arrived += 1;
        if self.busy_servers < self.config.num_servers() {
            self.busy_servers += 1;
            self.start_service(customer);
        } else {
            self.waiting.push_back(customer);
        }
        if origin == Origin::Engine {
            self.schedule_next_arrival();
        }
    }

    fn handle_departure(&mut self, mut customer: Customer) {
        customer.depart(self.current_time);
        self.accumulator.record_departure(&customer);
        self.last_departure = Some(customer);
        if let Some(next) = self.waiting.pop_front() {
            self.start_service(next);
        } else {
            debug_assert!(self.busy_servers > 0, "departure from an idle server");
            self.busy_servers = self.busy_servers.saturating_sub(1);
        }
    }
}
