use std::io;

use serde::{Deserialize, Serialize};

use crate::Customer;

/// Snapshot of the simulation statistics.
///
/// All averages are zero until the first customer departs.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of customers that have arrived so far.
    pub customers_arrived: usize,
    /// Number of customers that have been served and left the system.
    pub customers_served: usize,
    /// Mean time served customers spent waiting in the line.
    pub avg_waiting_time: f64,
    /// Mean time served customers spent in the system.
    pub avg_system_time: f64,
    /// Time-weighted mean length of the waiting line.
    pub avg_queue_length: f64,
    /// Longest waiting line observed.
    pub max_queue_length: usize,
    /// Fraction of the server capacity that was in use, between 0 and 1.
    pub server_utilization: f64,
    /// Customers waiting right now.
    pub current_queue_length: usize,
    /// Servers busy right now.
    pub busy_servers: usize,
    /// Current simulation time.
    pub current_time: f64,
}

/// Running totals from which [`Statistics`] are computed.
#[derive(Debug, Default, Clone)]
pub(crate) struct Accumulator {
    pub(crate) customers_arrived: usize,
    pub(crate) customers_served: usize,
    total_waiting_time: f64,
    total_system_time: f64,
    queue_length_integral: f64,
    busy_servers_integral: f64,
    max_queue_length: usize,
    last_event_time: f64,
}

impl Accumulator {
    /// Integrates the state that lasted from the previous event until `time`.
    ///
    /// Must be called with the state as it was *before* the event at `time` is applied.
    pub(crate) fn advance(&mut self, time: f64, queue_length: usize, busy_servers: usize) {
        let elapsed = time - self.last_event_time;
        self.queue_length_integral += queue_length as f64 * elapsed;
        self.busy_servers_integral += busy_servers as f64 * elapsed;
        self.max_queue_length = self.max_queue_length.max(queue_length);
        self.last_event_time = time;
    }

    pub(crate) fn record_departure(&mut self, customer: &Customer) {
        self.customers_served += 1;
        self.total_waiting_time += customer.waiting_time().unwrap_or_default();
        self.total_system_time += customer.system_time().unwrap_or_default();
    }

    pub(crate) fn snapshot(
        &self,
        current_time: f64,
        num_servers: usize,
        current_queue_length: usize,
        busy_servers: usize,
    ) -> Statistics {
        let mut stats = Statistics {
            customers_arrived: self.customers_arrived,
            customers_served: self.customers_served,
            max_queue_length: self.max_queue_length,
            current_queue_length,
            busy_servers,
            current_time,
            ..Statistics::default()
        };
        if self.customers_served == 0 {
            return stats;
        }
        let served = self.customers_served as f64;
        stats.avg_waiting_time = self.total_waiting_time / served;
        stats.avg_system_time = self.total_system_time / served;
        if current_time > 0.0 {
            stats.avg_queue_length = self.queue_length_integral / current_time;
            stats.server_utilization =
                self.busy_servers_integral / (current_time * num_servers as f64);
        }
        stats
    }
}

/// A single point of the simulation history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// Event time.
    pub time: f64,
    /// Number of waiting customers.
    pub queue_length: usize,
    /// Number of customers in the system, waiting or being served.
    pub in_system: usize,
}

/// Time series of the queue state, recorded once per processed event.
///
/// Each point holds the state at the event time, just before the event was applied.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct History {
    times: Vec<f64>,
    queue_lengths: Vec<usize>,
    in_system: Vec<usize>,
}

impl History {
    pub(crate) fn record(&mut self, time: f64, queue_length: usize, busy_servers: usize) {
        self.times.push(time);
        self.queue_lengths.push(queue_length);
        self.in_system.push(queue_length + busy_servers);
    }

    /// Event times.
    #[must_use]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Waiting line lengths, parallel to [`History::times`].
    #[must_use]
    pub fn queue_lengths(&self) -> &[usize] {
        &self.queue_lengths
    }

    /// Numbers of customers in the system, parallel to [`History::times`].
    #[must_use]
    pub fn customers_in_system(&self) -> &[usize] {
        &self.in_system
    }

    /// Number of recorded points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Checks if anything has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Iterates over recorded points.
    pub fn iter(&self) -> impl Iterator<Item = HistoryPoint> + '_ {
        self.times
            .iter()
            .zip(&self.queue_lengths)
            .zip(&self.in_system)
            .map(|((&time, &queue_length), &in_system)| HistoryPoint {
                time,
                queue_length,
                in_system,
            })
    }

    /// Writes the history in CSV format, with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        for point in self.iter() {
            writer.serialize(point)?;
        }
        writer.flush()?;
        Ok(())
    }
}
