use std::fmt;

use serde::Serialize;

use crate::{SimulationConfig, Statistics, TheoreticalStatistics};

/// Relative error of a simulated value with respect to the theoretical one, in percent.
///
/// `None` when the theoretical value is zero.
fn relative_error(simulated: f64, theoretical: f64) -> Option<f64> {
    if theoretical <= 0.0 {
        None
    } else {
        Some((simulated - theoretical).abs() / theoretical * 100.0)
    }
}

/// Relative errors of simulated averages, in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Error of the mean waiting time with respect to `Wq`.
    pub waiting_time_error: Option<f64>,
    /// Error of the mean system time with respect to `W`.
    pub system_time_error: Option<f64>,
    /// Error of the mean waiting line length with respect to `Lq`.
    pub queue_length_error: Option<f64>,
}

impl Comparison {
    /// Compares simulated statistics with the theoretical predictions.
    /// Returns `None` for unstable queues, which have nothing to compare against.
    #[must_use]
    pub fn new(simulated: &Statistics, theoretical: &TheoreticalStatistics) -> Option<Self> {
        let metrics = theoretical.metrics()?;
        Some(Self {
            waiting_time_error: relative_error(
                simulated.avg_waiting_time,
                metrics.avg_time_in_queue,
            ),
            system_time_error: relative_error(
                simulated.avg_system_time,
                metrics.avg_time_in_system,
            ),
            queue_length_error: relative_error(
                simulated.avg_queue_length,
                metrics.avg_customers_in_queue,
            ),
        })
    }

    /// Checks if all defined errors are below `percent`.
    #[must_use]
    pub fn within(&self, percent: f64) -> bool {
        [
            self.waiting_time_error,
            self.system_time_error,
            self.queue_length_error,
        ]
        .iter()
        .flatten()
        .all(|&err| err < percent)
    }
}

/// Everything known about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Simulation configuration, including the seed.
    pub config: SimulationConfig,
    /// Simulated statistics.
    pub simulated: Statistics,
    /// Theoretical predictions.
    pub theoretical: TheoreticalStatistics,
    /// Errors of the simulation with respect to the predictions.
    pub comparison: Option<Comparison>,
}

impl Report {
    /// Constructs a report for the given configuration and simulated statistics.
    #[must_use]
    pub fn new(config: SimulationConfig, simulated: Statistics) -> Self {
        let theoretical = TheoreticalStatistics::from_config(&config);
        let comparison = Comparison::new(&simulated, &theoretical);
        Self {
            config,
            simulated,
            theoretical,
            comparison,
        }
    }
}

fn format_error(err: Option<f64>) -> String {
    err.map_or_else(|| String::from("-"), |e| format!("{:.2}%", e))
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sim = &self.simulated;
        writeln!(
            f,
            "M/M/{} queue: λ={}, μ={}, ρ={:.4}",
            self.config.num_servers(),
            self.config.arrival_rate(),
            self.config.service_rate(),
            self.theoretical.utilization()
        )?;
        writeln!(f)?;
        writeln!(f, "Simulation ({:.4} time units)", sim.current_time)?;
        writeln!(f, "  Customers arrived:     {}", sim.customers_arrived)?;
        writeln!(f, "  Customers served:      {}", sim.customers_served)?;
        writeln!(f, "  Avg waiting time:      {:.4}", sim.avg_waiting_time)?;
        writeln!(f, "  Avg system time:       {:.4}", sim.avg_system_time)?;
        writeln!(f, "  Avg queue length:      {:.4}", sim.avg_queue_length)?;
        writeln!(f, "  Max queue length:      {}", sim.max_queue_length)?;
        writeln!(f, "  Server utilization:    {:.4}", sim.server_utilization)?;
        writeln!(f)?;
        match self.theoretical.metrics() {
            Some(m) => {
                writeln!(f, "Theory")?;
                writeln!(f, "  Wq:                    {:.4}", m.avg_time_in_queue)?;
                writeln!(f, "  W:                     {:.4}", m.avg_time_in_system)?;
                writeln!(f, "  Lq:                    {:.4}", m.avg_customers_in_queue)?;
                writeln!(f, "  L:                     {:.4}", m.avg_customers_in_system)?;
                writeln!(f, "  P(wait):               {:.4}", m.prob_wait)?;
            }
            None => writeln!(f, "Theory: unstable system (ρ >= 1), no steady state")?,
        }
        if let Some(cmp) = &self.comparison {
            writeln!(f)?;
            writeln!(f, "Relative error")?;
            writeln!(f, "  Waiting time:          {}", format_error(cmp.waiting_time_error))?;
            writeln!(f, "  System time:           {}", format_error(cmp.system_time_error))?;
            writeln!(f, "  Queue length:          {}", format_error(cmp.queue_length_error))?;
        }
        Ok(())
    }
}
