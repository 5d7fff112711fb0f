//! Closed-form predictions of queueing theory for M/M/1 and M/M/c queues.

use serde::Serialize;
use statrs::function::factorial::ln_factorial;

use crate::SimulationConfig;

/// Long-run averages of a stable queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueMetrics {
    /// Mean number of customers in the system, `L`.
    pub avg_customers_in_system: f64,
    /// Mean number of customers in the waiting line, `Lq`.
    pub avg_customers_in_queue: f64,
    /// Mean time a customer spends in the system, `W`.
    pub avg_time_in_system: f64,
    /// Mean time a customer spends waiting, `Wq`.
    pub avg_time_in_queue: f64,
    /// Probability that the system is empty, `P0`.
    pub prob_empty: f64,
    /// Probability that an arriving customer has to wait (Erlang C).
    pub prob_wait: f64,
}

/// Statistics predicted by queueing theory.
///
/// If the traffic intensity `ρ = λ / (c μ)` is at least 1, the waiting line grows without bound
/// and no finite averages exist; only the utilization is reported then.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TheoreticalStatistics {
    /// The queue has a steady state.
    Stable {
        /// Traffic intensity, `ρ`.
        utilization: f64,
        /// Steady-state averages.
        #[serde(flatten)]
        metrics: QueueMetrics,
    },
    /// The queue grows indefinitely.
    Unstable {
        /// Traffic intensity, `ρ`.
        utilization: f64,
    },
}

impl TheoreticalStatistics {
    /// Computes the predictions for `num_servers` servers, arrival rate `arrival_rate`, and
    /// service rate `service_rate` of a single server.
    ///
    /// The parameters are expected to be positive; see [`SimulationConfig::validate`].
    #[must_use]
    pub fn new(num_servers: usize, arrival_rate: f64, service_rate: f64) -> Self {
        let utilization = arrival_rate / (num_servers as f64 * service_rate);
        if utilization >= 1.0 || utilization.is_nan() {
            return Self::Unstable { utilization };
        }
        let metrics = if num_servers == 1 {
            single_server(arrival_rate, service_rate)
        } else {
            erlang_c(num_servers, arrival_rate, service_rate)
        };
        Self::Stable {
            utilization,
            metrics,
        }
    }

    /// Computes the predictions for the given configuration.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.num_servers(),
            config.arrival_rate(),
            config.service_rate(),
        )
    }

    /// Traffic intensity, `ρ`.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        match self {
            Self::Stable { utilization, .. } | Self::Unstable { utilization } => *utilization,
        }
    }

    /// Checks if the queue has a steady state.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        matches!(self, Self::Stable { .. })
    }

    /// Steady-state averages, or `None` if the queue is unstable.
    #[must_use]
    pub fn metrics(&self) -> Option<&QueueMetrics> {
        match self {
            Self::Stable { metrics, .. } => Some(metrics),
            Self::Unstable { .. } => None,
        }
    }
}

/// M/M/1 closed forms.
fn single_server(lambda: f64, mu: f64) -> QueueMetrics {
    let rho = lambda / mu;
    QueueMetrics {
        avg_customers_in_system: lambda / (mu - lambda),
        avg_customers_in_queue: lambda * lambda / (mu * (mu - lambda)),
        avg_time_in_system: 1.0 / (mu - lambda),
        avg_time_in_queue: lambda / (mu * (mu - lambda)),
        prob_empty: 1.0 - rho,
        prob_wait: rho,
    }
}

/// M/M/c predictions based on the Erlang C formula.
///
/// The terms `a^n / n!` of the normalizing sum are computed as logarithms and combined with the
/// log-sum-exp trick, so neither powers nor factorials overflow for large `c`.
fn erlang_c(servers: usize, lambda: f64, mu: f64) -> QueueMetrics {
    let c = servers as f64;
    let rho = lambda / (c * mu);
    let ln_load = (lambda / mu).ln();
    let ln_term = |n: usize| n as f64 * ln_load - ln_factorial(n as u64);
    let ln_waiting_term = ln_term(servers) - (1.0 - rho).ln();
    let ln_terms: Vec<f64> = (0..servers).map(ln_term).collect();
    let max = ln_terms.iter().copied().fold(ln_waiting_term, f64::max);
    let scaled_sum = ln_terms.iter().map(|t| (t - max).exp()).sum::<f64>()
        + (ln_waiting_term - max).exp();

    let prob_empty = (-(max + scaled_sum.ln())).exp();
    let prob_wait = (ln_waiting_term - max).exp() / scaled_sum;

    let avg_customers_in_queue = prob_wait * rho / (1.0 - rho);
    let avg_time_in_queue = avg_customers_in_queue / lambda;
    let avg_time_in_system = avg_time_in_queue + 1.0 / mu;
    QueueMetrics {
        avg_customers_in_system: lambda * avg_time_in_system,
        avg_customers_in_queue,
        avg_time_in_system,
        avg_time_in_queue,
        prob_empty,
        prob_wait,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_cmp::approx_eq;
    use rstest::rstest;

    fn assert_metrics(actual: &QueueMetrics, expected: &QueueMetrics) {
        let close = |a: f64, b: f64| approx_eq!(f64, a, b, epsilon = 1e-9);
        let pairs = [
            (actual.avg_customers_in_system, expected.avg_customers_in_system),
            (actual.avg_customers_in_queue, expected.avg_customers_in_queue),
            (actual.avg_time_in_system, expected.avg_time_in_system),
            (actual.avg_time_in_queue, expected.avg_time_in_queue),
            (actual.prob_empty, expected.prob_empty),
            (actual.prob_wait, expected.prob_wait),
        ];
        for (a, e) in &pairs {
            assert!(close(*a, *e), "{:?} != {:?}", actual, expected);
        }
    }

    #[test]
    fn test_single_server() {
        let stats = TheoreticalStatistics::new(1, 0.8, 1.0);
        assert!(stats.is_stable());
        assert!(approx_eq!(f64, stats.utilization(), 0.8));
        assert_metrics(
            stats.metrics().unwrap(),
            &QueueMetrics {
                avg_customers_in_system: 4.0,
                avg_customers_in_queue: 3.2,
                avg_time_in_system: 5.0,
                avg_time_in_queue: 4.0,
                prob_empty: 0.2,
                prob_wait: 0.8,
            },
        );
    }

    #[test]
    fn test_three_servers() {
        let stats = TheoreticalStatistics::new(3, 2.0, 1.0);
        assert!(approx_eq!(f64, stats.utilization(), 2.0 / 3.0));
        assert_metrics(
            stats.metrics().unwrap(),
            &QueueMetrics {
                avg_customers_in_system: 26.0 / 9.0,
                avg_customers_in_queue: 8.0 / 9.0,
                avg_time_in_system: 13.0 / 9.0,
                avg_time_in_queue: 4.0 / 9.0,
                prob_empty: 1.0 / 9.0,
                prob_wait: 4.0 / 9.0,
            },
        );
    }

    #[test]
    fn test_two_servers() {
        let stats = TheoreticalStatistics::new(2, 1.0, 1.0);
        let metrics = stats.metrics().unwrap();
        assert!(approx_eq!(f64, metrics.prob_empty, 1.0 / 3.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, metrics.prob_wait, 1.0 / 3.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, metrics.avg_customers_in_queue, 1.0 / 3.0, epsilon = 1e-12));
    }

    #[test]
    fn test_erlang_c_agrees_with_single_server_formulas() {
        for &(lambda, mu) in &[(0.1, 1.0), (0.8, 1.0), (2.0, 3.0), (9.5, 10.0)] {
            assert_metrics(&erlang_c(1, lambda, mu), &single_server(lambda, mu));
        }
    }

    #[rstest(
        servers,
        lambda,
        mu,
        case(1, 1.0, 1.0),
        case(1, 2.0, 1.0),
        case(3, 3.0, 1.0),
        case(4, 10.0, 2.0)
    )]
    fn test_unstable(servers: usize, lambda: f64, mu: f64) {
        let stats = TheoreticalStatistics::new(servers, lambda, mu);
        assert!(!stats.is_stable());
        assert!(stats.metrics().is_none());
        assert!(approx_eq!(
            f64,
            stats.utilization(),
            lambda / (servers as f64 * mu)
        ));
    }

    #[rstest(
        servers,
        lambda,
        mu,
        case(2, 1.5, 1.0),
        case(10, 9.0, 1.0),
        case(100, 95.0, 1.0),
        case(500, 450.0, 1.0),
        case(2000, 1999.0, 1.0)
    )]
    fn test_finite_and_littles_law(servers: usize, lambda: f64, mu: f64) {
        let stats = TheoreticalStatistics::new(servers, lambda, mu);
        let m = stats.metrics().unwrap();
        for value in &[
            m.avg_customers_in_system,
            m.avg_customers_in_queue,
            m.avg_time_in_system,
            m.avg_time_in_queue,
            m.prob_wait,
        ] {
            assert!(value.is_finite() && *value >= 0.0, "{:?}", m);
        }
        assert!(m.prob_empty >= 0.0 && m.prob_empty <= 1.0);
        assert!(m.prob_wait <= 1.0);
        assert!(approx_eq!(
            f64,
            m.avg_customers_in_system,
            lambda * m.avg_time_in_system,
            epsilon = 1e-9
        ));
        assert!(approx_eq!(
            f64,
            m.avg_customers_in_queue,
            lambda * m.avg_time_in_queue,
            epsilon = 1e-9
        ));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(TheoreticalStatistics::new(1, 1.0, 1.0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "unstable", "utilization": 1.0})
        );
        let json = serde_json::to_value(TheoreticalStatistics::new(1, 0.5, 1.0)).unwrap();
        assert_eq!(json["status"], "stable");
        assert_eq!(json["avg_time_in_queue"], 1.0);
    }
}
