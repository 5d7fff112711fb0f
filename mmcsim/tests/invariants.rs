use mmcsim::{Simulation, SimulationConfig, StopCondition};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;

fn rate(value: u8) -> f64 {
    0.1 + f64::from(value) / 50.0
}

fn simulation(seed: u64, servers: u8, arrival: u8, service: u8) -> Simulation {
    let servers = usize::from(servers % 8) + 1;
    let config = SimulationConfig::new(servers, rate(arrival), rate(service))
        .unwrap()
        .seed(seed);
    Simulation::from_config(config).unwrap()
}

fn stop() -> StopCondition {
    StopCondition::customers(200).max_time(10_000.0)
}

#[quickcheck]
fn prop_state_invariants_hold_after_every_event(
    seed: u64,
    servers: u8,
    arrival: u8,
    service: u8,
) -> TestResult {
    let mut sim = simulation(seed, servers, arrival, service);
    let num_servers = sim.config().num_servers();
    let mut last_time = sim.current_time();
    let mut violations = Vec::new();
    sim.run_with(stop(), |s| {
        if s.current_time() < last_time {
            violations.push(format!("time went back to {}", s.current_time()));
        }
        last_time = s.current_time();
        if s.busy_servers() > num_servers {
            violations.push(format!("{} busy servers", s.busy_servers()));
        }
        if s.queue_length() > 0 && s.busy_servers() < num_servers {
            violations.push(String::from("customers wait while a server is idle"));
        }
        if s.pending_arrivals() != 1 {
            violations.push(format!("{} pending arrivals", s.pending_arrivals()));
        }
    })
    .unwrap();
    if violations.is_empty() {
        TestResult::passed()
    } else {
        TestResult::error(violations.join("; "))
    }
}

#[quickcheck]
fn prop_departed_customers_have_consistent_times(
    seed: u64,
    servers: u8,
    arrival: u8,
    service: u8,
) -> bool {
    let mut sim = simulation(seed, servers, arrival, service);
    let mut consistent = true;
    sim.run_with(stop(), |s| {
        if let Some(customer) = s.last_departure() {
            let waiting = customer.waiting_time().unwrap_or(-1.0);
            let system = customer.system_time().unwrap_or(-1.0);
            consistent &= waiting >= 0.0 && system >= waiting;
        }
    })
    .unwrap();
    consistent
}

#[quickcheck]
fn prop_seeded_runs_are_deterministic(seed: u64, servers: u8, arrival: u8, service: u8) -> bool {
    let mut lhs = simulation(seed, servers, arrival, service);
    let mut rhs = simulation(seed, servers, arrival, service);
    lhs.run_until(stop()).unwrap();
    rhs.run_until(stop()).unwrap();
    lhs.statistics() == rhs.statistics() && lhs.history() == rhs.history()
}

#[quickcheck]
fn prop_utilization_is_a_fraction(seed: u64, servers: u8, arrival: u8, service: u8) -> bool {
    let mut sim = simulation(seed, servers, arrival, service);
    sim.run_until(stop()).unwrap();
    let stats = sim.statistics();
    stats.server_utilization >= 0.0
        && stats.server_utilization <= 1.0 + 1e-9
        && stats.avg_queue_length >= 0.0
        && stats.customers_served <= stats.customers_arrived
}
