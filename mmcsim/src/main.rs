//! M/M/c queue simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::default_trait_access,
    clippy::inline_always
)]

use std::convert::TryFrom;
use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use eyre::WrapErr;
use indicatif::{ProgressBar, ProgressStyle};

use mmcsim::{Halt, Report, Simulation, SimulationConfig, StopCondition};

/// Format of the final report.
#[derive(strum::EnumString, strum::ToString, Clone, Copy)]
#[strum(serialize_all = "snake_case")]
enum OutputFormat {
    /// Human-readable table.
    Table,
    /// JSON object; see [`Report`].
    Json,
}

/// Runs M/M/c queue simulation and compares the results with queueing theory.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Number of servers.
    #[clap(short = 'c', long, default_value = "1")]
    servers: usize,

    /// Mean number of arrivals per time unit.
    #[clap(short = 'l', long, default_value = "1.0")]
    arrival_rate: f64,

    /// Mean number of customers a single server serves per time unit.
    #[clap(short = 'm', long, default_value = "1.5")]
    service_rate: f64,

    /// Path to a JSON file with the number of servers, rates, and optionally a seed.
    /// If given, it replaces `--servers`, `--arrival-rate`, and `--service-rate`.
    #[clap(long)]
    config: Option<PathBuf>,

    /// Stop before the first event after this time.
    #[clap(short = 't', long)]
    max_time: Option<f64>,

    /// Stop after serving this many customers.
    #[clap(short = 'n', long)]
    max_customers: Option<usize>,

    /// Random seed. Takes precedence over the seed in the config file.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Report format: `table` or `json`.
    #[clap(short, long, default_value = "table")]
    format: OutputFormat,

    /// Write the queue length time series to this CSV file.
    #[clap(long)]
    history_output: Option<PathBuf>,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: u64,

    /// Store the logs this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr and do not show the progress bar.
    #[clap(long)]
    no_stderr: bool,
}

struct RunConfig {
    simulation: SimulationConfig,
    stop: StopCondition,
    format: OutputFormat,
    history_output: Option<PathBuf>,
    show_progress: bool,
}

impl TryFrom<Opt> for RunConfig {
    type Error = eyre::Error;
    fn try_from(opt: Opt) -> eyre::Result<Self> {
        let simulation = if let Some(path) = &opt.config {
            let file = File::open(path).wrap_err_with(|| {
                format!("unable to open config file: {}", path.display())
            })?;
            let config: SimulationConfig =
                serde_json::from_reader(file).wrap_err("unable to parse config file")?;
            config.validate().wrap_err("invalid config file")?;
            config
        } else {
            SimulationConfig::new(opt.servers, opt.arrival_rate, opt.service_rate)?
        };
        let simulation = match opt.seed {
            Some(seed) => simulation.seed(seed),
            None => simulation,
        };
        let stop = StopCondition::new(opt.max_time, opt.max_customers);
        stop.validate().wrap_err("invalid stop condition")?;
        Ok(Self {
            simulation,
            stop,
            format: opt.format,
            history_output: opt.history_output,
            show_progress: !opt.no_stderr,
        })
    }
}

impl RunConfig {
    /// Progress bar measuring simulated time if bounded by time, or served customers otherwise.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let length = match (self.stop.time_limit(), self.stop.customer_limit()) {
            (Some(time), _) => time.ceil() as u64,
            (None, Some(customers)) => customers as u64,
            (None, None) => return ProgressBar::hidden(),
        };
        ProgressBar::new(length)
            .with_style(ProgressStyle::default_bar().template("{msg} {wide_bar} {percent}%"))
    }

    /// Runs the simulation, reporting progress after each event.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn run_with_progress(&self, simulation: &mut Simulation) -> eyre::Result<Halt> {
        let pb = self.progress_bar();
        let by_time = self.stop.time_limit().is_some();
        let halt = simulation.run_with(self.stop, |sim| {
            let stats = sim.statistics();
            let position = if by_time {
                sim.current_time().floor() as u64
            } else {
                stats.customers_served as u64
            };
            if pb.position() < position {
                pb.set_position(position);
                pb.set_message(&format!(
                    "[t={time}] [Q={queue}] [B={busy}] [A={arrived}] [S={served}]",
                    time = sim.current_time().floor(),
                    queue = stats.current_queue_length,
                    busy = stats.busy_servers,
                    arrived = stats.customers_arrived,
                    served = stats.customers_served,
                ));
            }
        })?;
        pb.finish();
        Ok(halt)
    }

    /// Runs the simulation based on the given configuration.
    fn run(&self) -> eyre::Result<()> {
        let utilization = self.simulation.utilization();
        if utilization >= 1.0 {
            log::warn!(
                "Utilization ρ = {:.4} >= 1: the system is unstable and the queue will keep growing",
                utilization
            );
        }

        let mut simulation = Simulation::from_config(self.simulation.clone())?;
        if let Some(seed) = simulation.config().random_seed() {
            log::info!("Random seed: {}", seed);
        }
        let halt = self.run_with_progress(&mut simulation)?;
        log::info!(
            "Simulation stopped at {:.4} ({:?}) after {} events",
            simulation.current_time(),
            halt,
            simulation.history().len()
        );

        if let Some(path) = &self.history_output {
            let file = File::create(path)
                .wrap_err_with(|| format!("unable to create file: {}", path.display()))?;
            simulation
                .history()
                .write_csv(io::BufWriter::new(file))
                .wrap_err("unable to write history")?;
            log::info!("History written to {}", path.display());
        }

        let report = Report::new(simulation.config().clone(), simulation.statistics());
        match self.format {
            OutputFormat::Table => print!("{}", report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }
        Ok(())
    }
}

/// Sets up a logger based on the given user options.
///
/// Verbosity applies to the simulator's own messages only; dependencies log warnings and errors.
/// Each line carries the module it comes from, e.g., `mmcsim::simulation` for the per-event
/// trace, whose messages start with the simulated time.
fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let level = match opt.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] [{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Warn)
        .level_for("mmcsim", level);
    if let Some(path) = &opt.log_output {
        dispatch = dispatch.chain(File::create(path)?);
    }
    if !opt.no_stderr {
        dispatch = dispatch.chain(io::stderr());
    }
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    let conf = RunConfig::try_from(opt)?;
    conf.run()
}
