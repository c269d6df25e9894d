mod aggregator;
mod buffer;
mod client;
mod config;
mod error;
mod factory;
mod interfaces;
mod metrics;
mod payload;
mod population;
mod realm;
mod scheduler;
mod simulator;
mod types;

use chrono::Utc;
use clap::Parser;
use client::HttpCollector;
use config::Config;
use error::SimError;
use simulator::Simulator;

use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_logging(config.debug);

    let started = Instant::now();
    info!("🚀 >>> Flow simulator (facility {})", config.log_facility);

    let code = match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("💥 Fatal: [{}] {}", e.code(), e);
            ExitCode::from(e.code())
        }
    };

    info!(
        "<<< Flow simulator: {:.02} second(s)",
        started.elapsed().as_secs_f64()
    );
    code
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(config: &Config) -> Result<(), SimError> {
    config.validate()?;

    let realm = realm::load_or_create(&config.realm_path)?;
    info!("🔑 Realm {} ({})", realm, config.realm_path.display());

    // One transport handle for the whole run
    let collector = HttpCollector::new(config)?;
    let mut sim = Simulator::new(config)?;

    info!(
        "🌊 Target population {} flows/tick, budget {} flows/day, buffer cap {} KB",
        sim.population().target(),
        config.flows_per_day,
        config.buffer_kb
    );

    let result = scheduler::run(
        &mut sim,
        &collector,
        Duration::from_secs(config.interval_secs),
        Utc::now,
        scheduler::interrupted(),
    )
    .await;
    sim.metrics().log_summary();
    result
}
