use crate::aggregator::StatsAggregator;
use crate::buffer::{DrainReport, UploadBuffer};
use crate::client::CollectorClient;
use crate::config::Config;
use crate::error::SimError;
use crate::interfaces::InterfaceRegistry;
use crate::metrics::SimulatorMetrics;
use crate::payload;
use crate::population::{FlowPopulation, PopulationUpdate};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::info;

/// Owns every piece of simulator state. Nothing else mutates it.
pub struct Simulator {
    registry: InterfaceRegistry,
    population: FlowPopulation,
    aggregator: StatsAggregator,
    buffer: UploadBuffer,
    rng: SmallRng,
    flows_per_day: u64,
    flows_remaining: u64,
    metrics: SimulatorMetrics,
}

impl Simulator {
    pub fn new(config: &Config) -> Result<Self, SimError> {
        let rng = match config.seed {
            Some(seed) => {
                info!("🎲 Using fixed seed {}", seed);
                SmallRng::seed_from_u64(seed)
            }
            None => SmallRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: &Config, mut rng: SmallRng) -> Result<Self, SimError> {
        config.validate()?;
        let registry = InterfaceRegistry::build(config, &mut rng)?;
        let population = FlowPopulation::new(config, registry.count());
        let aggregator = StatsAggregator::new(registry.count(), config.wire_overhead);

        Ok(Self {
            registry,
            population,
            aggregator,
            buffer: UploadBuffer::new(config.buffer_cap_bytes()),
            rng,
            flows_per_day: config.flows_per_day,
            flows_remaining: config.flows_per_day,
            metrics: SimulatorMetrics::new(),
        })
    }

    pub fn reset_daily_budget(&mut self) {
        info!(
            "🌅 Daily flow budget reset: {} unused of {}",
            self.flows_remaining, self.flows_per_day
        );
        self.flows_remaining = self.flows_per_day;
    }

    /// Update the population, rebuild stats and queue a snapshot.
    pub fn step(&mut self, now_ms: i64) -> Result<PopulationUpdate, SimError> {
        self.metrics.increment_ticks();

        let update = self.population.update(
            &self.registry,
            &mut self.rng,
            now_ms,
            &mut self.flows_remaining,
        );
        self.metrics.record_population(&update);

        self.aggregator.recompute(&self.population);

        let blob = payload::encode(&self.registry, &self.population, &self.aggregator, now_ms / 1000)?;
        let dropped = self.buffer.enqueue(blob);
        self.metrics.record_enqueue(dropped);

        Ok(update)
    }

    pub async fn deliver<C: CollectorClient>(&mut self, client: &C) -> Result<DrainReport, SimError> {
        let report = self.buffer.drain(client).await?;
        self.metrics.record_drain(&report);
        self.metrics.log_summary();
        Ok(report)
    }

    pub async fn tick<C: CollectorClient>(&mut self, client: &C, now_ms: i64) -> Result<(), SimError> {
        self.step(now_ms)?;
        self.deliver(client).await?;
        if !self.buffer.is_empty() {
            info!(
                "📦 {} payload(s) awaiting redelivery ({} bytes)",
                self.buffer.len(),
                self.buffer.total_bytes()
            );
        }
        Ok(())
    }

    pub fn population(&self) -> &FlowPopulation {
        &self.population
    }

    pub fn metrics(&self) -> &SimulatorMetrics {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut SimulatorMetrics {
        &mut self.metrics
    }
}
