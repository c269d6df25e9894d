use crate::buffer::DrainReport;
use crate::population::PopulationUpdate;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct SimulatorMetrics {
    pub ticks: u64,
    pub flows_created: u64,
    pub flows_evicted: u64,
    pub payloads_enqueued: u64,
    pub payloads_dropped: u64,
    pub uploads_accepted: u64,
    pub uploads_rejected: u64,
    pub tick_overruns: u64,
}

impl SimulatorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_population(&mut self, update: &PopulationUpdate) {
        self.flows_created += update.created as u64;
        self.flows_evicted += update.evicted as u64;
    }

    pub fn record_enqueue(&mut self, dropped: usize) {
        self.payloads_enqueued += 1;
        self.payloads_dropped += dropped as u64;
    }

    pub fn record_drain(&mut self, report: &DrainReport) {
        self.uploads_accepted += report.delivered as u64;
        if report.rejected {
            self.uploads_rejected += 1;
        }
    }

    pub fn increment_ticks(&mut self) {
        self.ticks += 1;
    }

    pub fn increment_overruns(&mut self) {
        self.tick_overruns += 1;
    }

    pub fn log_summary(&self) {
        debug!(
            "📊 ticks={} created={} evicted={} enqueued={} dropped={} accepted={} rejected={} overruns={}",
            self.ticks,
            self.flows_created,
            self.flows_evicted,
            self.payloads_enqueued,
            self.payloads_dropped,
            self.uploads_accepted,
            self.uploads_rejected,
            self.tick_overruns
        );
    }
}
