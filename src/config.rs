use crate::error::SimError;
use clap::Parser;
use std::path::PathBuf;

// Interface topology
pub const DEFAULT_LAN_INTERFACES: usize = 2;
pub const DEFAULT_WAN_INTERFACES: usize = 1;
pub const DEFAULT_REMOTE_NETWORKS: usize = 64;

// Flow budget and timing
pub const DAY_SECS: u64 = 86_400;
pub const DEFAULT_FLOWS_PER_DAY: u64 = 1_000_000;
pub const DEFAULT_INTERVAL_SECS: u64 = 15;

// Eviction bounds, percent of the total population per tick
pub const DEFAULT_REAP_LOW_PCT: u32 = 5;
pub const DEFAULT_REAP_HIGH_PCT: u32 = 15;

// Upload buffer cap and transport
pub const DEFAULT_BUFFER_KB: usize = 4096;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COLLECTOR_URL: &str = "http://127.0.0.1:8080/ingest";
pub const DEFAULT_CLIENT_ID: &str = "00-00-00-00";
pub const DEFAULT_REALM_PATH: &str = "/var/lib/flow-simulator/realm-uuid";
pub const DEFAULT_LOG_FACILITY: &str = "local0";

// Fraction of IP bytes added on top for link-layer framing
pub const DEFAULT_WIRE_OVERHEAD: f64 = 0.04;

// Payload schema
pub const SCHEMA_VERSION: f64 = 1.9;
pub const LEGACY_SCHEMA_VERSION: f64 = 1.0;

#[derive(Parser, Debug, Clone)]
#[command(name = "flow-simulator")]
#[command(about = "Synthetic flow telemetry generator", long_about = None)]
pub struct Config {
    /// Number of simulated LAN interfaces
    #[arg(long, env = "FLOWSIM_LAN_INTERFACES", default_value_t = DEFAULT_LAN_INTERFACES)]
    pub lan_interfaces: usize,
    /// Number of simulated WAN interfaces
    #[arg(long, env = "FLOWSIM_WAN_INTERFACES", default_value_t = DEFAULT_WAN_INTERFACES)]
    pub wan_interfaces: usize,
    /// Size of the remote network pool used for non-local endpoints
    #[arg(long, env = "FLOWSIM_REMOTE_NETWORKS", default_value_t = DEFAULT_REMOTE_NETWORKS)]
    pub remote_networks: usize,
    /// Daily flow creation budget
    #[arg(long, env = "FLOWSIM_FLOWS_PER_DAY", default_value_t = DEFAULT_FLOWS_PER_DAY)]
    pub flows_per_day: u64,
    /// Seconds between ticks
    #[arg(long, env = "FLOWSIM_INTERVAL_SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    pub interval_secs: u64,
    /// Lower bound of the per-tick eviction percentage
    #[arg(long, env = "FLOWSIM_REAP_LOW_PCT", default_value_t = DEFAULT_REAP_LOW_PCT)]
    pub reap_low_pct: u32,
    /// Upper bound of the per-tick eviction percentage
    #[arg(long, env = "FLOWSIM_REAP_HIGH_PCT", default_value_t = DEFAULT_REAP_HIGH_PCT)]
    pub reap_high_pct: u32,
    /// Upload buffer cap in kilobytes
    #[arg(long, env = "FLOWSIM_BUFFER_KB", default_value_t = DEFAULT_BUFFER_KB)]
    pub buffer_kb: usize,
    /// Collector endpoint receiving the payloads
    #[arg(long, env = "FLOWSIM_COLLECTOR_URL", default_value = DEFAULT_COLLECTOR_URL)]
    pub collector_url: String,
    /// Client identifier sent with every upload
    #[arg(long, env = "FLOWSIM_CLIENT_ID", default_value = DEFAULT_CLIENT_ID)]
    pub client_id: String,
    /// Realm identifier file, created on first run
    #[arg(long, env = "FLOWSIM_REALM_PATH", default_value = DEFAULT_REALM_PATH)]
    pub realm_path: PathBuf,
    /// Transport timeout for one exchange
    #[arg(long, env = "FLOWSIM_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    /// Fraction of IP bytes counted as wire overhead
    #[arg(long, env = "FLOWSIM_WIRE_OVERHEAD", default_value_t = DEFAULT_WIRE_OVERHEAD)]
    pub wire_overhead: f64,
    /// Fixed RNG seed for reproducible runs
    #[arg(long, env = "FLOWSIM_SEED")]
    pub seed: Option<u64>,
    /// Enable debug logging
    #[arg(long, env = "FLOWSIM_DEBUG")]
    pub debug: bool,
    /// Log facility name
    #[arg(long, env = "FLOWSIM_LOG_FACILITY", default_value = DEFAULT_LOG_FACILITY)]
    pub log_facility: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lan_interfaces: DEFAULT_LAN_INTERFACES,
            wan_interfaces: DEFAULT_WAN_INTERFACES,
            remote_networks: DEFAULT_REMOTE_NETWORKS,
            flows_per_day: DEFAULT_FLOWS_PER_DAY,
            interval_secs: DEFAULT_INTERVAL_SECS,
            reap_low_pct: DEFAULT_REAP_LOW_PCT,
            reap_high_pct: DEFAULT_REAP_HIGH_PCT,
            buffer_kb: DEFAULT_BUFFER_KB,
            collector_url: DEFAULT_COLLECTOR_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            realm_path: PathBuf::from(DEFAULT_REALM_PATH),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            wire_overhead: DEFAULT_WIRE_OVERHEAD,
            seed: None,
            debug: false,
            log_facility: DEFAULT_LOG_FACILITY.to_string(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.lan_interfaces + self.wan_interfaces == 0 {
            return Err(SimError::Config("no interfaces defined".into()));
        }
        if self.lan_interfaces > 256 || self.wan_interfaces > 256 {
            return Err(SimError::Config("at most 256 interfaces per role".into()));
        }
        if self.interval_secs == 0 {
            return Err(SimError::Config("interval must be at least one second".into()));
        }
        if self.remote_networks == 0 {
            return Err(SimError::Config("remote network pool is empty".into()));
        }
        if self.reap_low_pct > self.reap_high_pct || self.reap_high_pct > 100 {
            return Err(SimError::Config(format!(
                "invalid eviction bounds {}..{}",
                self.reap_low_pct, self.reap_high_pct
            )));
        }
        if !self.wire_overhead.is_finite() || self.wire_overhead < 0.0 {
            return Err(SimError::Config(format!(
                "invalid wire overhead {}",
                self.wire_overhead
            )));
        }
        Ok(())
    }

    pub fn interface_count(&self) -> usize {
        self.lan_interfaces + self.wan_interfaces
    }

    pub fn buffer_cap_bytes(&self) -> usize {
        self.buffer_kb.saturating_mul(1024)
    }

    /// Population each tick tries to reach: the daily budget spread over
    /// the number of ticks in a day, rounded up.
    pub fn target_population(&self) -> usize {
        let ticks_per_day = DAY_SECS as f64 / self.interval_secs as f64;
        (self.flows_per_day as f64 / ticks_per_day).ceil() as usize
    }
}
