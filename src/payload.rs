use crate::aggregator::StatsAggregator;
use crate::config::SCHEMA_VERSION;
use crate::error::SimError;
use crate::interfaces::InterfaceRegistry;
use crate::population::FlowPopulation;
use crate::types::{InterfaceRole, UploadPayload};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;

// Match digests are not simulated; the collector gets a fixed all-zero value
const EMPTY_MATCH_DIGEST: &str = "0000000000000000000000000000000000000000";

/// Snapshot the whole simulator into one gzip-compressed JSON blob.
pub fn encode(
    registry: &InterfaceRegistry,
    population: &FlowPopulation,
    aggregator: &StatsAggregator,
    timestamp: i64,
) -> Result<Vec<u8>, SimError> {
    let mut payload = UploadPayload {
        version: SCHEMA_VERSION,
        timestamp,
        app_match_digest: EMPTY_MATCH_DIGEST,
        domain_match_digest: EMPTY_MATCH_DIGEST,
        custom_match_digest: EMPTY_MATCH_DIGEST,
        interfaces: BTreeMap::new(),
        devices: BTreeMap::new(),
        stats: BTreeMap::new(),
        flows: BTreeMap::new(),
    };

    for (index, iface) in registry.interfaces().iter().enumerate() {
        let name = iface.name.as_str();
        payload.interfaces.insert(name, iface);
        if let Some(stats) = aggregator.get(index) {
            payload.stats.insert(name, stats);
        }

        let flows: Vec<_> = population.flows(index).collect();
        // Stations only exist behind LAN interfaces
        if iface.role == InterfaceRole::Lan {
            let devices = payload.devices.entry(name).or_default();
            for flow in &flows {
                devices.entry(flow.local_mac).or_default().insert(flow.local_ip);
            }
        }
        payload.flows.insert(name, flows);
    }

    let json = serde_json::to_vec(&payload)?;
    let mut encoder = GzEncoder::new(Vec::with_capacity(json.len() / 4), Compression::default());
    encoder
        .write_all(&json)
        .map_err(|e| SimError::Encode(e.to_string()))?;
    encoder.finish().map_err(|e| SimError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use flate2::read::GzDecoder;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::io::Read;

    #[test]
    fn test_envelope_round_trips_through_gzip() {
        let config = Config {
            lan_interfaces: 1,
            wan_interfaces: 1,
            flows_per_day: 14_400,
            interval_secs: 60,
            ..Config::default()
        };
        let mut rng = SmallRng::seed_from_u64(5);
        let registry = InterfaceRegistry::build(&config, &mut rng).unwrap();
        let mut population = FlowPopulation::new(&config, registry.count());
        let mut remaining = u64::MAX;
        population.update(&registry, &mut rng, 1_000, &mut remaining);
        let mut aggregator = StatsAggregator::new(registry.count(), config.wire_overhead);
        aggregator.recompute(&population);

        let blob = encode(&registry, &population, &aggregator, 1_700_000_000).unwrap();
        let mut json = String::new();
        GzDecoder::new(blob.as_slice()).read_to_string(&mut json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(value["timestamp"], 1_700_000_000);
        assert_eq!(value["app_match_digest"], EMPTY_MATCH_DIGEST);
        assert_eq!(value["interfaces"]["wan0"]["role"], "wan");
        assert_eq!(value["flows"]["lan0"].as_array().unwrap().len(), 5);
        assert_eq!(value["flows"]["wan0"].as_array().unwrap().len(), 5);
        assert!(value["stats"]["lan0"]["ip"].as_u64().unwrap() > 0);
        assert!(value["devices"]["lan0"].as_object().is_some_and(|d| !d.is_empty()));
        assert!(value["devices"].get("wan0").is_none());
    }
}
