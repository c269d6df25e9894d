use crate::population::FlowPopulation;
use crate::types::{Flow, InterfaceStats};
use tracing::debug;

const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;

/// Per-interface counters, rebuilt from the live flows every tick.
#[derive(Debug)]
pub struct StatsAggregator {
    stats: Vec<InterfaceStats>,
    wire_overhead: f64,
}

impl StatsAggregator {
    pub fn new(interface_count: usize, wire_overhead: f64) -> Self {
        Self {
            stats: vec![InterfaceStats::default(); interface_count],
            wire_overhead,
        }
    }

    pub fn recompute(&mut self, population: &FlowPopulation) {
        for (index, stats) in self.stats.iter_mut().enumerate() {
            *stats = aggregate(population.flows(index), self.wire_overhead);
        }

        let packets: u64 = self.stats.iter().map(|s| s.ip).sum();
        let bytes: u64 = self.stats.iter().map(|s| s.ip_bytes).sum();
        debug!("📊 Stats recomputed: {} packets, {} bytes", packets, bytes);
    }

    pub fn get(&self, index: usize) -> Option<&InterfaceStats> {
        self.stats.get(index)
    }
}

/// Fold one interface's flows into fresh counters. Encapsulation counters
/// have no simulated source and stay zero.
pub fn aggregate<'a>(flows: impl IntoIterator<Item = &'a Flow>, wire_overhead: f64) -> InterfaceStats {
    let mut stats = InterfaceStats::default();
    for flow in flows {
        let packets = flow.local_packets + flow.other_packets;
        let bytes = flow.local_bytes + flow.other_bytes;

        stats.raw += packets;
        stats.ethernet += packets;
        stats.ip += packets;
        match flow.ip_protocol {
            IPPROTO_TCP => stats.tcp += packets,
            IPPROTO_UDP => stats.udp += packets,
            _ => {}
        }

        stats.ip_bytes += bytes;
        stats.largest_bytes = stats.largest_bytes.max(flow.local_bytes.max(flow.other_bytes));
        stats.wire_bytes += (bytes as f64 * wire_overhead) as u64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_flow;

    fn flow(local: u64, other: u64, proto: u8) -> Flow {
        let mut flow = sample_flow("lan0");
        flow.ip_protocol = proto;
        flow.local_packets = local;
        flow.other_packets = other;
        flow.local_bytes = local;
        flow.other_bytes = other;
        flow
    }

    #[test]
    fn test_tcp_udp_split() {
        let flows = [flow(10, 20, 6), flow(5, 5, 17)];
        let stats = aggregate(&flows, 0.04);
        assert_eq!(stats.ip, 40);
        assert_eq!(stats.raw, 40);
        assert_eq!(stats.ethernet, 40);
        assert_eq!(stats.tcp, 30);
        assert_eq!(stats.udp, 10);
        assert_eq!(stats.largest_bytes, 20);
        assert_eq!(stats.ip_bytes, 40);
        // 30 * 0.04 = 1.2 → 1, 10 * 0.04 = 0.4 → 0
        assert_eq!(stats.wire_bytes, 1);
        assert_eq!(stats.mpls + stats.pppoe + stats.vlan, 0);
        assert_eq!(stats.fragmented + stats.discarded + stats.discarded_bytes, 0);
    }

    #[test]
    fn test_other_protocols_only_count_as_ip() {
        let stats = aggregate(&[flow(3, 4, 1)], 0.0);
        assert_eq!(stats.ip, 7);
        assert_eq!(stats.tcp + stats.udp, 0);
        assert_eq!(stats.wire_bytes, 0);
    }

    #[test]
    fn test_empty_interface_is_zeroed() {
        let stats = aggregate(std::iter::empty(), 0.04);
        assert_eq!(stats, InterfaceStats::default());
    }
}
