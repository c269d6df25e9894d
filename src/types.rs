use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::net::Ipv4Addr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceRole {
    Lan,
    Wan,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interface {
    pub name: String,
    pub role: InterfaceRole,
    pub addressing: Addressing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Addressing {
    /// Private /24; stations are `network.host` with a MAC ending in the host octet.
    Lan {
        network: Ipv4Addr,
        prefix_len: u8,
        station_mac_prefix: [u8; 5],
        router_mac: MacAddr,
    },
    /// Fixed uplink address with the upstream gateway as the far end.
    Wan {
        address: Ipv4Addr,
        mac: MacAddr,
        gateway: Ipv4Addr,
        gateway_mac: MacAddr,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Flow {
    // Identity
    pub interface: String,
    pub ip_version: u8,
    pub ip_protocol: u8,
    pub vlan_id: u16,
    pub local_mac: MacAddr,
    pub other_mac: MacAddr,
    pub local_ip: Ipv4Addr,
    pub other_ip: Ipv4Addr,
    pub local_port: u16,
    pub other_port: u16,
    pub ip_nat: bool,
    pub detected_protocol: u32,
    pub detected_protocol_name: String,
    pub detected_application: u32,
    pub detected_application_name: String,
    pub detection_guessed: bool,
    pub host_server_name: String,
    pub ssl_client_sni: String,
    pub ssl_server_sni: String,
    pub digest: String,

    // Traffic, per-tick deltas
    pub local_packets: u64,
    pub other_packets: u64,
    pub local_bytes: u64,
    pub other_bytes: u64,
    // Traffic, cumulative
    pub total_packets: u64,
    pub total_bytes: u64,
    pub last_seen_at: i64,
}

// Per-tick traffic ranges; the far side carries more than the local side.
const LOCAL_PACKETS: (u64, u64) = (1, 64);
const OTHER_PACKETS: (u64, u64) = (8, 512);
const PACKET_SIZE: (u64, u64) = (64, 1460);

impl Flow {
    /// SHA-256 over the identity fields. Traffic fields never feed into it.
    pub fn compute_digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.interface.as_bytes());
        hasher.update([self.ip_version, self.ip_protocol]);
        hasher.update(self.vlan_id.to_be_bytes());
        hasher.update(self.local_mac.0);
        hasher.update(self.other_mac.0);
        hasher.update(self.local_ip.octets());
        hasher.update(self.other_ip.octets());
        hasher.update(self.local_port.to_be_bytes());
        hasher.update(self.other_port.to_be_bytes());
        hasher.update([self.ip_nat as u8, self.detection_guessed as u8]);
        hasher.update(self.detected_protocol.to_be_bytes());
        hasher.update(self.detected_protocol_name.as_bytes());
        hasher.update(self.detected_application.to_be_bytes());
        hasher.update(self.detected_application_name.as_bytes());
        for name in [&self.host_server_name, &self.ssl_client_sni, &self.ssl_server_sni] {
            hasher.update((name.len() as u32).to_be_bytes());
            hasher.update(name.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Replace the per-tick deltas and fold them into the totals.
    pub fn update<R: Rng + ?Sized>(&mut self, rng: &mut R, now_ms: i64) {
        self.local_packets = rng.random_range(LOCAL_PACKETS.0..=LOCAL_PACKETS.1);
        self.other_packets = rng.random_range(OTHER_PACKETS.0..=OTHER_PACKETS.1);
        self.local_bytes = self.local_packets * rng.random_range(PACKET_SIZE.0..=PACKET_SIZE.1);
        self.other_bytes = self.other_packets * rng.random_range(PACKET_SIZE.0..=PACKET_SIZE.1);

        self.total_packets += self.local_packets + self.other_packets;
        self.total_bytes += self.local_bytes + self.other_bytes;
        self.last_seen_at = now_ms;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceStats {
    pub raw: u64,
    pub ethernet: u64,
    pub mpls: u64,
    pub pppoe: u64,
    pub vlan: u64,
    pub fragmented: u64,
    pub discarded: u64,
    pub discarded_bytes: u64,
    pub largest_bytes: u64,
    pub ip: u64,
    pub tcp: u64,
    pub udp: u64,
    pub ip_bytes: u64,
    pub wire_bytes: u64,
}

#[derive(Debug, Serialize)]
pub struct UploadPayload<'a> {
    pub version: f64,
    pub timestamp: i64,
    pub app_match_digest: &'a str,
    pub domain_match_digest: &'a str,
    pub custom_match_digest: &'a str,
    pub interfaces: BTreeMap<&'a str, &'a Interface>,
    pub devices: BTreeMap<&'a str, BTreeMap<MacAddr, BTreeSet<Ipv4Addr>>>,
    pub stats: BTreeMap<&'a str, &'a InterfaceStats>,
    pub flows: BTreeMap<&'a str, Vec<&'a Flow>>,
}

#[derive(Debug, Deserialize)]
pub struct CollectorResponse {
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(default)]
    pub data: Option<ResponseError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

pub const RESPONSE_OK: i64 = 1;
pub const RESPONSE_ERROR: i64 = 2;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    pub(crate) fn sample_flow(interface: &str) -> Flow {
        let mut flow = Flow {
            interface: interface.to_string(),
            ip_version: 4,
            ip_protocol: 6,
            vlan_id: 0,
            local_mac: MacAddr([0x02, 0, 0, 0, 0, 0x64]),
            other_mac: MacAddr([0x02, 0, 0, 0xff, 0, 1]),
            local_ip: Ipv4Addr::new(10, 0, 0, 100),
            other_ip: Ipv4Addr::new(151, 101, 1, 69),
            local_port: 50_000,
            other_port: 443,
            ip_nat: false,
            detected_protocol: 91,
            detected_protocol_name: "TLS".into(),
            detected_application: 10_119,
            detected_application_name: "netify.github".into(),
            detection_guessed: false,
            host_server_name: String::new(),
            ssl_client_sni: "github.com".into(),
            ssl_server_sni: String::new(),
            digest: String::new(),
            local_packets: 0,
            other_packets: 0,
            local_bytes: 0,
            other_bytes: 0,
            total_packets: 0,
            total_bytes: 0,
            last_seen_at: 0,
        };
        flow.digest = flow.compute_digest();
        flow
    }

    #[test]
    fn test_identical_identity_gives_identical_digest() {
        let a = sample_flow("lan0");
        let b = sample_flow("lan0");
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);

        let mut c = sample_flow("lan0");
        c.local_port = 50_001;
        assert_ne!(a.digest, c.compute_digest());
    }

    #[test]
    fn test_update_keeps_digest_and_grows_totals() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut flow = sample_flow("wan0");
        let digest = flow.digest.clone();
        let mut last_packets = 0;
        let mut last_bytes = 0;

        for tick in 1..=50 {
            flow.update(&mut rng, tick * 1000);
            assert_eq!(flow.digest, digest);
            assert_eq!(flow.compute_digest(), digest);
            assert!(flow.total_packets > last_packets);
            assert!(flow.total_bytes > last_bytes);
            assert!(flow.other_packets >= OTHER_PACKETS.0);
            assert_eq!(flow.last_seen_at, tick * 1000);
            last_packets = flow.total_packets;
            last_bytes = flow.total_bytes;
        }
    }

    #[test]
    fn test_update_overwrites_deltas() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut flow = sample_flow("lan0");
        flow.update(&mut rng, 1);
        let before = flow.total_packets;
        flow.update(&mut rng, 2);
        assert_eq!(
            flow.total_packets - before,
            flow.local_packets + flow.other_packets
        );
    }

    #[test]
    fn test_mac_display() {
        let mac = MacAddr([0x02, 0xab, 0, 1, 0x10, 0xfe]);
        assert_eq!(mac.to_string(), "02:ab:00:01:10:fe");
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"02:ab:00:01:10:fe\"");
    }
}
