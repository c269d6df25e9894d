use crate::interfaces::InterfaceRegistry;
use crate::types::{Addressing, Flow, Interface, MacAddr};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::net::Ipv4Addr;

const IPPROTO_TCP: u8 = 6;
const IPPROTO_UDP: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameField {
    Hostname,
    ClientSni,
}

#[derive(Debug)]
struct Protocol {
    id: u32,
    name: &'static str,
    ip_protocol: u8,
    port: u16,
    name_field: NameField,
}

#[derive(Debug)]
struct Service {
    id: u32,
    name: &'static str,
    domains: &'static [&'static str],
}

const PROTOCOLS: &[Protocol] = &[
    Protocol { id: 5, name: "DNS", ip_protocol: IPPROTO_UDP, port: 53, name_field: NameField::Hostname },
    Protocol { id: 91, name: "TLS", ip_protocol: IPPROTO_TCP, port: 443, name_field: NameField::ClientSni },
    Protocol { id: 188, name: "QUIC", ip_protocol: IPPROTO_UDP, port: 443, name_field: NameField::ClientSni },
];

const SERVICES: &[Service] = &[
    Service { id: 10_119, name: "netify.github", domains: &["github.com", "api.github.com", "codeload.github.com"] },
    Service { id: 10_123, name: "netify.google", domains: &["www.google.com", "apis.google.com", "fonts.gstatic.com"] },
    Service { id: 10_132, name: "netify.netflix", domains: &["www.netflix.com", "nflxvideo.net", "nflximg.net"] },
    Service { id: 10_136, name: "netify.youtube", domains: &["www.youtube.com", "i.ytimg.com", "googlevideo.com"] },
    Service { id: 10_142, name: "netify.amazon", domains: &["www.amazon.com", "images-na.ssl-images-amazon.com"] },
    Service { id: 10_170, name: "netify.slack", domains: &["slack.com", "edgeapi.slack.com", "files.slack.com"] },
    Service { id: 10_155, name: "netify.wikipedia", domains: &["en.wikipedia.org", "upload.wikimedia.org"] },
];

/// Build one synthetic flow on `interface`. The digest is frozen here and
/// the flow is given one round of traffic before it is returned.
pub fn create<R: Rng + ?Sized>(
    registry: &InterfaceRegistry,
    interface: &Interface,
    rng: &mut R,
    now_ms: i64,
) -> Flow {
    let protocol = PROTOCOLS.choose(rng).unwrap_or(&PROTOCOLS[0]);
    let service = SERVICES.choose(rng).unwrap_or(&SERVICES[0]);
    let domain = service.domains.choose(rng).copied().unwrap_or_default();

    let (local_mac, local_ip, other_mac, ip_nat) = match &interface.addressing {
        Addressing::Lan {
            network,
            station_mac_prefix,
            router_mac,
            ..
        } => {
            let host = rng.random_range(100..=254u8);
            let [a, b, c, _] = network.octets();
            let [m0, m1, m2, m3, m4] = *station_mac_prefix;
            // LAN traffic leaves through a WAN gateway; without one it stops at the router
            let other_mac = match registry.random_wan(rng).map(|wan| &wan.addressing) {
                Some(Addressing::Wan { gateway_mac, .. }) => *gateway_mac,
                _ => *router_mac,
            };
            (
                MacAddr([m0, m1, m2, m3, m4, host]),
                Ipv4Addr::new(a, b, c, host),
                other_mac,
                false,
            )
        }
        Addressing::Wan {
            address,
            mac,
            gateway_mac,
            ..
        } => (*mac, *address, *gateway_mac, rng.random_bool(0.5)),
    };

    let (host_server_name, ssl_client_sni) = match protocol.name_field {
        NameField::Hostname => (domain.to_string(), String::new()),
        NameField::ClientSni => (String::new(), domain.to_string()),
    };

    let mut flow = Flow {
        interface: interface.name.clone(),
        ip_version: 4,
        ip_protocol: protocol.ip_protocol,
        vlan_id: 0,
        local_mac,
        other_mac,
        local_ip,
        other_ip: registry.random_remote_address(rng),
        local_port: rng.random_range(1024..=u16::MAX),
        other_port: protocol.port,
        ip_nat,
        detected_protocol: protocol.id,
        detected_protocol_name: protocol.name.to_string(),
        detected_application: service.id,
        detected_application_name: service.name.to_string(),
        detection_guessed: false,
        host_server_name,
        ssl_client_sni,
        ssl_server_sni: String::new(),
        digest: String::new(),
        local_packets: 0,
        other_packets: 0,
        local_bytes: 0,
        other_bytes: 0,
        total_packets: 0,
        total_bytes: 0,
        last_seen_at: now_ms,
    };
    flow.digest = flow.compute_digest();
    flow.update(rng, now_ms);
    flow
}
