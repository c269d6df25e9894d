use crate::config::Config;
use crate::error::SimError;
use crate::types::{Addressing, Interface, InterfaceRole, MacAddr};
use rand::Rng;
use std::net::Ipv4Addr;
use tracing::{debug, info};

/// First three octets of a routable /24 used as a far-end network.
pub type RemoteNetwork = [u8; 3];

/// Fixed topology built once at startup and only read afterwards.
#[derive(Debug)]
pub struct InterfaceRegistry {
    interfaces: Vec<Interface>,
    wan_indices: Vec<usize>,
    remote_networks: Vec<RemoteNetwork>,
}

impl InterfaceRegistry {
    pub fn build<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Result<Self, SimError> {
        if config.interface_count() == 0 {
            return Err(SimError::Config("no interfaces defined".into()));
        }
        if config.remote_networks == 0 {
            return Err(SimError::Config("remote network pool is empty".into()));
        }

        let mut interfaces = Vec::with_capacity(config.interface_count());
        for n in 0..config.lan_interfaces {
            let index = n as u8;
            interfaces.push(Interface {
                name: format!("lan{n}"),
                role: InterfaceRole::Lan,
                addressing: Addressing::Lan {
                    network: Ipv4Addr::new(192, 168, index, 0),
                    prefix_len: 24,
                    station_mac_prefix: [0x02, 0x00, 0x00, 0x10, index],
                    router_mac: MacAddr([0x02, 0x00, 0x00, 0x10, index, 0x01]),
                },
            });
        }

        let mut wan_indices = Vec::with_capacity(config.wan_interfaces);
        for n in 0..config.wan_interfaces {
            let index = n as u8;
            wan_indices.push(interfaces.len());
            interfaces.push(Interface {
                name: format!("wan{n}"),
                role: InterfaceRole::Wan,
                addressing: Addressing::Wan {
                    address: Ipv4Addr::new(100, 64, index, 2),
                    mac: MacAddr([0x02, 0x00, 0x00, 0x20, index, 0x02]),
                    gateway: Ipv4Addr::new(100, 64, index, 1),
                    gateway_mac: MacAddr([0x02, 0x00, 0x00, 0x20, index, 0x01]),
                },
            });
        }

        // Class B/C style prefixes, never private or reserved space
        let remote_networks: Vec<RemoteNetwork> = (0..config.remote_networks)
            .map(|_| {
                let first = loop {
                    let octet = rng.random_range(128..=223u8);
                    if octet != 169 && octet != 172 && octet != 192 {
                        break octet;
                    }
                };
                [first, rng.random(), rng.random()]
            })
            .collect();

        for iface in &interfaces {
            debug!("🔌 Interface {} ({:?}) ready", iface.name, iface.role);
        }
        info!(
            "🔌 Built {} LAN + {} WAN interfaces, {} remote networks",
            config.lan_interfaces,
            config.wan_interfaces,
            remote_networks.len()
        );

        Ok(Self {
            interfaces,
            wan_indices,
            remote_networks,
        })
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn count(&self) -> usize {
        self.interfaces.len()
    }

    pub fn get(&self, index: usize) -> Option<&Interface> {
        self.interfaces.get(index)
    }

    pub fn random_wan<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Interface> {
        if self.wan_indices.is_empty() {
            return None;
        }
        let pick = self.wan_indices[rng.random_range(0..self.wan_indices.len())];
        self.interfaces.get(pick)
    }

    /// Address on a random remote network with host octet in 1..=254.
    pub fn random_remote_address<R: Rng + ?Sized>(&self, rng: &mut R) -> Ipv4Addr {
        let [a, b, c] = self.remote_networks[rng.random_range(0..self.remote_networks.len())];
        Ipv4Addr::new(a, b, c, rng.random_range(1..=254))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn config(lan: usize, wan: usize) -> Config {
        Config {
            lan_interfaces: lan,
            wan_interfaces: wan,
            remote_networks: 8,
            ..Config::default()
        }
    }

    #[test]
    fn test_builds_lan_then_wan() {
        let mut rng = SmallRng::seed_from_u64(1);
        let registry = InterfaceRegistry::build(&config(2, 1), &mut rng).unwrap();
        let names: Vec<&str> = registry.interfaces().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["lan0", "lan1", "wan0"]);
        assert_eq!(registry.get(2).unwrap().role, InterfaceRole::Wan);
        assert_eq!(registry.random_wan(&mut rng).unwrap().name, "wan0");
    }

    #[test]
    fn test_rejects_empty_topology() {
        let mut rng = SmallRng::seed_from_u64(1);
        let err = InterfaceRegistry::build(&config(0, 0), &mut rng).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_lan_only_has_no_wan() {
        let mut rng = SmallRng::seed_from_u64(1);
        let registry = InterfaceRegistry::build(&config(1, 0), &mut rng).unwrap();
        assert!(registry.random_wan(&mut rng).is_none());
    }

    #[test]
    fn test_remote_addresses_are_public_hosts() {
        let mut rng = SmallRng::seed_from_u64(9);
        let registry = InterfaceRegistry::build(&config(1, 1), &mut rng).unwrap();
        for _ in 0..500 {
            let addr = registry.random_remote_address(&mut rng);
            let [a, _, _, host] = addr.octets();
            assert!((128..=223).contains(&a));
            assert!(!addr.is_private());
            assert!((1..=254).contains(&host));
        }
    }
}
