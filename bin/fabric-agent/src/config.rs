//! Agent configuration
//!
//! Read from a YAML file whose path is taken from `FABRIC_AGENT_CONFIG`. A
//! missing file yields the defaults. `FABRIC_DATAPLANE_ADDRESS` overrides the
//! dataplane address from the file.

use anyhow::{bail, Context, Result};
use fabric_api::Vni;
use fabric_core::InMemoryTopology;
use fabric_routing::RealizerOptions;
use ipnetwork::IpNetwork;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "FABRIC_AGENT_CONFIG";
pub const DATAPLANE_ADDRESS_ENV: &str = "FABRIC_DATAPLANE_ADDRESS";
const DEFAULT_CONFIG_PATH: &str = "/etc/fabric-agent/config.yaml";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// gRPC endpoint of the dataplane service
    pub dataplane_address: String,
    #[serde(flatten)]
    pub realizer: RealizerOptions,
    pub cleanup_interval_secs: u64,
    pub metrics_address: SocketAddr,
    /// Static topology the in-memory cache is seeded with
    pub networks: Vec<NetworkConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NetworkConfig {
    pub vni: Vni,
    #[serde(default)]
    pub peers: Vec<Vni>,
    /// Allow-lists keyed by peer VNI
    #[serde(default)]
    pub peered_prefixes: HashMap<Vni, Vec<IpNetwork>>,
    #[serde(default)]
    pub load_balancers: Vec<LoadBalancerConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct LoadBalancerConfig {
    pub address: IpAddr,
    pub id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataplane_address: "http://[::1]:1337".to_string(),
            realizer: RealizerOptions::default(),
            cleanup_interval_secs: 30,
            metrics_address: ([0, 0, 0, 0], 9090).into(),
            networks: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_path(Path::new(&path))?;

        if let Ok(address) = std::env::var(DATAPLANE_ADDRESS_ENV) {
            debug!("Dataplane address overridden by {}", DATAPLANE_ADDRESS_ENV);
            config.dataplane_address = address;
        }
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                info!("Loading configuration from {}", path.display());
                Self::from_yaml(&contents).with_context(|| format!("invalid configuration in {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.cleanup_interval_secs == 0 {
            bail!("cleanup_interval_secs must be positive");
        }
        for network in &self.networks {
            if let Some(peer) = network.peered_prefixes.keys().find(|peer| !network.peers.contains(*peer)) {
                bail!("vni {} has peered prefixes for {} which is not a peer", network.vni, peer);
            }
        }
        Ok(())
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Populate the topology cache with the configured networks
    pub async fn seed_topology(&self, topology: &InMemoryTopology) {
        for network in &self.networks {
            topology.set_peers(network.vni, network.peers.iter().copied()).await;
            for (peer, prefixes) in &network.peered_prefixes {
                topology.set_peered_prefixes(network.vni, *peer, prefixes.clone()).await;
            }
            for lb in &network.load_balancers {
                topology.register_load_balancer(network.vni, lb.address, lb.id.clone()).await;
            }
        }
        info!("Seeded topology with {} networks", self.networks.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_core::TopologyCache;

    const SAMPLE: &str = r#"
dataplane_address: "http://[::1]:1400"
ipv4_only: false
preferred_network: "fd00::/64"
cleanup_interval_secs: 10
metrics_address: "127.0.0.1:9100"
networks:
  - vni: 100
    peers: [200, 300]
    peered_prefixes:
      300: ["10.0.0.0/24"]
    load_balancers:
      - address: 45.86.6.1
        id: lb-1
  - vni: 200
    peers: [100]
"#;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.dataplane_address, "http://[::1]:1337");
        assert!(config.realizer.ipv4_only);
        assert_eq!(config.realizer.preferred_network, None);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(30));
        assert_eq!(config.metrics_address.port(), 9090);
        assert!(config.networks.is_empty());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_yaml("\n").unwrap();
        assert_eq!(config.cleanup_interval_secs, 30);
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = Config::from_yaml("ipv4_only: false\n").unwrap();
        assert!(!config.realizer.ipv4_only);
        assert_eq!(config.dataplane_address, "http://[::1]:1337");
    }

    #[test]
    fn test_full_document() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.dataplane_address, "http://[::1]:1400");
        assert!(!config.realizer.ipv4_only);
        assert_eq!(config.realizer.preferred_network, Some("fd00::/64".parse().unwrap()));
        assert_eq!(config.cleanup_interval(), Duration::from_secs(10));
        assert_eq!(config.metrics_address, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.networks.len(), 2);
        assert_eq!(
            config.networks[0].peered_prefixes.get(&300),
            Some(&vec!["10.0.0.0/24".parse().unwrap()])
        );
        assert_eq!(
            config.networks[0].load_balancers,
            vec![LoadBalancerConfig {
                address: "45.86.6.1".parse().unwrap(),
                id: "lb-1".to_string(),
            }]
        );
    }

    #[test]
    fn test_rejects_invalid_documents() {
        assert!(Config::from_yaml("cleanup_interval_secs: 0\n").is_err());
        assert!(Config::from_yaml("preferred_network: not-a-cidr\n").is_err());
        assert!(Config::from_yaml("networks:\n  - vni: 1\n    peered_prefixes:\n      2: [\"10.0.0.0/8\"]\n").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = Config::from_path(Path::new("/nonexistent/fabric-agent.yaml")).unwrap();
        assert_eq!(config.dataplane_address, Config::default().dataplane_address);
    }

    #[tokio::test]
    async fn test_seed_topology() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let topology = InMemoryTopology::new();
        config.seed_topology(&topology).await;

        assert_eq!(topology.known_vnis().await, vec![100, 200]);
        assert_eq!(topology.peer_vnis(100).await.into_iter().collect::<Vec<_>>(), vec![200, 300]);
        assert!(topology.peered_prefixes(100).await.contains_key(&300));
        assert_eq!(
            topology.load_balancer_server(100, "45.86.6.1".parse().unwrap()).await,
            Some("lb-1".to_string())
        );
    }
}
