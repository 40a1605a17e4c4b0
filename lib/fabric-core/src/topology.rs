//! Topology cache for peering relationships and load-balancer servers

use async_trait::async_trait;
use fabric_api::Vni;
use ipnetwork::IpNetwork;
use std::collections::{BTreeSet, HashMap};
use std::net::IpAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Identifier of a dataplane load balancer
pub type LoadBalancerId = String;

/// Read side of the topology cache.
///
/// Every read is a point-in-time snapshot; consecutive reads may observe
/// different states.
#[async_trait]
pub trait TopologyCache: Send + Sync {
    /// Networks currently peered with `vni`; empty if `vni` is unknown
    async fn peer_vnis(&self, vni: Vni) -> BTreeSet<Vni>;

    /// Prefix allow-lists keyed by peer. A peer without an entry is unfiltered.
    async fn peered_prefixes(&self, vni: Vni) -> HashMap<Vni, Vec<IpNetwork>>;

    /// Load balancer serving `address` within `vni`
    async fn load_balancer_server(&self, vni: Vni, address: IpAddr) -> Option<LoadBalancerId>;
}

#[derive(Clone, Debug, Default)]
struct NetworkEntry {
    peers: BTreeSet<Vni>,
    peered_prefixes: HashMap<Vni, Vec<IpNetwork>>,
    load_balancers: HashMap<IpAddr, LoadBalancerId>,
}

/// InMemoryTopology keeps the topology of every known network in memory
#[derive(Clone)]
pub struct InMemoryTopology {
    networks: Arc<RwLock<HashMap<Vni, NetworkEntry>>>,
}

impl InMemoryTopology {
    pub fn new() -> Self {
        Self {
            networks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Replace the peer set of `vni`
    pub async fn set_peers(&self, vni: Vni, peers: impl IntoIterator<Item = Vni>) {
        let mut networks = self.networks.write().await;
        let entry = networks.entry(vni).or_default();
        entry.peers = peers.into_iter().collect();
        debug!("Set peers of vni {}: {:?}", vni, entry.peers);
    }

    pub async fn add_peer(&self, vni: Vni, peer: Vni) {
        let mut networks = self.networks.write().await;
        networks.entry(vni).or_default().peers.insert(peer);
        debug!("Peered vni {} with {}", vni, peer);
    }

    /// Drop `peer` from the peer set of `vni`, along with its prefix filter
    pub async fn remove_peer(&self, vni: Vni, peer: Vni) {
        let mut networks = self.networks.write().await;
        if let Some(entry) = networks.get_mut(&vni) {
            entry.peers.remove(&peer);
            entry.peered_prefixes.remove(&peer);
            debug!("Unpeered vni {} from {}", vni, peer);
        }
    }

    /// Restrict what `vni` propagates to `peer` to routes within `prefixes`
    pub async fn set_peered_prefixes(&self, vni: Vni, peer: Vni, prefixes: Vec<IpNetwork>) {
        let mut networks = self.networks.write().await;
        debug!("Set peered prefixes of vni {} towards {}: {:?}", vni, peer, prefixes);
        networks
            .entry(vni)
            .or_default()
            .peered_prefixes
            .insert(peer, prefixes);
    }

    /// Remove the filter towards `peer`, making it unfiltered again
    pub async fn clear_peered_prefixes(&self, vni: Vni, peer: Vni) {
        let mut networks = self.networks.write().await;
        if let Some(entry) = networks.get_mut(&vni) {
            entry.peered_prefixes.remove(&peer);
            debug!("Cleared peered prefixes of vni {} towards {}", vni, peer);
        }
    }

    pub async fn register_load_balancer(&self, vni: Vni, address: IpAddr, id: impl Into<LoadBalancerId>) {
        let id = id.into();
        let mut networks = self.networks.write().await;
        debug!("Registered load balancer {} for {} in vni {}", id, address, vni);
        networks.entry(vni).or_default().load_balancers.insert(address, id);
    }

    pub async fn deregister_load_balancer(&self, vni: Vni, address: IpAddr) {
        let mut networks = self.networks.write().await;
        if let Some(entry) = networks.get_mut(&vni) {
            if let Some(id) = entry.load_balancers.remove(&address) {
                debug!("Deregistered load balancer {} for {} in vni {}", id, address, vni);
            }
        }
    }

    /// Forget everything about `vni`
    pub async fn remove_network(&self, vni: Vni) {
        let mut networks = self.networks.write().await;
        networks.remove(&vni);
        debug!("Removed network {}", vni);
    }

    /// Every network the cache has an entry for, in ascending order
    pub async fn known_vnis(&self) -> Vec<Vni> {
        let networks = self.networks.read().await;
        let mut vnis: Vec<Vni> = networks.keys().copied().collect();
        vnis.sort_unstable();
        vnis
    }
}

impl Default for InMemoryTopology {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TopologyCache for InMemoryTopology {
    async fn peer_vnis(&self, vni: Vni) -> BTreeSet<Vni> {
        let networks = self.networks.read().await;
        networks.get(&vni).map(|entry| entry.peers.clone()).unwrap_or_default()
    }

    async fn peered_prefixes(&self, vni: Vni) -> HashMap<Vni, Vec<IpNetwork>> {
        let networks = self.networks.read().await;
        networks
            .get(&vni)
            .map(|entry| entry.peered_prefixes.clone())
            .unwrap_or_default()
    }

    async fn load_balancer_server(&self, vni: Vni, address: IpAddr) -> Option<LoadBalancerId> {
        let networks = self.networks.read().await;
        networks.get(&vni)?.load_balancers.get(&address).cloned()
    }
}
