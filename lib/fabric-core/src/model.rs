//! Network object model
//!
//! Objects are split into metadata (identity), spec (desired configuration)
//! and, where the dataplane reports anything back, status.

use fabric_api::Vni;
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Opaque unique identifier of an interface
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterfaceUid(String);

impl InterfaceUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

impl From<&str> for InterfaceUid {
    fn from(uid: &str) -> Self {
        Self::new(uid)
    }
}

impl fmt::Display for InterfaceUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub metadata: InterfaceMetadata,
    pub spec: InterfaceSpec,
    pub status: InterfaceStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceMetadata {
    pub uid: InterfaceUid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceSpec {
    pub vni: Vni,
    /// Device identifier on the host (PCI name)
    pub device: String,
    pub primary_ipv4_address: Option<Ipv4Addr>,
    pub primary_ipv6_address: Option<Ipv6Addr>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceStatus {
    /// Underlay address the dataplane assigned to the interface
    pub underlay_route: Option<IpAddr>,
}

impl Interface {
    /// Interface with empty status, as handed to a create call
    pub fn new(uid: InterfaceUid, spec: InterfaceSpec) -> Self {
        Self {
            metadata: InterfaceMetadata { uid },
            spec,
            status: InterfaceStatus::default(),
        }
    }

    pub fn uid(&self) -> &InterfaceUid {
        &self.metadata.uid
    }
}

/// Virtual IP attached to an interface; one per interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualIp {
    pub interface_uid: InterfaceUid,
    pub address: IpAddr,
}

/// Alias prefix routed to an interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub interface_uid: InterfaceUid,
    pub prefix: IpNetwork,
}

/// Overlay route installed into one virtual network.
///
/// Identified by (vni, prefix, next hop); the weight is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Route {
    pub vni: Vni,
    pub prefix: IpNetwork,
    pub next_hop: RouteNextHop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RouteNextHop {
    pub vni: Vni,
    pub address: IpAddr,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vni {}: {} via {} (vni {})",
            self.vni, self.prefix, self.next_hop.address, self.next_hop.vni
        )
    }
}

/// Address translation of `nat_ip` to an underlay target owning the
/// source ports `[min_port, max_port)` within `vni`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NeighborNat {
    pub nat_ip: IpAddr,
    pub vni: Vni,
    pub min_port: u16,
    pub max_port: u16,
    pub underlay_route: IpAddr,
}

/// Backend address registered with a dataplane load balancer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoadBalancerTarget {
    pub load_balancer_id: String,
    pub target_ip: IpAddr,
}
