//! Overlay route events delivered by the route-propagation protocol
//!
//! The protocol engine announces and withdraws routes per virtual network.
//! Each event names a destination prefix and a next hop whose kind decides
//! which dataplane primitive realizes it.

use async_trait::async_trait;
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;

/// Virtual network identifier
pub type Vni = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Address family of an address
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// Validation failures for raw protocol events
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    #[error("destination {prefix} is not an {ip_version} prefix")]
    IpVersionMismatch { ip_version: IpVersion, prefix: IpNetwork },

    #[error("NAT next hop to {target_address} is missing its port range")]
    MissingPortRange { target_address: IpAddr },

    #[error("NAT next hop to {target_address} has empty port range [{from}, {to})")]
    EmptyPortRange { target_address: IpAddr, from: u16, to: u16 },
}

/// Destination prefix of a route event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    ip_version: IpVersion,
    prefix: IpNetwork,
}

impl Destination {
    /// Build a destination from the protocol's (ip version, prefix) pair
    pub fn new(ip_version: IpVersion, prefix: IpNetwork) -> Result<Self, EventError> {
        if IpVersion::of(&prefix.ip()) != ip_version {
            return Err(EventError::IpVersionMismatch { ip_version, prefix });
        }
        Ok(Self { ip_version, prefix })
    }

    /// Build a destination whose version is taken from the prefix itself
    pub fn from_prefix(prefix: IpNetwork) -> Self {
        Self {
            ip_version: IpVersion::of(&prefix.ip()),
            prefix,
        }
    }

    pub fn ip_version(&self) -> IpVersion {
        self.ip_version
    }

    pub fn prefix(&self) -> IpNetwork {
        self.prefix
    }

    /// Address part of the prefix, as announced
    pub fn addr(&self) -> IpAddr {
        self.prefix.ip()
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix)
    }
}

/// Next hop type tag as carried on the wire by the protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NextHopType {
    Standard,
    Nat,
    LoadBalancerTarget,
}

impl NextHopType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextHopType::Standard => "standard",
            NextHopType::Nat => "nat",
            NextHopType::LoadBalancerTarget => "lb-target",
        }
    }
}

/// Next hop of an overlay route
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NextHop {
    /// Plain route towards an underlay address, visible to peered networks.
    /// `target_vni` is absent when the protocol did not set one.
    Standard {
        target_vni: Option<Vni>,
        target_address: IpAddr,
    },
    /// Backend of a load balancer whose frontend is the destination address
    LoadBalancerTarget { target_address: IpAddr },
    /// Destination address is NATed towards `target_address` for ports in
    /// `[port_range_from, port_range_to)`
    Nat {
        target_address: IpAddr,
        port_range_from: u16,
        port_range_to: u16,
    },
}

impl NextHop {
    /// Standard next hop without an explicit target VNI
    pub fn standard(target_address: IpAddr) -> Self {
        NextHop::Standard {
            target_vni: None,
            target_address,
        }
    }

    /// Build a next hop from the protocol's flat representation
    pub fn from_parts(
        hop_type: NextHopType,
        target_vni: Option<Vni>,
        target_address: IpAddr,
        nat_port_range_from: Option<u16>,
        nat_port_range_to: Option<u16>,
    ) -> Result<Self, EventError> {
        match hop_type {
            NextHopType::Standard => Ok(NextHop::Standard {
                target_vni,
                target_address,
            }),
            NextHopType::LoadBalancerTarget => Ok(NextHop::LoadBalancerTarget { target_address }),
            NextHopType::Nat => {
                let (from, to) = match (nat_port_range_from, nat_port_range_to) {
                    (Some(from), Some(to)) => (from, to),
                    _ => return Err(EventError::MissingPortRange { target_address }),
                };
                if from >= to {
                    return Err(EventError::EmptyPortRange {
                        target_address,
                        from,
                        to,
                    });
                }
                Ok(NextHop::Nat {
                    target_address,
                    port_range_from: from,
                    port_range_to: to,
                })
            }
        }
    }

    pub fn hop_type(&self) -> NextHopType {
        match self {
            NextHop::Standard { .. } => NextHopType::Standard,
            NextHop::LoadBalancerTarget { .. } => NextHopType::LoadBalancerTarget,
            NextHop::Nat { .. } => NextHopType::Nat,
        }
    }

    pub fn target_address(&self) -> IpAddr {
        match self {
            NextHop::Standard { target_address, .. }
            | NextHop::LoadBalancerTarget { target_address }
            | NextHop::Nat { target_address, .. } => *target_address,
        }
    }
}

impl fmt::Display for NextHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextHop::Standard {
                target_vni: Some(vni),
                target_address,
            } => write!(f, "{} (vni {})", target_address, vni),
            NextHop::Standard {
                target_vni: None,
                target_address,
            } => write!(f, "{}", target_address),
            NextHop::LoadBalancerTarget { target_address } => {
                write!(f, "lb-target {}", target_address)
            }
            NextHop::Nat {
                target_address,
                port_range_from,
                port_range_to,
            } => write!(f, "nat {} [{}, {})", target_address, port_range_from, port_range_to),
        }
    }
}

/// Callback contract the route-propagation protocol engine invokes.
///
/// Events may be redelivered and may arrive concurrently for different
/// keys, so handlers must be idempotent.
#[async_trait]
pub trait RouteEventHandler: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn add_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<(), Self::Error>;

    async fn remove_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_rejects_version_mismatch() {
        let prefix: IpNetwork = "10.0.0.0/24".parse().unwrap();
        assert!(Destination::new(IpVersion::V4, prefix).is_ok());
        assert_eq!(
            Destination::new(IpVersion::V6, prefix),
            Err(EventError::IpVersionMismatch {
                ip_version: IpVersion::V6,
                prefix
            })
        );
    }

    #[test]
    fn test_destination_from_prefix() {
        let dest = Destination::from_prefix("2001:db8::/64".parse().unwrap());
        assert_eq!(dest.ip_version(), IpVersion::V6);
        assert_eq!(dest.addr(), "2001:db8::".parse::<IpAddr>().unwrap());
        assert_eq!(dest.to_string(), "2001:db8::/64");
    }

    #[test]
    fn test_nat_next_hop_requires_port_range() {
        let target: IpAddr = "fc00::1".parse().unwrap();
        let err = NextHop::from_parts(NextHopType::Nat, None, target, Some(1024), None).unwrap_err();
        assert_eq!(err, EventError::MissingPortRange { target_address: target });

        let err = NextHop::from_parts(NextHopType::Nat, None, target, Some(2048), Some(2048)).unwrap_err();
        assert!(matches!(err, EventError::EmptyPortRange { .. }));

        let hop = NextHop::from_parts(NextHopType::Nat, None, target, Some(1024), Some(2048)).unwrap();
        assert_eq!(hop.hop_type(), NextHopType::Nat);
        assert_eq!(hop.target_address(), target);
    }

    #[test]
    fn test_from_parts_ignores_nat_ports_for_other_kinds() {
        let target: IpAddr = "fc00::2".parse().unwrap();
        let hop = NextHop::from_parts(NextHopType::Standard, Some(200), target, Some(1), Some(2)).unwrap();
        assert_eq!(
            hop,
            NextHop::Standard {
                target_vni: Some(200),
                target_address: target
            }
        );

        let hop = NextHop::from_parts(NextHopType::LoadBalancerTarget, None, target, None, None).unwrap();
        assert_eq!(hop, NextHop::LoadBalancerTarget { target_address: target });
    }

    #[test]
    fn test_next_hop_display() {
        let target: IpAddr = "fc00::3".parse().unwrap();
        assert_eq!(NextHop::standard(target).to_string(), "fc00::3");
        let nat = NextHop::Nat {
            target_address: target,
            port_range_from: 100,
            port_range_to: 200,
        };
        assert_eq!(nat.to_string(), "nat fc00::3 [100, 200)");
    }
}
