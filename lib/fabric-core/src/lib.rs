//! Core dataplane and topology functionality
//!
//! This library provides:
//! - The network object model (interfaces, virtual IPs, prefixes, routes, NAT, LB targets)
//! - DataplaneClient, translating that model to and from dataplane RPCs
//! - Backend status codes and the per-call ignore allow-list
//! - The topology cache capability and an in-memory implementation

pub mod dataplane;
pub mod error;
pub mod model;
pub mod status;
pub mod topology;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use dataplane::DataplaneClient;
pub use error::{DataplaneError, Result, StatusError};
pub use model::{
    Interface, InterfaceUid, LoadBalancerTarget, NeighborNat, Prefix, Route, RouteNextHop,
    VirtualIp,
};
pub use status::Ignore;
pub use topology::{InMemoryTopology, LoadBalancerId, TopologyCache};
