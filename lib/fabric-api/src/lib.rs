//! Wire types for the fabric agent's external boundaries
//!
//! This library defines:
//! - dpservice: protobuf messages and the RPC surface of the local dataplane service
//! - propagation: overlay route events delivered by the route-propagation protocol

pub mod dpservice;
pub mod propagation;

pub use dpservice::{DataplaneService, GrpcDataplane};
pub use propagation::{Destination, EventError, IpVersion, NextHop, NextHopType, RouteEventHandler, Vni};
