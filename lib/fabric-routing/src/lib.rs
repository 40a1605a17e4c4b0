//! Route realization for overlay route events
//!
//! `RouteRealizer` turns a single route announcement or withdrawal into the
//! set of dataplane mutations it implies for the originating network and
//! every network peered with it, and periodically removes routes left behind
//! by peerings that no longer exist.

pub mod error;
pub mod metrics;
pub mod options;
pub mod realizer;

pub use error::{Result, RoutingError};
pub use metrics::RoutingMetrics;
pub use options::RealizerOptions;
pub use realizer::{peer_accepts, route_is_stale, Operation, RouteRealizer};
