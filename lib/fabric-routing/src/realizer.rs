//! Route realizer
//!
//! A route event is first realized in the network it was announced in. Standard
//! routes are then fanned out to every peered network, subject to the peer's
//! prefix allow-list on add and unconditionally on remove. Failures in one
//! network never stop the attempts in the others; they are collected into a
//! single aggregate error.

use crate::error::{Result, RoutingError};
use crate::metrics::RoutingMetrics;
use crate::options::RealizerOptions;
use async_trait::async_trait;
use fabric_api::{Destination, EventError, IpVersion, NextHop, NextHopType, RouteEventHandler, Vni};
use fabric_core::status::{ALREADY_EXISTS, NOT_FOUND, NO_BACKIP, NO_LB, NO_VNI, ROUTE_EXISTS, ROUTE_NOT_FOUND};
use fabric_core::{DataplaneClient, Ignore, LoadBalancerTarget, NeighborNat, Route, RouteNextHop, TopologyCache};
use ipnetwork::IpNetwork;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, info};

// Backend codes that mean a replayed event already took effect
const IGNORE_ROUTE_ADD: Ignore = Ignore::codes(&[ROUTE_EXISTS]);
const IGNORE_ROUTE_REMOVE: Ignore = Ignore::codes(&[NO_VNI, ROUTE_NOT_FOUND]);
const IGNORE_NAT_ADD: Ignore = Ignore::codes(&[ALREADY_EXISTS]);
const IGNORE_NAT_REMOVE: Ignore = Ignore::codes(&[NOT_FOUND]);
const IGNORE_LB_TARGET_ADD: Ignore = Ignore::codes(&[ALREADY_EXISTS]);
const IGNORE_LB_TARGET_REMOVE: Ignore = Ignore::codes(&[NOT_FOUND, NO_BACKIP, NO_LB]);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Add,
    Remove,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }
}

/// What a single-network realization did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Realized {
    Applied,
    Skipped,
}

/// Whether a route to `address` may be propagated to a peer with the given
/// allow-list. No list means unfiltered; an existing list must contain the
/// address.
pub fn peer_accepts(allowed: Option<&[IpNetwork]>, address: IpAddr) -> bool {
    match allowed {
        None => true,
        Some(prefixes) => prefixes.iter().any(|prefix| prefix.contains(address)),
    }
}

/// A route installed in `vni` is stale when its next hop belongs to neither
/// `vni` itself nor one of its current peers
pub fn route_is_stale(route: &Route, vni: Vni, peers: &BTreeSet<Vni>) -> bool {
    route.next_hop.vni != vni && !peers.contains(&route.next_hop.vni)
}

/// RouteRealizer applies route events to the dataplane
pub struct RouteRealizer {
    dataplane: DataplaneClient,
    topology: Arc<dyn TopologyCache>,
    options: RealizerOptions,
    metrics: RoutingMetrics,
}

impl RouteRealizer {
    pub fn new(
        dataplane: DataplaneClient,
        topology: Arc<dyn TopologyCache>,
        options: RealizerOptions,
        metrics: RoutingMetrics,
    ) -> Self {
        Self {
            dataplane,
            topology,
            options,
            metrics,
        }
    }

    pub fn options(&self) -> &RealizerOptions {
        &self.options
    }

    pub fn metrics(&self) -> &RoutingMetrics {
        &self.metrics
    }

    /// Realize an announced route in `vni` and, for standard next hops, in
    /// every peer whose allow-list admits the destination
    pub async fn add_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<()> {
        debug!("AddRoute vni {} dest {} hop {}", vni, destination, next_hop);
        self.record_event(Operation::Add, &next_hop);

        let mut errors = Vec::new();
        if let Err(err) = self.realize(vni, vni, destination, next_hop, Operation::Add).await {
            errors.push(err);
        }

        if next_hop.hop_type() == NextHopType::Standard {
            let peers = self.topology.peer_vnis(vni).await;
            let peered_prefixes = self.topology.peered_prefixes(vni).await;
            debug!("Peers of vni {}: {:?}, peered prefixes: {:?}", vni, peers, peered_prefixes);

            for peer in peers {
                let allowed = peered_prefixes.get(&peer).map(Vec::as_slice);
                if !peer_accepts(allowed, destination.addr()) {
                    debug!("Not propagating {} from vni {} to vni {}: filtered", destination, vni, peer);
                    continue;
                }
                if let Err(err) = self.realize(vni, peer, destination, next_hop, Operation::Add).await {
                    errors.push(err);
                }
            }
        }

        self.finish(Operation::Add, errors)
    }

    /// Withdraw a route from `vni` and, for standard next hops, from every
    /// current peer regardless of its allow-list
    pub async fn remove_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<()> {
        debug!("RemoveRoute vni {} dest {} hop {}", vni, destination, next_hop);
        self.record_event(Operation::Remove, &next_hop);

        let mut errors = Vec::new();
        if let Err(err) = self.realize(vni, vni, destination, next_hop, Operation::Remove).await {
            errors.push(err);
        }

        if next_hop.hop_type() == NextHopType::Standard {
            for peer in self.topology.peer_vnis(vni).await {
                if let Err(err) = self.realize(vni, peer, destination, next_hop, Operation::Remove).await {
                    errors.push(err);
                }
            }
        }

        self.finish(Operation::Remove, errors)
    }

    /// Delete every route in `vni` whose next hop network is no longer peered.
    ///
    /// Returns the number of routes removed. All stale routes are attempted
    /// even if some deletions fail.
    pub async fn cleanup_unpeered_routes(&self, vni: Vni) -> Result<usize> {
        let routes = self
            .dataplane
            .list_routes(vni)
            .await
            .map_err(|source| RoutingError::dataplane("listing routes", vni, source))?;
        let peers = self.topology.peer_vnis(vni).await;

        let mut removed = 0;
        let mut errors = Vec::new();
        for route in routes.iter().filter(|route| route_is_stale(route, vni, &peers)) {
            match self.dataplane.delete_route(route, IGNORE_ROUTE_REMOVE).await {
                Ok(()) => {
                    info!("Removed unpeered route {}", route);
                    self.record_mutation(Operation::Remove, NextHopType::Standard, "applied");
                    self.metrics.stale_routes_removed_total.inc();
                    removed += 1;
                }
                Err(source) => {
                    self.record_mutation(Operation::Remove, NextHopType::Standard, "failed");
                    errors.push(RoutingError::dataplane("deleting unpeered route", vni, source));
                }
            }
        }

        if errors.is_empty() {
            Ok(removed)
        } else {
            Err(RoutingError::Aggregate(errors))
        }
    }

    /// Realize one event in a single network.
    ///
    /// `local_vni` is the network the event was announced in; `effective_vni`
    /// is the network being programmed.
    pub async fn realize(
        &self,
        local_vni: Vni,
        effective_vni: Vni,
        destination: Destination,
        next_hop: NextHop,
        operation: Operation,
    ) -> Result<()> {
        let result = self
            .apply(local_vni, effective_vni, destination, next_hop, operation)
            .await;

        let outcome = match &result {
            Ok(Realized::Applied) => "applied",
            Ok(Realized::Skipped) => "skipped",
            Err(_) => "failed",
        };
        self.record_mutation(operation, next_hop.hop_type(), outcome);
        result.map(|_| ())
    }

    async fn apply(
        &self,
        local_vni: Vni,
        effective_vni: Vni,
        destination: Destination,
        next_hop: NextHop,
        operation: Operation,
    ) -> Result<Realized> {
        if self.options.ipv4_only && destination.ip_version() != IpVersion::V4 {
            return Err(RoutingError::Ipv4Only { destination });
        }

        match next_hop {
            NextHop::LoadBalancerTarget { target_address } => {
                let address = destination.addr();
                let load_balancer_id = self
                    .topology
                    .load_balancer_server(effective_vni, address)
                    .await
                    .ok_or(RoutingError::NoLoadBalancer {
                        vni: effective_vni,
                        address,
                    })?;

                match operation {
                    Operation::Add => {
                        if let Some(network) = self.options.preferred_network {
                            if !network.contains(target_address) {
                                debug!(
                                    "LB target {} is not in preferred network {}, ignoring",
                                    target_address, network
                                );
                                return Ok(Realized::Skipped);
                            }
                        }
                        let target = LoadBalancerTarget {
                            load_balancer_id,
                            target_ip: target_address,
                        };
                        self.dataplane
                            .create_load_balancer_target(&target, IGNORE_LB_TARGET_ADD)
                            .await
                            .map_err(|source| RoutingError::dataplane("creating lb target", effective_vni, source))?;
                    }
                    Operation::Remove => {
                        self.dataplane
                            .delete_load_balancer_target(&load_balancer_id, target_address, IGNORE_LB_TARGET_REMOVE)
                            .await
                            .map_err(|source| RoutingError::dataplane("deleting lb target", effective_vni, source))?;
                    }
                }
            }
            NextHop::Nat {
                target_address,
                port_range_from,
                port_range_to,
            } => {
                if port_range_from >= port_range_to {
                    return Err(EventError::EmptyPortRange {
                        target_address,
                        from: port_range_from,
                        to: port_range_to,
                    }
                    .into());
                }
                let nat = NeighborNat {
                    nat_ip: destination.addr(),
                    vni: effective_vni,
                    min_port: port_range_from,
                    max_port: port_range_to,
                    underlay_route: target_address,
                };
                match operation {
                    Operation::Add => {
                        self.dataplane
                            .create_neighbor_nat(&nat, IGNORE_NAT_ADD)
                            .await
                            .map_err(|source| RoutingError::dataplane("creating nat route", effective_vni, source))?;
                    }
                    Operation::Remove => {
                        self.dataplane
                            .delete_neighbor_nat(&nat, IGNORE_NAT_REMOVE)
                            .await
                            .map_err(|source| RoutingError::dataplane("deleting nat route", effective_vni, source))?;
                    }
                }
            }
            NextHop::Standard {
                target_vni,
                target_address,
            } => {
                let route = Route {
                    vni: effective_vni,
                    prefix: destination.prefix(),
                    next_hop: RouteNextHop {
                        vni: target_vni.unwrap_or(local_vni),
                        address: target_address,
                    },
                };
                match operation {
                    Operation::Add => {
                        self.dataplane
                            .create_route(&route, IGNORE_ROUTE_ADD)
                            .await
                            .map_err(|source| RoutingError::dataplane("creating route", effective_vni, source))?;
                    }
                    Operation::Remove => {
                        self.dataplane
                            .delete_route(&route, IGNORE_ROUTE_REMOVE)
                            .await
                            .map_err(|source| RoutingError::dataplane("deleting route", effective_vni, source))?;
                    }
                }
            }
        }

        Ok(Realized::Applied)
    }

    fn finish(&self, operation: Operation, errors: Vec<RoutingError>) -> Result<()> {
        if errors.is_empty() {
            return Ok(());
        }
        self.metrics
            .route_event_errors_total
            .with_label_values(&[operation.as_str()])
            .inc();
        Err(RoutingError::Aggregate(errors))
    }

    fn record_event(&self, operation: Operation, next_hop: &NextHop) {
        self.metrics
            .route_events_total
            .with_label_values(&[operation.as_str(), next_hop.hop_type().as_str()])
            .inc();
    }

    fn record_mutation(&self, operation: Operation, kind: NextHopType, outcome: &str) {
        self.metrics
            .dataplane_mutations_total
            .with_label_values(&[operation.as_str(), kind.as_str(), outcome])
            .inc();
    }
}

#[async_trait]
impl RouteEventHandler for RouteRealizer {
    type Error = RoutingError;

    async fn add_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<()> {
        RouteRealizer::add_route(self, vni, destination, next_hop).await
    }

    async fn remove_route(&self, vni: Vni, destination: Destination, next_hop: NextHop) -> Result<()> {
        RouteRealizer::remove_route(self, vni, destination, next_hop).await
    }
}
