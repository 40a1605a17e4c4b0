//! In-memory dataplane for tests
//!
//! `FakeDataplane` answers every RPC from local tables and reports the same
//! duplicate/not-found status codes the real service does. Failures can be
//! injected per RPC, either as a backend status or as a transport error, and
//! every call is recorded.

use crate::model::{LoadBalancerTarget, NeighborNat, Route, RouteNextHop};
use crate::status::{ALREADY_EXISTS, NOT_FOUND, NO_VNI, ROUTE_EXISTS, ROUTE_NOT_FOUND};
use async_trait::async_trait;
use fabric_api::dpservice::{self, DataplaneService};
use fabric_api::Vni;
use ipnetwork::IpNetwork;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Mutex;

/// Dataplane RPCs, as recorded by [`FakeDataplane`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rpc {
    GetInterface,
    CreateInterface,
    DeleteInterface,
    GetInterfaceVip,
    AddInterfaceVip,
    DeleteInterfaceVip,
    ListInterfacePrefixes,
    AddInterfacePrefix,
    DeleteInterfacePrefix,
    AddRoute,
    DeleteRoute,
    ListRoutes,
    AddNeighborNat,
    DeleteNeighborNat,
    AddLoadBalancerTarget,
    DeleteLoadBalancerTarget,
}

#[derive(Default)]
struct State {
    interfaces: HashMap<Vec<u8>, dpservice::Interface>,
    vips: HashMap<Vec<u8>, dpservice::InterfaceVipIp>,
    prefixes: HashMap<Vec<u8>, Vec<dpservice::Prefix>>,
    routes: HashMap<Vni, Vec<dpservice::Route>>,
    nats: Vec<dpservice::NeighborNatMsg>,
    lb_targets: Vec<dpservice::LoadBalancerTargetMsg>,
    next_underlay: u32,
    calls: Vec<(Rpc, Option<Vni>)>,
    transport_failures: HashSet<Rpc>,
    status_failures: HashMap<(Rpc, Option<Vni>), u32>,
}

impl State {
    /// Record the call and return any injected failure for it
    fn enter(&mut self, rpc: Rpc, vni: Option<Vni>) -> Result<Option<dpservice::Status>, tonic::Status> {
        self.calls.push((rpc, vni));
        if self.transport_failures.contains(&rpc) {
            return Err(tonic::Status::unavailable(format!("injected transport failure for {:?}", rpc)));
        }
        let code = vni
            .and_then(|vni| self.status_failures.get(&(rpc, Some(vni))))
            .or_else(|| self.status_failures.get(&(rpc, None)))
            .copied();
        Ok(code.map(|code| status(code, "injected failure")))
    }

    fn allocate_underlay(&mut self) -> Vec<u8> {
        self.next_underlay += 1;
        format!("fc00::{:x}", self.next_underlay).into_bytes()
    }
}

fn ok() -> dpservice::Status {
    dpservice::Status::default()
}

fn status(code: u32, message: &str) -> dpservice::Status {
    dpservice::Status {
        error: code,
        message: message.to_string(),
    }
}

fn same_route(a: &dpservice::Route, b: &dpservice::Route) -> bool {
    a.prefix == b.prefix && a.nexthop_vni == b.nexthop_vni && a.nexthop_address == b.nexthop_address
}

fn parse<A: std::str::FromStr>(raw: &[u8]) -> Option<A> {
    String::from_utf8_lossy(raw).parse().ok()
}

#[derive(Default)]
pub struct FakeDataplane {
    state: Mutex<State>,
}

impl FakeDataplane {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every call to `rpc` fail before reaching the tables
    pub fn fail_transport(&self, rpc: Rpc) {
        self.state().transport_failures.insert(rpc);
    }

    /// Make every call to `rpc` answer with status `code`
    pub fn fail_status(&self, rpc: Rpc, code: u32) {
        self.state().status_failures.insert((rpc, None), code);
    }

    /// Make calls to `rpc` that target `vni` answer with status `code`
    pub fn fail_status_in_vni(&self, rpc: Rpc, vni: Vni, code: u32) {
        self.state().status_failures.insert((rpc, Some(vni)), code);
    }

    /// Remove all injected failures
    pub fn heal(&self) {
        let mut state = self.state();
        state.transport_failures.clear();
        state.status_failures.clear();
    }

    /// Every RPC issued so far, in order
    pub fn calls(&self) -> Vec<Rpc> {
        self.state().calls.iter().map(|(rpc, _)| *rpc).collect()
    }

    /// VNIs targeted by calls to `rpc`, in order
    pub fn call_vnis(&self, rpc: Rpc) -> Vec<Vni> {
        self.state()
            .calls
            .iter()
            .filter(|(called, _)| *called == rpc)
            .filter_map(|(_, vni)| *vni)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Install a route directly, bypassing call recording
    pub fn install_route(&self, route: Route) {
        let addr = route.prefix.ip();
        let wire = dpservice::Route {
            ip_version: wire_version(&route.next_hop.address),
            weight: 100,
            prefix: Some(dpservice::Prefix {
                ip_version: wire_version(&addr),
                address: addr.to_string().into_bytes(),
                prefix_length: u32::from(route.prefix.prefix()),
            }),
            nexthop_vni: route.next_hop.vni,
            nexthop_address: route.next_hop.address.to_string().into_bytes(),
        };
        self.insert_raw_route(route.vni, wire);
    }

    /// Store a wire interface verbatim, even a malformed one
    pub fn insert_raw_interface(&self, iface: dpservice::Interface) {
        self.state().interfaces.insert(iface.interface_id.clone(), iface);
    }

    /// Install a wire route verbatim, even a malformed one
    pub fn insert_raw_route(&self, vni: Vni, route: dpservice::Route) {
        self.state().routes.entry(vni).or_default().push(route);
    }

    /// Routes installed in `vni`, in installation order
    pub fn routes(&self, vni: Vni) -> Vec<Route> {
        self.state()
            .routes
            .get(&vni)
            .map(|routes| {
                routes
                    .iter()
                    .filter_map(|route| {
                        let prefix = route.prefix.as_ref()?;
                        let addr: IpAddr = parse(&prefix.address)?;
                        Some(Route {
                            vni,
                            prefix: IpNetwork::new(addr, u8::try_from(prefix.prefix_length).ok()?).ok()?,
                            next_hop: RouteNextHop {
                                vni: route.nexthop_vni,
                                address: parse(&route.nexthop_address)?,
                            },
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn neighbor_nats(&self) -> Vec<NeighborNat> {
        self.state()
            .nats
            .iter()
            .filter_map(|nat| {
                Some(NeighborNat {
                    nat_ip: parse(&nat.nat_ip)?,
                    vni: nat.vni,
                    min_port: u16::try_from(nat.min_port).ok()?,
                    max_port: u16::try_from(nat.max_port).ok()?,
                    underlay_route: parse(&nat.underlay_route)?,
                })
            })
            .collect()
    }

    pub fn load_balancer_targets(&self) -> Vec<LoadBalancerTarget> {
        self.state()
            .lb_targets
            .iter()
            .filter_map(|target| {
                Some(LoadBalancerTarget {
                    load_balancer_id: String::from_utf8(target.load_balancer_id.clone()).ok()?,
                    target_ip: parse(&target.target_ip.as_ref()?.address)?,
                })
            })
            .collect()
    }
}

fn wire_version(addr: &IpAddr) -> i32 {
    match addr {
        IpAddr::V4(_) => dpservice::IpVersion::Ipv4 as i32,
        IpAddr::V6(_) => dpservice::IpVersion::Ipv6 as i32,
    }
}

fn route_vni(request: &dpservice::VniRouteMsg) -> Vni {
    request.vni.as_ref().map(|vni| vni.vni).unwrap_or_default()
}

#[async_trait]
impl DataplaneService for FakeDataplane {
    async fn get_interface(&self, request: dpservice::InterfaceIdMsg) -> Result<dpservice::GetInterfaceResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::GetInterface, None)? {
            return Ok(dpservice::GetInterfaceResponse {
                status: Some(failure),
                interface: None,
            });
        }
        Ok(match state.interfaces.get(&request.interface_id) {
            Some(iface) => dpservice::GetInterfaceResponse {
                status: Some(ok()),
                interface: Some(iface.clone()),
            },
            None => dpservice::GetInterfaceResponse {
                status: Some(status(NOT_FOUND, "interface not found")),
                interface: None,
            },
        })
    }

    async fn create_interface(&self, request: dpservice::CreateInterfaceRequest) -> Result<dpservice::CreateInterfaceResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::CreateInterface, Some(request.vni))? {
            return Ok(dpservice::CreateInterfaceResponse {
                status: Some(failure),
                underlay_route: Vec::new(),
            });
        }
        if state.interfaces.contains_key(&request.interface_id) {
            return Ok(dpservice::CreateInterfaceResponse {
                status: Some(status(ALREADY_EXISTS, "interface already exists")),
                underlay_route: Vec::new(),
            });
        }

        let underlay_route = state.allocate_underlay();
        let iface = dpservice::Interface {
            interface_id: request.interface_id.clone(),
            vni: request.vni,
            primary_ipv4_address: request.ipv4_config.map(|c| c.primary_address).unwrap_or_default(),
            primary_ipv6_address: request.ipv6_config.map(|c| c.primary_address).unwrap_or_default(),
            underlay_route: underlay_route.clone(),
            pci_name: request.device_name,
        };
        state.interfaces.insert(request.interface_id, iface);

        Ok(dpservice::CreateInterfaceResponse {
            status: Some(ok()),
            underlay_route,
        })
    }

    async fn delete_interface(&self, request: dpservice::InterfaceIdMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteInterface, None)? {
            return Ok(failure);
        }
        Ok(match state.interfaces.remove(&request.interface_id) {
            Some(_) => ok(),
            None => status(NOT_FOUND, "interface not found"),
        })
    }

    async fn get_interface_vip(&self, request: dpservice::InterfaceIdMsg) -> Result<dpservice::GetInterfaceVipResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::GetInterfaceVip, None)? {
            return Ok(dpservice::GetInterfaceVipResponse {
                status: Some(failure),
                ..Default::default()
            });
        }
        Ok(match state.vips.get(&request.interface_id) {
            Some(vip) => dpservice::GetInterfaceVipResponse {
                status: Some(ok()),
                ip_version: vip.ip_version,
                address: vip.address.clone(),
            },
            None => dpservice::GetInterfaceVipResponse {
                status: Some(status(NOT_FOUND, "virtual ip not found")),
                ..Default::default()
            },
        })
    }

    async fn add_interface_vip(&self, request: dpservice::InterfaceVipMsg) -> Result<dpservice::UnderlayRouteResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::AddInterfaceVip, None)? {
            return Ok(dpservice::UnderlayRouteResponse {
                status: Some(failure),
                underlay_route: Vec::new(),
            });
        }
        if state.vips.contains_key(&request.interface_id) {
            return Ok(dpservice::UnderlayRouteResponse {
                status: Some(status(ALREADY_EXISTS, "virtual ip already set")),
                underlay_route: Vec::new(),
            });
        }
        let vip = request.interface_vip_ip.unwrap_or_default();
        state.vips.insert(request.interface_id, vip);
        let underlay_route = state.allocate_underlay();
        Ok(dpservice::UnderlayRouteResponse {
            status: Some(ok()),
            underlay_route,
        })
    }

    async fn delete_interface_vip(&self, request: dpservice::InterfaceIdMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteInterfaceVip, None)? {
            return Ok(failure);
        }
        Ok(match state.vips.remove(&request.interface_id) {
            Some(_) => ok(),
            None => status(NOT_FOUND, "virtual ip not found"),
        })
    }

    async fn list_interface_prefixes(&self, request: dpservice::InterfaceIdMsg) -> Result<dpservice::ListPrefixesResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::ListInterfacePrefixes, None)? {
            return Ok(dpservice::ListPrefixesResponse {
                status: Some(failure),
                prefixes: Vec::new(),
            });
        }
        Ok(dpservice::ListPrefixesResponse {
            status: Some(ok()),
            prefixes: state.prefixes.get(&request.interface_id).cloned().unwrap_or_default(),
        })
    }

    async fn add_interface_prefix(&self, request: dpservice::InterfacePrefixMsg) -> Result<dpservice::UnderlayRouteResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::AddInterfacePrefix, None)? {
            return Ok(dpservice::UnderlayRouteResponse {
                status: Some(failure),
                underlay_route: Vec::new(),
            });
        }
        let id = request.interface_id.unwrap_or_default().interface_id;
        let prefix = request.prefix.unwrap_or_default();
        let prefixes = state.prefixes.entry(id).or_default();
        if prefixes.contains(&prefix) {
            return Ok(dpservice::UnderlayRouteResponse {
                status: Some(status(ALREADY_EXISTS, "prefix already exists")),
                underlay_route: Vec::new(),
            });
        }
        prefixes.push(prefix);
        let underlay_route = state.allocate_underlay();
        Ok(dpservice::UnderlayRouteResponse {
            status: Some(ok()),
            underlay_route,
        })
    }

    async fn delete_interface_prefix(&self, request: dpservice::InterfacePrefixMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteInterfacePrefix, None)? {
            return Ok(failure);
        }
        let id = request.interface_id.unwrap_or_default().interface_id;
        let prefix = request.prefix.unwrap_or_default();
        let prefixes = state.prefixes.entry(id).or_default();
        Ok(match prefixes.iter().position(|p| *p == prefix) {
            Some(index) => {
                prefixes.remove(index);
                ok()
            }
            None => status(NOT_FOUND, "prefix not found"),
        })
    }

    async fn add_route(&self, request: dpservice::VniRouteMsg) -> Result<dpservice::Status, tonic::Status> {
        let vni = route_vni(&request);
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::AddRoute, Some(vni))? {
            return Ok(failure);
        }
        let route = request.route.unwrap_or_default();
        let routes = state.routes.entry(vni).or_default();
        if routes.iter().any(|r| same_route(r, &route)) {
            return Ok(status(ROUTE_EXISTS, "route already exists"));
        }
        routes.push(route);
        Ok(ok())
    }

    async fn delete_route(&self, request: dpservice::VniRouteMsg) -> Result<dpservice::Status, tonic::Status> {
        let vni = route_vni(&request);
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteRoute, Some(vni))? {
            return Ok(failure);
        }
        let route = request.route.unwrap_or_default();
        let Some(routes) = state.routes.get_mut(&vni) else {
            return Ok(status(NO_VNI, "no such vni"));
        };
        Ok(match routes.iter().position(|r| same_route(r, &route)) {
            Some(index) => {
                routes.remove(index);
                ok()
            }
            None => status(ROUTE_NOT_FOUND, "route not found"),
        })
    }

    async fn list_routes(&self, request: dpservice::VniMsg) -> Result<dpservice::ListRoutesResponse, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::ListRoutes, Some(request.vni))? {
            return Ok(dpservice::ListRoutesResponse {
                status: Some(failure),
                routes: Vec::new(),
            });
        }
        Ok(dpservice::ListRoutesResponse {
            status: Some(ok()),
            routes: state.routes.get(&request.vni).cloned().unwrap_or_default(),
        })
    }

    async fn add_neighbor_nat(&self, request: dpservice::NeighborNatMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::AddNeighborNat, Some(request.vni))? {
            return Ok(failure);
        }
        if state.nats.contains(&request) {
            return Ok(status(ALREADY_EXISTS, "neighbor nat already exists"));
        }
        state.nats.push(request);
        Ok(ok())
    }

    async fn delete_neighbor_nat(&self, request: dpservice::NeighborNatMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteNeighborNat, Some(request.vni))? {
            return Ok(failure);
        }
        Ok(match state.nats.iter().position(|nat| *nat == request) {
            Some(index) => {
                state.nats.remove(index);
                ok()
            }
            None => status(NOT_FOUND, "neighbor nat not found"),
        })
    }

    async fn add_load_balancer_target(&self, request: dpservice::LoadBalancerTargetMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::AddLoadBalancerTarget, None)? {
            return Ok(failure);
        }
        if state.lb_targets.contains(&request) {
            return Ok(status(ALREADY_EXISTS, "lb target already exists"));
        }
        state.lb_targets.push(request);
        Ok(ok())
    }

    async fn delete_load_balancer_target(&self, request: dpservice::LoadBalancerTargetMsg) -> Result<dpservice::Status, tonic::Status> {
        let mut state = self.state();
        if let Some(failure) = state.enter(Rpc::DeleteLoadBalancerTarget, None)? {
            return Ok(failure);
        }
        Ok(match state.lb_targets.iter().position(|target| *target == request) {
            Some(index) => {
                state.lb_targets.remove(index);
                ok()
            }
            None => status(NOT_FOUND, "lb target not found"),
        })
    }
}
