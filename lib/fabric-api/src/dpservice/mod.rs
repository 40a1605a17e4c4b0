//! Bindings to the dataplane service's gRPC API
//!
//! Messages mirror the service's protobuf schema. Addresses travel as their
//! canonical string form encoded in `bytes` fields; every response carries a
//! `Status` whose non-zero `error` is a backend-defined failure code.

pub mod client;

pub use client::{DataplaneService, GrpcDataplane};

/// Address family of an address or prefix on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum IpVersion {
    Ipv4 = 0,
    Ipv6 = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum InterfaceType {
    VirtualInterface = 0,
    BareMetalInterface = 1,
}

/// Outcome of a call as reported by the dataplane; `error == 0` is success
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Status {
    #[prost(uint32, tag = "1")]
    pub error: u32,
    #[prost(string, tag = "2")]
    pub message: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterfaceIdMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub interface_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct IpConfig {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub primary_address: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Interface {
    #[prost(bytes = "vec", tag = "1")]
    pub interface_id: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub vni: u32,
    #[prost(bytes = "vec", tag = "3")]
    pub primary_ipv4_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub primary_ipv6_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "5")]
    pub underlay_route: Vec<u8>,
    #[prost(string, tag = "6")]
    pub pci_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInterfaceResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(message, optional, tag = "2")]
    pub interface: Option<Interface>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateInterfaceRequest {
    #[prost(enumeration = "InterfaceType", tag = "1")]
    pub interface_type: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub interface_id: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub vni: u32,
    #[prost(message, optional, tag = "4")]
    pub ipv4_config: Option<IpConfig>,
    #[prost(message, optional, tag = "5")]
    pub ipv6_config: Option<IpConfig>,
    #[prost(string, tag = "6")]
    pub device_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateInterfaceResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(bytes = "vec", tag = "2")]
    pub underlay_route: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterfaceVipIp {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub address: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterfaceVipMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub interface_id: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub interface_vip_ip: Option<InterfaceVipIp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GetInterfaceVipResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(enumeration = "IpVersion", tag = "2")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "3")]
    pub address: Vec<u8>,
}

/// Response of calls that allocate an underlay address for the new object
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UnderlayRouteResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(bytes = "vec", tag = "2")]
    pub underlay_route: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Prefix {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub address: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub prefix_length: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct InterfacePrefixMsg {
    #[prost(message, optional, tag = "1")]
    pub interface_id: Option<InterfaceIdMsg>,
    #[prost(message, optional, tag = "2")]
    pub prefix: Option<Prefix>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListPrefixesResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(message, repeated, tag = "2")]
    pub prefixes: Vec<Prefix>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Route {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(uint32, tag = "2")]
    pub weight: u32,
    #[prost(message, optional, tag = "3")]
    pub prefix: Option<Prefix>,
    #[prost(uint32, tag = "4")]
    pub nexthop_vni: u32,
    #[prost(bytes = "vec", tag = "5")]
    pub nexthop_address: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VniMsg {
    #[prost(uint32, tag = "1")]
    pub vni: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct VniRouteMsg {
    #[prost(message, optional, tag = "1")]
    pub vni: Option<VniMsg>,
    #[prost(message, optional, tag = "2")]
    pub route: Option<Route>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListRoutesResponse {
    #[prost(message, optional, tag = "1")]
    pub status: Option<Status>,
    #[prost(message, repeated, tag = "2")]
    pub routes: Vec<Route>,
}

/// NAT mapping of an overlay address to an underlay target owning a port range
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NeighborNatMsg {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub nat_ip: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub vni: u32,
    #[prost(uint32, tag = "4")]
    pub min_port: u32,
    #[prost(uint32, tag = "5")]
    pub max_port: u32,
    #[prost(bytes = "vec", tag = "6")]
    pub underlay_route: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoadBalancerTargetIp {
    #[prost(enumeration = "IpVersion", tag = "1")]
    pub ip_version: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub address: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LoadBalancerTargetMsg {
    #[prost(bytes = "vec", tag = "1")]
    pub load_balancer_id: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub target_ip: Option<LoadBalancerTargetIp>,
}
