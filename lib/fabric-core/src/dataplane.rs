//! Translation between the network object model and dataplane RPCs
//!
//! Every method issues exactly one RPC. Addresses are rendered to their
//! canonical string form on the way out and parsed on the way back; an
//! unparsable address in a response, or one whose family disagrees with the
//! accompanying version tag, is reported as an error.

use crate::error::{DataplaneError, Result};
use crate::model::{
    Interface, InterfaceMetadata, InterfaceSpec, InterfaceStatus, InterfaceUid,
    LoadBalancerTarget, NeighborNat, Prefix, Route, RouteNextHop, VirtualIp,
};
use crate::status::{self, Ignore};
use fabric_api::dpservice::{self, DataplaneService};
use fabric_api::Vni;
use ipnetwork::IpNetwork;
use std::net::{AddrParseError, IpAddr};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Routes are installed equal-cost with a single fixed weight
const ROUTE_WEIGHT: u32 = 100;

/// DataplaneClient maps network objects onto a [`DataplaneService`]
#[derive(Clone)]
pub struct DataplaneClient {
    service: Arc<dyn DataplaneService>,
}

impl DataplaneClient {
    pub fn new(service: Arc<dyn DataplaneService>) -> Self {
        Self { service }
    }

    pub async fn get_interface(&self, uid: &InterfaceUid) -> Result<Interface> {
        let res = self.service.get_interface(interface_id_msg(uid)).await?;
        status::check(res.status.as_ref())?;

        let iface = res.interface.ok_or(DataplaneError::MissingField("interface"))?;
        // The dataplane assigns an underlay address to every interface it creates
        if iface.underlay_route.is_empty() {
            return Err(DataplaneError::MissingField("underlay route"));
        }
        Ok(Interface {
            metadata: InterfaceMetadata { uid: uid.clone() },
            spec: InterfaceSpec {
                vni: iface.vni,
                device: iface.pci_name,
                primary_ipv4_address: parse_optional("primary ipv4 address", &iface.primary_ipv4_address)?,
                primary_ipv6_address: parse_optional("primary ipv6 address", &iface.primary_ipv6_address)?,
            },
            status: InterfaceStatus {
                underlay_route: Some(parse_addr("underlay route", &iface.underlay_route)?),
            },
        })
    }

    pub async fn create_interface(&self, iface: &Interface) -> Result<Interface> {
        let res = self
            .service
            .create_interface(dpservice::CreateInterfaceRequest {
                interface_type: dpservice::InterfaceType::VirtualInterface as i32,
                interface_id: iface.uid().to_bytes(),
                vni: iface.spec.vni,
                ipv4_config: iface.spec.primary_ipv4_address.map(|addr| ip_config(addr.into())),
                ipv6_config: iface.spec.primary_ipv6_address.map(|addr| ip_config(addr.into())),
                device_name: iface.spec.device.clone(),
            })
            .await?;
        status::check(res.status.as_ref())?;

        let underlay_route = parse_addr("underlay route", &res.underlay_route)?;
        debug!("Created interface {} with underlay route {}", iface.uid(), underlay_route);

        Ok(Interface {
            metadata: iface.metadata.clone(),
            spec: iface.spec.clone(),
            status: InterfaceStatus {
                underlay_route: Some(underlay_route),
            },
        })
    }

    pub async fn delete_interface(&self, uid: &InterfaceUid) -> Result<()> {
        let res = self.service.delete_interface(interface_id_msg(uid)).await?;
        status::check(Some(&res))?;
        debug!("Deleted interface {}", uid);
        Ok(())
    }

    pub async fn get_virtual_ip(&self, interface_uid: &InterfaceUid) -> Result<VirtualIp> {
        let res = self.service.get_interface_vip(interface_id_msg(interface_uid)).await?;
        status::check(res.status.as_ref())?;

        Ok(VirtualIp {
            interface_uid: interface_uid.clone(),
            address: parse_tagged("virtual ip address", res.ip_version, &res.address)?,
        })
    }

    pub async fn create_virtual_ip(&self, virtual_ip: &VirtualIp) -> Result<VirtualIp> {
        let res = self
            .service
            .add_interface_vip(dpservice::InterfaceVipMsg {
                interface_id: virtual_ip.interface_uid.to_bytes(),
                interface_vip_ip: Some(dpservice::InterfaceVipIp {
                    ip_version: ip_version(&virtual_ip.address),
                    address: addr_to_wire(&virtual_ip.address),
                }),
            })
            .await?;
        status::check(res.status.as_ref())?;
        debug!("Created virtual ip {} on interface {}", virtual_ip.address, virtual_ip.interface_uid);
        Ok(virtual_ip.clone())
    }

    pub async fn delete_virtual_ip(&self, interface_uid: &InterfaceUid) -> Result<()> {
        let res = self.service.delete_interface_vip(interface_id_msg(interface_uid)).await?;
        status::check(Some(&res))?;
        debug!("Deleted virtual ip of interface {}", interface_uid);
        Ok(())
    }

    pub async fn list_prefixes(&self, interface_uid: &InterfaceUid) -> Result<Vec<Prefix>> {
        let res = self
            .service
            .list_interface_prefixes(interface_id_msg(interface_uid))
            .await?;
        status::check(res.status.as_ref())?;

        res.prefixes
            .iter()
            .map(|prefix| {
                Ok(Prefix {
                    interface_uid: interface_uid.clone(),
                    prefix: prefix_from_wire(prefix)?,
                })
            })
            .collect()
    }

    pub async fn create_prefix(&self, prefix: &Prefix) -> Result<Prefix> {
        let res = self
            .service
            .add_interface_prefix(interface_prefix_msg(&prefix.interface_uid, &prefix.prefix))
            .await?;
        status::check(res.status.as_ref())?;
        debug!("Created prefix {} on interface {}", prefix.prefix, prefix.interface_uid);
        Ok(prefix.clone())
    }

    pub async fn delete_prefix(&self, interface_uid: &InterfaceUid, prefix: IpNetwork) -> Result<()> {
        let res = self
            .service
            .delete_interface_prefix(interface_prefix_msg(interface_uid, &prefix))
            .await?;
        status::check(Some(&res))?;
        debug!("Deleted prefix {} from interface {}", prefix, interface_uid);
        Ok(())
    }

    pub async fn create_route(&self, route: &Route, ignore: Ignore) -> Result<Route> {
        let res = self.service.add_route(route_to_wire(route)).await?;
        status::check_ignoring("create route", Some(&res), ignore)?;
        debug!("Created route {}", route);
        Ok(*route)
    }

    pub async fn delete_route(&self, route: &Route, ignore: Ignore) -> Result<()> {
        let res = self.service.delete_route(route_to_wire(route)).await?;
        status::check_ignoring("delete route", Some(&res), ignore)?;
        debug!("Deleted route {}", route);
        Ok(())
    }

    /// All routes currently installed in `vni`
    pub async fn list_routes(&self, vni: Vni) -> Result<Vec<Route>> {
        let res = self.service.list_routes(dpservice::VniMsg { vni }).await?;
        status::check(res.status.as_ref())?;
        res.routes.iter().map(|route| route_from_wire(vni, route)).collect()
    }

    pub async fn create_neighbor_nat(&self, nat: &NeighborNat, ignore: Ignore) -> Result<NeighborNat> {
        let res = self.service.add_neighbor_nat(neighbor_nat_to_wire(nat)).await?;
        status::check_ignoring("create neighbor nat", Some(&res), ignore)?;
        debug!("Created neighbor nat {} in vni {}", nat.nat_ip, nat.vni);
        Ok(*nat)
    }

    pub async fn delete_neighbor_nat(&self, nat: &NeighborNat, ignore: Ignore) -> Result<()> {
        let res = self.service.delete_neighbor_nat(neighbor_nat_to_wire(nat)).await?;
        status::check_ignoring("delete neighbor nat", Some(&res), ignore)?;
        debug!("Deleted neighbor nat {} in vni {}", nat.nat_ip, nat.vni);
        Ok(())
    }

    pub async fn create_load_balancer_target(
        &self,
        target: &LoadBalancerTarget,
        ignore: Ignore,
    ) -> Result<LoadBalancerTarget> {
        let res = self
            .service
            .add_load_balancer_target(lb_target_to_wire(&target.load_balancer_id, &target.target_ip))
            .await?;
        status::check_ignoring("create lb target", Some(&res), ignore)?;
        debug!("Created lb target {} for {}", target.target_ip, target.load_balancer_id);
        Ok(target.clone())
    }

    pub async fn delete_load_balancer_target(
        &self,
        load_balancer_id: &str,
        target_ip: IpAddr,
        ignore: Ignore,
    ) -> Result<()> {
        let res = self
            .service
            .delete_load_balancer_target(lb_target_to_wire(load_balancer_id, &target_ip))
            .await?;
        status::check_ignoring("delete lb target", Some(&res), ignore)?;
        debug!("Deleted lb target {} for {}", target_ip, load_balancer_id);
        Ok(())
    }
}

fn ip_version(addr: &IpAddr) -> i32 {
    match addr {
        IpAddr::V4(_) => dpservice::IpVersion::Ipv4 as i32,
        IpAddr::V6(_) => dpservice::IpVersion::Ipv6 as i32,
    }
}

fn addr_to_wire(addr: &IpAddr) -> Vec<u8> {
    addr.to_string().into_bytes()
}

fn parse_addr(field: &'static str, raw: &[u8]) -> Result<IpAddr> {
    parse_wire(field, raw)
}

/// Parse an address that travels with an explicit [`dpservice::IpVersion`] tag
fn parse_tagged(field: &'static str, tag: i32, raw: &[u8]) -> Result<IpAddr> {
    let address = parse_addr(field, raw)?;
    if ip_version(&address) != tag {
        return Err(DataplaneError::IpVersionMismatch {
            field,
            address,
            ip_version: tag,
        });
    }
    Ok(address)
}

/// Empty fields are unset; anything else must parse as `A`
fn parse_optional<A>(field: &'static str, raw: &[u8]) -> Result<Option<A>>
where
    A: FromStr<Err = AddrParseError>,
{
    if raw.is_empty() {
        return Ok(None);
    }
    parse_wire(field, raw).map(Some)
}

fn parse_wire<A>(field: &'static str, raw: &[u8]) -> Result<A>
where
    A: FromStr<Err = AddrParseError>,
{
    let text = String::from_utf8_lossy(raw);
    text.parse().map_err(|source| DataplaneError::Parse {
        field,
        value: text.into_owned(),
        source,
    })
}

fn ip_config(addr: IpAddr) -> dpservice::IpConfig {
    dpservice::IpConfig {
        ip_version: ip_version(&addr),
        primary_address: addr_to_wire(&addr),
    }
}

fn interface_id_msg(uid: &InterfaceUid) -> dpservice::InterfaceIdMsg {
    dpservice::InterfaceIdMsg {
        interface_id: uid.to_bytes(),
    }
}

fn interface_prefix_msg(uid: &InterfaceUid, prefix: &IpNetwork) -> dpservice::InterfacePrefixMsg {
    dpservice::InterfacePrefixMsg {
        interface_id: Some(interface_id_msg(uid)),
        prefix: Some(prefix_to_wire(prefix)),
    }
}

fn prefix_to_wire(prefix: &IpNetwork) -> dpservice::Prefix {
    let addr = prefix.ip();
    dpservice::Prefix {
        ip_version: ip_version(&addr),
        address: addr_to_wire(&addr),
        prefix_length: u32::from(prefix.prefix()),
    }
}

fn prefix_from_wire(prefix: &dpservice::Prefix) -> Result<IpNetwork> {
    let address = parse_tagged("prefix address", prefix.ip_version, &prefix.address)?;
    u8::try_from(prefix.prefix_length)
        .ok()
        .and_then(|length| IpNetwork::new(address, length).ok())
        .ok_or(DataplaneError::InvalidPrefixLength {
            address,
            length: prefix.prefix_length,
        })
}

fn route_to_wire(route: &Route) -> dpservice::VniRouteMsg {
    dpservice::VniRouteMsg {
        vni: Some(dpservice::VniMsg { vni: route.vni }),
        route: Some(dpservice::Route {
            ip_version: ip_version(&route.next_hop.address),
            weight: ROUTE_WEIGHT,
            prefix: Some(prefix_to_wire(&route.prefix)),
            nexthop_vni: route.next_hop.vni,
            nexthop_address: addr_to_wire(&route.next_hop.address),
        }),
    }
}

fn route_from_wire(vni: Vni, route: &dpservice::Route) -> Result<Route> {
    let prefix = route
        .prefix
        .as_ref()
        .ok_or(DataplaneError::MissingField("route prefix"))?;

    Ok(Route {
        vni,
        prefix: prefix_from_wire(prefix)?,
        next_hop: RouteNextHop {
            vni: route.nexthop_vni,
            address: parse_tagged("route next hop address", route.ip_version, &route.nexthop_address)?,
        },
    })
}

fn neighbor_nat_to_wire(nat: &NeighborNat) -> dpservice::NeighborNatMsg {
    dpservice::NeighborNatMsg {
        ip_version: ip_version(&nat.nat_ip),
        nat_ip: addr_to_wire(&nat.nat_ip),
        vni: nat.vni,
        min_port: u32::from(nat.min_port),
        max_port: u32::from(nat.max_port),
        underlay_route: addr_to_wire(&nat.underlay_route),
    }
}

fn lb_target_to_wire(load_balancer_id: &str, target_ip: &IpAddr) -> dpservice::LoadBalancerTargetMsg {
    dpservice::LoadBalancerTargetMsg {
        load_balancer_id: load_balancer_id.as_bytes().to_vec(),
        target_ip: Some(dpservice::LoadBalancerTargetIp {
            ip_version: ip_version(target_ip),
            address: addr_to_wire(target_ip),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ALREADY_EXISTS, NOT_FOUND, ROUTE_EXISTS, ROUTE_NOT_FOUND};
    use crate::testing::{FakeDataplane, Rpc};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn client() -> (Arc<FakeDataplane>, DataplaneClient) {
        let fake = Arc::new(FakeDataplane::new());
        (fake.clone(), DataplaneClient::new(fake))
    }

    fn interface(uid: &str) -> Interface {
        Interface::new(
            InterfaceUid::new(uid),
            InterfaceSpec {
                vni: 100,
                device: "0000:3b:00.2".to_string(),
                primary_ipv4_address: Some(Ipv4Addr::new(10, 0, 0, 1)),
                primary_ipv6_address: Some("2001:db8::1".parse().unwrap()),
            },
        )
    }

    fn route(vni: Vni, prefix: &str, nh_vni: Vni, nh: &str) -> Route {
        Route {
            vni,
            prefix: prefix.parse().unwrap(),
            next_hop: RouteNextHop {
                vni: nh_vni,
                address: nh.parse().unwrap(),
            },
        }
    }

    #[test]
    fn test_prefix_wire_form() {
        let wire = prefix_to_wire(&"10.0.0.0/24".parse().unwrap());
        assert_eq!(wire.address, b"10.0.0.0".to_vec());
        assert_eq!(wire.prefix_length, 24);
        assert_eq!(wire.ip_version, dpservice::IpVersion::Ipv4 as i32);

        let back = prefix_from_wire(&wire).unwrap();
        assert_eq!(back.to_string(), "10.0.0.0/24");
    }

    #[test]
    fn test_prefix_from_wire_rejects_bad_length() {
        let wire = dpservice::Prefix {
            ip_version: dpservice::IpVersion::Ipv4 as i32,
            address: b"10.0.0.0".to_vec(),
            prefix_length: 33,
        };
        assert!(matches!(
            prefix_from_wire(&wire),
            Err(DataplaneError::InvalidPrefixLength { length: 33, .. })
        ));

        let wire = dpservice::Prefix {
            prefix_length: 300,
            ..wire
        };
        assert!(matches!(
            prefix_from_wire(&wire),
            Err(DataplaneError::InvalidPrefixLength { length: 300, .. })
        ));
    }

    #[test]
    fn test_prefix_from_wire_rejects_wrong_version_tag() {
        let wire = dpservice::Prefix {
            ip_version: dpservice::IpVersion::Ipv6 as i32,
            address: b"10.0.0.0".to_vec(),
            prefix_length: 24,
        };
        assert!(matches!(
            prefix_from_wire(&wire),
            Err(DataplaneError::IpVersionMismatch {
                field: "prefix address",
                ip_version: 1,
                ..
            })
        ));

        let wire = dpservice::Prefix {
            ip_version: dpservice::IpVersion::Ipv4 as i32,
            address: b"2001:db8::".to_vec(),
            prefix_length: 32,
        };
        assert!(matches!(
            prefix_from_wire(&wire),
            Err(DataplaneError::IpVersionMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_optional_enforces_family() {
        assert_eq!(parse_optional::<Ipv4Addr>("v4", b"").unwrap(), None);
        assert_eq!(
            parse_optional::<Ipv4Addr>("v4", b"192.168.0.1").unwrap(),
            Some(Ipv4Addr::new(192, 168, 0, 1))
        );
        assert!(matches!(
            parse_optional::<Ipv4Addr>("v4", b"2001:db8::1"),
            Err(DataplaneError::Parse { field: "v4", .. })
        ));
        assert!(parse_optional::<Ipv6Addr>("v6", b"2001:db8::1").unwrap().is_some());
    }

    #[test]
    fn test_route_wire_form() {
        let msg = route_to_wire(&route(100, "10.0.0.0/24", 200, "fc00::1"));
        assert_eq!(msg.vni, Some(dpservice::VniMsg { vni: 100 }));
        let wire = msg.route.unwrap();
        assert_eq!(wire.weight, ROUTE_WEIGHT);
        assert_eq!(wire.nexthop_vni, 200);
        assert_eq!(wire.nexthop_address, b"fc00::1".to_vec());
        assert_eq!(wire.ip_version, dpservice::IpVersion::Ipv6 as i32);
        assert_eq!(wire.prefix.unwrap().address, b"10.0.0.0".to_vec());
    }

    #[tokio::test]
    async fn test_create_and_get_interface() {
        let (_fake, client) = client();
        let created = client.create_interface(&interface("iface-1")).await.unwrap();
        let underlay = created.status.underlay_route.expect("underlay route assigned");

        let fetched = client.get_interface(&InterfaceUid::new("iface-1")).await.unwrap();
        assert_eq!(fetched.spec, created.spec);
        assert_eq!(fetched.status.underlay_route, Some(underlay));
        assert_eq!(fetched.uid().as_str(), "iface-1");
    }

    #[tokio::test]
    async fn test_get_interface_requires_underlay_route() {
        let (fake, client) = client();
        fake.insert_raw_interface(dpservice::Interface {
            interface_id: b"iface-1".to_vec(),
            vni: 100,
            primary_ipv4_address: b"10.0.0.1".to_vec(),
            primary_ipv6_address: Vec::new(),
            underlay_route: Vec::new(),
            pci_name: "0000:3b:00.2".to_string(),
        });

        let err = client.get_interface(&"iface-1".into()).await.unwrap_err();
        assert!(matches!(err, DataplaneError::MissingField("underlay route")));
    }

    #[tokio::test]
    async fn test_create_interface_twice_is_status_error() {
        let (_fake, client) = client();
        client.create_interface(&interface("iface-1")).await.unwrap();
        let err = client.create_interface(&interface("iface-1")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(ALREADY_EXISTS));
    }

    #[tokio::test]
    async fn test_get_missing_interface() {
        let (_fake, client) = client();
        let err = client.get_interface(&InterfaceUid::new("nope")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(NOT_FOUND));

        let err = client.delete_interface(&InterfaceUid::new("nope")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn test_virtual_ip_lifecycle() {
        let (_fake, client) = client();
        let uid = InterfaceUid::new("iface-1");
        let vip = VirtualIp {
            interface_uid: uid.clone(),
            address: "45.86.6.6".parse().unwrap(),
        };

        client.create_virtual_ip(&vip).await.unwrap();
        assert_eq!(client.get_virtual_ip(&uid).await.unwrap(), vip);

        client.delete_virtual_ip(&uid).await.unwrap();
        let err = client.get_virtual_ip(&uid).await.unwrap_err();
        assert_eq!(err.status_code(), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn test_prefix_lifecycle() {
        let (_fake, client) = client();
        let uid = InterfaceUid::new("iface-1");
        assert!(client.list_prefixes(&uid).await.unwrap().is_empty());

        for cidr in ["10.1.0.0/16", "2001:db8:1::/48"] {
            client
                .create_prefix(&Prefix {
                    interface_uid: uid.clone(),
                    prefix: cidr.parse().unwrap(),
                })
                .await
                .unwrap();
        }

        let prefixes: Vec<String> = client
            .list_prefixes(&uid)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.prefix.to_string())
            .collect();
        assert_eq!(prefixes, vec!["10.1.0.0/16", "2001:db8:1::/48"]);

        client.delete_prefix(&uid, "10.1.0.0/16".parse().unwrap()).await.unwrap();
        assert_eq!(client.list_prefixes(&uid).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_route_status_codes_and_ignore() {
        let (fake, client) = client();
        let r = route(100, "10.0.0.5/32", 100, "fc00::1");

        client.create_route(&r, Ignore::NONE).await.unwrap();
        let err = client.create_route(&r, Ignore::NONE).await.unwrap_err();
        assert_eq!(err.status_code(), Some(ROUTE_EXISTS));
        client
            .create_route(&r, Ignore::codes(&[ROUTE_EXISTS]))
            .await
            .unwrap();
        assert_eq!(fake.routes(100), vec![r]);

        client.delete_route(&r, Ignore::NONE).await.unwrap();
        let err = client.delete_route(&r, Ignore::NONE).await.unwrap_err();
        assert_eq!(err.status_code(), Some(ROUTE_NOT_FOUND));
        client
            .delete_route(&r, Ignore::codes(&[ROUTE_NOT_FOUND]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_routes_round_trips() {
        let (_fake, client) = client();
        let a = route(100, "10.0.0.0/24", 200, "fc00::1");
        let b = route(100, "2001:db8::/64", 100, "fc00::2");
        client.create_route(&a, Ignore::NONE).await.unwrap();
        client.create_route(&b, Ignore::NONE).await.unwrap();

        let mut listed = client.list_routes(100).await.unwrap();
        listed.sort_by_key(|r| r.prefix.to_string());
        assert_eq!(listed, vec![a, b]);
        assert!(client.list_routes(300).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_never_ignored() {
        let (fake, client) = client();
        fake.fail_transport(Rpc::DeleteRoute);
        let r = route(100, "10.0.0.0/24", 100, "fc00::1");

        let err = client
            .delete_route(&r, Ignore::codes(&[ROUTE_NOT_FOUND]))
            .await
            .unwrap_err();
        assert!(matches!(err, DataplaneError::Transport(_)));
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_unparsable_response_address() {
        let (fake, client) = client();
        fake.insert_raw_route(
            100,
            dpservice::Route {
                ip_version: dpservice::IpVersion::Ipv4 as i32,
                weight: ROUTE_WEIGHT,
                prefix: Some(prefix_to_wire(&"10.0.0.0/24".parse().unwrap())),
                nexthop_vni: 100,
                nexthop_address: b"not-an-address".to_vec(),
            },
        );

        let err = client.list_routes(100).await.unwrap_err();
        assert!(matches!(
            err,
            DataplaneError::Parse {
                field: "route next hop address",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_route_next_hop_with_wrong_version_tag() {
        let (fake, client) = client();
        fake.insert_raw_route(
            100,
            dpservice::Route {
                ip_version: dpservice::IpVersion::Ipv4 as i32,
                weight: ROUTE_WEIGHT,
                prefix: Some(prefix_to_wire(&"10.0.0.0/24".parse().unwrap())),
                nexthop_vni: 100,
                nexthop_address: b"fc00::1".to_vec(),
            },
        );

        let err = client.list_routes(100).await.unwrap_err();
        assert!(matches!(
            err,
            DataplaneError::IpVersionMismatch {
                field: "route next hop address",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_neighbor_nat_and_lb_target() {
        let (fake, client) = client();
        let nat = NeighborNat {
            nat_ip: "45.86.6.10".parse().unwrap(),
            vni: 100,
            min_port: 1024,
            max_port: 2048,
            underlay_route: "fc00::10".parse().unwrap(),
        };
        client.create_neighbor_nat(&nat, Ignore::NONE).await.unwrap();
        let err = client.create_neighbor_nat(&nat, Ignore::NONE).await.unwrap_err();
        assert_eq!(err.status_code(), Some(ALREADY_EXISTS));
        assert_eq!(fake.neighbor_nats(), vec![nat]);
        client.delete_neighbor_nat(&nat, Ignore::NONE).await.unwrap();
        assert!(fake.neighbor_nats().is_empty());

        let target = LoadBalancerTarget {
            load_balancer_id: "lb-1".to_string(),
            target_ip: "fc00::20".parse().unwrap(),
        };
        client.create_load_balancer_target(&target, Ignore::NONE).await.unwrap();
        assert_eq!(fake.load_balancer_targets(), vec![target.clone()]);
        client
            .delete_load_balancer_target("lb-1", target.target_ip, Ignore::NONE)
            .await
            .unwrap();
        let err = client
            .delete_load_balancer_target("lb-1", target.target_ip, Ignore::NONE)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(NOT_FOUND));
    }
}
