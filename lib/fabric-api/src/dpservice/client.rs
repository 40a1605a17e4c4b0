//! RPC surface of the dataplane service and its gRPC transport

use super::{
    CreateInterfaceRequest, CreateInterfaceResponse, GetInterfaceResponse,
    GetInterfaceVipResponse, InterfaceIdMsg, InterfacePrefixMsg, InterfaceVipMsg,
    ListPrefixesResponse, ListRoutesResponse, LoadBalancerTargetMsg, NeighborNatMsg, Status,
    UnderlayRouteResponse, VniMsg, VniRouteMsg,
};
use async_trait::async_trait;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};

const SERVICE: &str = "/dpdkonmetal.DPDKonmetal";

/// One method per dataplane RPC.
///
/// An `Err` is a transport failure (the call never produced a response);
/// backend failures arrive as a non-zero code in the response's `Status`.
#[async_trait]
pub trait DataplaneService: Send + Sync {
    async fn get_interface(&self, request: InterfaceIdMsg) -> Result<GetInterfaceResponse, tonic::Status>;
    async fn create_interface(&self, request: CreateInterfaceRequest) -> Result<CreateInterfaceResponse, tonic::Status>;
    async fn delete_interface(&self, request: InterfaceIdMsg) -> Result<Status, tonic::Status>;

    async fn get_interface_vip(&self, request: InterfaceIdMsg) -> Result<GetInterfaceVipResponse, tonic::Status>;
    async fn add_interface_vip(&self, request: InterfaceVipMsg) -> Result<UnderlayRouteResponse, tonic::Status>;
    async fn delete_interface_vip(&self, request: InterfaceIdMsg) -> Result<Status, tonic::Status>;

    async fn list_interface_prefixes(&self, request: InterfaceIdMsg) -> Result<ListPrefixesResponse, tonic::Status>;
    async fn add_interface_prefix(&self, request: InterfacePrefixMsg) -> Result<UnderlayRouteResponse, tonic::Status>;
    async fn delete_interface_prefix(&self, request: InterfacePrefixMsg) -> Result<Status, tonic::Status>;

    async fn add_route(&self, request: VniRouteMsg) -> Result<Status, tonic::Status>;
    async fn delete_route(&self, request: VniRouteMsg) -> Result<Status, tonic::Status>;
    async fn list_routes(&self, request: VniMsg) -> Result<ListRoutesResponse, tonic::Status>;

    async fn add_neighbor_nat(&self, request: NeighborNatMsg) -> Result<Status, tonic::Status>;
    async fn delete_neighbor_nat(&self, request: NeighborNatMsg) -> Result<Status, tonic::Status>;

    async fn add_load_balancer_target(&self, request: LoadBalancerTargetMsg) -> Result<Status, tonic::Status>;
    async fn delete_load_balancer_target(&self, request: LoadBalancerTargetMsg) -> Result<Status, tonic::Status>;
}

/// GrpcDataplane speaks to the dataplane service over a tonic channel
#[derive(Clone, Debug)]
pub struct GrpcDataplane {
    inner: tonic::client::Grpc<Channel>,
}

impl GrpcDataplane {
    /// Connect to the dataplane service at `address` (e.g. `http://[::1]:1337`)
    pub async fn connect(address: String) -> Result<Self, tonic::transport::Error> {
        let channel = Endpoint::new(address)?.connect().await?;
        Ok(Self::new(channel))
    }

    /// Wrap an established channel
    pub fn new(channel: Channel) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
        }
    }

    async fn unary<Req, Resp>(&self, method: &'static str, request: Req) -> Result<Resp, tonic::Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = self.inner.clone();
        grpc.ready().await.map_err(|e| {
            tonic::Status::unavailable(format!("dataplane service was not ready: {}", e))
        })?;

        let path = PathAndQuery::try_from(format!("{}/{}", SERVICE, method))
            .map_err(|e| tonic::Status::internal(format!("invalid rpc path for {}: {}", method, e)))?;
        let codec = tonic::codec::ProstCodec::default();

        let response = grpc.unary(tonic::Request::new(request), path, codec).await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl DataplaneService for GrpcDataplane {
    async fn get_interface(&self, request: InterfaceIdMsg) -> Result<GetInterfaceResponse, tonic::Status> {
        self.unary("GetInterface", request).await
    }

    async fn create_interface(&self, request: CreateInterfaceRequest) -> Result<CreateInterfaceResponse, tonic::Status> {
        self.unary("CreateInterface", request).await
    }

    async fn delete_interface(&self, request: InterfaceIdMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteInterface", request).await
    }

    async fn get_interface_vip(&self, request: InterfaceIdMsg) -> Result<GetInterfaceVipResponse, tonic::Status> {
        self.unary("GetInterfaceVIP", request).await
    }

    async fn add_interface_vip(&self, request: InterfaceVipMsg) -> Result<UnderlayRouteResponse, tonic::Status> {
        self.unary("AddInterfaceVIP", request).await
    }

    async fn delete_interface_vip(&self, request: InterfaceIdMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteInterfaceVIP", request).await
    }

    async fn list_interface_prefixes(&self, request: InterfaceIdMsg) -> Result<ListPrefixesResponse, tonic::Status> {
        self.unary("ListInterfacePrefixes", request).await
    }

    async fn add_interface_prefix(&self, request: InterfacePrefixMsg) -> Result<UnderlayRouteResponse, tonic::Status> {
        self.unary("AddInterfacePrefix", request).await
    }

    async fn delete_interface_prefix(&self, request: InterfacePrefixMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteInterfacePrefix", request).await
    }

    async fn add_route(&self, request: VniRouteMsg) -> Result<Status, tonic::Status> {
        self.unary("AddRoute", request).await
    }

    async fn delete_route(&self, request: VniRouteMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteRoute", request).await
    }

    async fn list_routes(&self, request: VniMsg) -> Result<ListRoutesResponse, tonic::Status> {
        self.unary("ListRoutes", request).await
    }

    async fn add_neighbor_nat(&self, request: NeighborNatMsg) -> Result<Status, tonic::Status> {
        self.unary("AddNeighborNAT", request).await
    }

    async fn delete_neighbor_nat(&self, request: NeighborNatMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteNeighborNAT", request).await
    }

    async fn add_load_balancer_target(&self, request: LoadBalancerTargetMsg) -> Result<Status, tonic::Status> {
        self.unary("AddLoadBalancerTarget", request).await
    }

    async fn delete_load_balancer_target(&self, request: LoadBalancerTargetMsg) -> Result<Status, tonic::Status> {
        self.unary("DeleteLoadBalancerTarget", request).await
    }
}
