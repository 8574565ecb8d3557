use std::sync::Arc;
use std::time::Duration;

use ridehail_core::{CallAuditor, DispatchResult};
use ridehail_domain::{
    DriverExitRequest, DriverExitResponse, DriverRouteRequest, DriverServerResponse,
    RiderRouteRequest, ServerListResponse,
};

use crate::transport::JsonTransport;

/// 负载均衡器的HTTP客户端
#[derive(Clone)]
pub struct RoutingClient {
    transport: JsonTransport,
}

impl RoutingClient {
    pub fn new(balancer_url: &str, timeout: Duration, role: &'static str) -> DispatchResult<Self> {
        Ok(Self {
            transport: JsonTransport::new(balancer_url, timeout, role)?,
        })
    }

    pub fn with_auditor(mut self, auditor: Option<Arc<dyn CallAuditor>>) -> Self {
        self.transport = self.transport.with_auditor(auditor);
        self
    }

    /// 按轮询顺序排列的全部服务器地址
    pub async fn route_rider(&self, rider_id: &str) -> DispatchResult<Vec<String>> {
        let request = RiderRouteRequest {
            rider_id: rider_id.to_string(),
        };
        let response: ServerListResponse = self
            .transport
            .post("GetServerPortForRider", &["api", "v1", "route", "rider"], &request)
            .await?;
        Ok(response.server_addresses)
    }

    /// 当前负载最低的服务器地址
    pub async fn route_driver(&self, driver_id: &str) -> DispatchResult<String> {
        let request = DriverRouteRequest {
            driver_id: driver_id.to_string(),
        };
        let response: DriverServerResponse = self
            .transport
            .post("GetServerPortForDriver", &["api", "v1", "route", "driver"], &request)
            .await?;
        Ok(response.server_address)
    }

    pub async fn driver_exit(
        &self,
        driver_id: &str,
        server_address: &str,
    ) -> DispatchResult<DriverExitResponse> {
        let request = DriverExitRequest {
            driver_id: driver_id.to_string(),
            server_address: server_address.to_string(),
        };
        self.transport
            .post("DriverExit", &["api", "v1", "route", "driver-exit"], &request)
            .await
    }
}
