use std::sync::Arc;
use std::time::Duration;

use ridehail_core::{CallAuditor, DispatchResult};
use ridehail_domain::{
    AcceptRideResponse, AssignedRideResponse, CompleteRideResponse, DriverRegistrationResponse,
    DriverRequest, RejectRideResponse, RideActionRequest, RideRequest, RideResponse,
    RideStatusResponse,
};

use crate::transport::JsonTransport;

/// 单个派单服务器的HTTP客户端
#[derive(Clone)]
pub struct DispatchClient {
    transport: JsonTransport,
}

impl DispatchClient {
    /// `address` 可以是 `host:port` 或完整URL，`role` 用于审计（`rider` 或 `driver`）
    pub fn new(address: &str, timeout: Duration, role: &'static str) -> DispatchResult<Self> {
        Ok(Self {
            transport: JsonTransport::new(address, timeout, role)?,
        })
    }

    pub fn with_auditor(mut self, auditor: Option<Arc<dyn CallAuditor>>) -> Self {
        self.transport = self.transport.with_auditor(auditor);
        self
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url().as_str()
    }

    pub async fn request_ride(&self, request: &RideRequest) -> DispatchResult<RideResponse> {
        self.transport
            .post("RequestRide", &["api", "v1", "rides"], request)
            .await
    }

    pub async fn ride_status(&self, ride_id: &str) -> DispatchResult<RideStatusResponse> {
        self.transport
            .get("GetRideStatus", &["api", "v1", "rides", ride_id, "status"])
            .await
    }

    pub async fn accept_ride(
        &self,
        driver_id: &str,
        ride_id: &str,
    ) -> DispatchResult<AcceptRideResponse> {
        self.transport
            .post(
                "AcceptRide",
                &["api", "v1", "rides", ride_id, "accept"],
                &action(driver_id),
            )
            .await
    }

    pub async fn reject_ride(
        &self,
        driver_id: &str,
        ride_id: &str,
    ) -> DispatchResult<RejectRideResponse> {
        self.transport
            .post(
                "RejectRide",
                &["api", "v1", "rides", ride_id, "reject"],
                &action(driver_id),
            )
            .await
    }

    pub async fn complete_ride(
        &self,
        driver_id: &str,
        ride_id: &str,
    ) -> DispatchResult<CompleteRideResponse> {
        self.transport
            .post(
                "CompleteRide",
                &["api", "v1", "rides", ride_id, "complete"],
                &action(driver_id),
            )
            .await
    }

    pub async fn register_driver(&self, driver_id: &str) -> DispatchResult<DriverRegistrationResponse> {
        let request = DriverRequest {
            driver_id: driver_id.to_string(),
        };
        self.transport
            .post("RegisterDriver", &["api", "v1", "drivers"], &request)
            .await
    }

    pub async fn unregister_driver(
        &self,
        driver_id: &str,
    ) -> DispatchResult<DriverRegistrationResponse> {
        self.transport
            .delete("UnregisterDriver", &["api", "v1", "drivers", driver_id])
            .await
    }

    pub async fn assigned_ride(&self, driver_id: &str) -> DispatchResult<AssignedRideResponse> {
        self.transport
            .get(
                "GetAssignedRide",
                &["api", "v1", "drivers", driver_id, "assigned-ride"],
            )
            .await
    }
}

fn action(driver_id: &str) -> RideActionRequest {
    RideActionRequest {
        driver_id: driver_id.to_string(),
    }
}
