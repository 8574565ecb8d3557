//! 派单服务与路由服务的请求/响应消息
//!
//! 状态字段序列化为固定的 snake_case 字符串，客户端依据状态字段判断结果，
//! 业务失败不会以传输层错误的形式返回。

use serde::{Deserialize, Serialize};

use crate::entities::{Ride, RideStatus};

/// 行程查询不存在时返回的状态
pub const NO_SUCH_RIDE: &str = "no_such_ride";

/// 负载均衡器确认司机退出时返回的状态
pub const DRIVER_EXIT_STATUS: &str = "Driver unregistered successfully.";

// ---------------------------------------------------------------------------
// 派单服务
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub rider_id: String,
    pub pickup_location: String,
    pub destination: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RideRequestStatus {
    Assigned,
    NoDriversAvailable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RideResponse {
    pub status: RideRequestStatus,
    #[serde(default)]
    pub ride_id: String,
    #[serde(default)]
    pub assigned_driver: String,
}

impl RideResponse {
    pub fn assigned(ride_id: String, driver_id: String) -> Self {
        Self {
            status: RideRequestStatus::Assigned,
            ride_id,
            assigned_driver: driver_id,
        }
    }

    pub fn no_drivers_available() -> Self {
        Self {
            status: RideRequestStatus::NoDriversAvailable,
            ride_id: String::new(),
            assigned_driver: String::new(),
        }
    }
}

/// 司机注册、注销、查询指派行程共用的请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRequest {
    pub driver_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverRegistrationStatus {
    DriverRegistered,
    DriverUnregistered,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverRegistrationResponse {
    pub status: DriverRegistrationStatus,
}

/// 指派给司机的待确认行程，没有行程时所有字段为空字符串
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignedRideResponse {
    #[serde(default)]
    pub ride_id: String,
    #[serde(default)]
    pub pickup_location: String,
    #[serde(default)]
    pub destination: String,
}

impl AssignedRideResponse {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_assigned(&self) -> bool {
        !self.ride_id.is_empty()
    }
}

impl From<&Ride> for AssignedRideResponse {
    fn from(ride: &Ride) -> Self {
        Self {
            ride_id: ride.id.clone(),
            pickup_location: ride.pickup_location.clone(),
            destination: ride.destination.clone(),
        }
    }
}

/// 接单、拒单、完成行程的请求体（ride_id 在路径中）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideActionRequest {
    pub driver_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AcceptRideStatus {
    RideAccepted,
    RideAlreadyAccepted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AcceptRideResponse {
    pub status: AcceptRideStatus,
    #[serde(default)]
    pub ride_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectRideStatus {
    RideRejected,
    NoSuchRide,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RejectRideResponse {
    pub status: RejectRideStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompleteRideStatus {
    RideCompleted,
    RideNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompleteRideResponse {
    pub status: CompleteRideStatus,
}

/// 行程状态查询结果：行程状态字符串或 `no_such_ride`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RideStatusResponse {
    pub status: String,
}

impl RideStatusResponse {
    pub fn from_status(status: Option<RideStatus>) -> Self {
        let status = status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| NO_SUCH_RIDE.to_string());
        Self { status }
    }

    /// 解析为行程状态，`no_such_ride` 返回 None
    pub fn ride_status(&self) -> Option<RideStatus> {
        self.status.parse().ok()
    }
}

// ---------------------------------------------------------------------------
// 路由服务
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiderRouteRequest {
    pub rider_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerListResponse {
    pub server_addresses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverRouteRequest {
    pub driver_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverServerResponse {
    pub server_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverExitRequest {
    pub driver_id: String,
    pub server_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriverExitResponse {
    pub status: String,
}

impl DriverExitResponse {
    pub fn unregistered() -> Self {
        Self {
            status: DRIVER_EXIT_STATUS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(
            serde_json::to_value(RideRequestStatus::NoDriversAvailable).unwrap(),
            json!("no_drivers_available")
        );
        assert_eq!(
            serde_json::to_value(AcceptRideStatus::RideAlreadyAccepted).unwrap(),
            json!("ride_already_accepted")
        );
        assert_eq!(
            serde_json::to_value(RejectRideStatus::NoSuchRide).unwrap(),
            json!("no_such_ride")
        );
        assert_eq!(
            serde_json::to_value(CompleteRideStatus::RideNotFound).unwrap(),
            json!("ride_not_found")
        );
        assert_eq!(
            serde_json::to_value(DriverRegistrationStatus::DriverUnregistered).unwrap(),
            json!("driver_unregistered")
        );
    }

    #[test]
    fn test_ride_response_shape() {
        let value = serde_json::to_value(RideResponse::assigned("r1".into(), "d1".into())).unwrap();
        assert_eq!(
            value,
            json!({"status": "assigned", "ride_id": "r1", "assigned_driver": "d1"})
        );

        let none: RideResponse =
            serde_json::from_value(json!({"status": "no_drivers_available"})).unwrap();
        assert_eq!(none, RideResponse::no_drivers_available());
    }

    #[test]
    fn test_ride_status_response() {
        let missing = RideStatusResponse::from_status(None);
        assert_eq!(missing.status, NO_SUCH_RIDE);
        assert_eq!(missing.ride_status(), None);

        let waiting = RideStatusResponse::from_status(Some(RideStatus::WaitingForAcceptance));
        assert_eq!(waiting.status, "waiting_for_acceptance");
        assert_eq!(waiting.ride_status(), Some(RideStatus::WaitingForAcceptance));
    }

    #[test]
    fn test_assigned_ride_response_empty() {
        let empty: AssignedRideResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!empty.is_assigned());
        assert_eq!(empty, AssignedRideResponse::none());
    }
}
