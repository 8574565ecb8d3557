use axum::{
    http::Method,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use ridehail_domain::{RideDispatchService, RoutingService};

use crate::handlers::{
    drivers::{assigned_ride, register_driver, unregister_driver},
    health::health_check,
    rides::{accept_ride, complete_ride, reject_ride, request_ride, ride_status},
    routing::{driver_exit, route_driver, route_rider},
};

/// 派单服务状态
#[derive(Clone)]
pub struct DispatchState {
    pub service: Arc<dyn RideDispatchService>,
}

/// 路由服务状态
#[derive(Clone)]
pub struct RoutingState {
    pub service: Arc<dyn RoutingService>,
}

/// 创建派单服务路由
pub fn create_dispatch_routes(state: DispatchState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // 行程
        .route("/api/v1/rides", post(request_ride))
        .route("/api/v1/rides/{ride_id}/status", get(ride_status))
        .route("/api/v1/rides/{ride_id}/accept", post(accept_ride))
        .route("/api/v1/rides/{ride_id}/reject", post(reject_ride))
        .route("/api/v1/rides/{ride_id}/complete", post(complete_ride))
        // 司机
        .route("/api/v1/drivers", post(register_driver))
        .route("/api/v1/drivers/{driver_id}", delete(unregister_driver))
        .route("/api/v1/drivers/{driver_id}/assigned-ride", get(assigned_ride))
        .with_state(state)
}

/// 创建负载均衡路由服务路由
pub fn create_routing_routes(state: RoutingState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/route/rider", post(route_rider))
        .route("/api/v1/route/driver", post(route_driver))
        .route("/api/v1/route/driver-exit", post(driver_exit))
        .with_state(state)
}

/// 路由模板对应的RPC方法名，用于审计和日志
pub fn rpc_method_name(method: &Method, route: &str) -> Option<&'static str> {
    let (expected, name) = match route {
        "/api/v1/rides" => (Method::POST, "RequestRide"),
        "/api/v1/rides/{ride_id}/status" => (Method::GET, "GetRideStatus"),
        "/api/v1/rides/{ride_id}/accept" => (Method::POST, "AcceptRide"),
        "/api/v1/rides/{ride_id}/reject" => (Method::POST, "RejectRide"),
        "/api/v1/rides/{ride_id}/complete" => (Method::POST, "CompleteRide"),
        "/api/v1/drivers" => (Method::POST, "RegisterDriver"),
        "/api/v1/drivers/{driver_id}" => (Method::DELETE, "UnregisterDriver"),
        "/api/v1/drivers/{driver_id}/assigned-ride" => (Method::GET, "GetAssignedRide"),
        "/api/v1/route/rider" => (Method::POST, "GetServerPortForRider"),
        "/api/v1/route/driver" => (Method::POST, "GetServerPortForDriver"),
        "/api/v1/route/driver-exit" => (Method::POST, "DriverExit"),
        _ => return None,
    };
    (*method == expected).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_method_name() {
        assert_eq!(
            rpc_method_name(&Method::POST, "/api/v1/rides"),
            Some("RequestRide")
        );
        assert_eq!(
            rpc_method_name(&Method::DELETE, "/api/v1/drivers/{driver_id}"),
            Some("UnregisterDriver")
        );
        assert_eq!(rpc_method_name(&Method::GET, "/api/v1/rides"), None);
        assert_eq!(rpc_method_name(&Method::GET, "/health"), None);
    }
}
