use axum::{extract::State, Json};

use ridehail_domain::{
    DriverExitRequest, DriverExitResponse, DriverRouteRequest, DriverServerResponse,
    RiderRouteRequest, ServerListResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    routes::RoutingState,
};

/// 乘客获取按轮询顺序排列的服务器列表
pub async fn route_rider(
    State(state): State<RoutingState>,
    Json(request): Json<RiderRouteRequest>,
) -> ApiResult<Json<ServerListResponse>> {
    ApiError::require("rider_id", &request.rider_id)?;

    let server_addresses = state.service.route_rider(&request.rider_id).await?;
    Ok(Json(ServerListResponse { server_addresses }))
}

/// 司机获取负载最低的服务器
pub async fn route_driver(
    State(state): State<RoutingState>,
    Json(request): Json<DriverRouteRequest>,
) -> ApiResult<Json<DriverServerResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;

    let server_address = state.service.route_driver(&request.driver_id).await?;
    Ok(Json(DriverServerResponse { server_address }))
}

/// 司机退出
pub async fn driver_exit(
    State(state): State<RoutingState>,
    Json(request): Json<DriverExitRequest>,
) -> ApiResult<Json<DriverExitResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;
    ApiError::require("server_address", &request.server_address)?;

    state
        .service
        .release_driver(&request.driver_id, &request.server_address)
        .await?;
    Ok(Json(DriverExitResponse::unregistered()))
}
