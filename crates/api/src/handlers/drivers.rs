use axum::{
    extract::{Path, State},
    Json,
};

use ridehail_domain::{
    AssignedRideResponse, DriverRegistrationResponse, DriverRegistrationStatus, DriverRequest,
};

use crate::{
    error::{ApiError, ApiResult},
    routes::DispatchState,
};

/// 注册司机
pub async fn register_driver(
    State(state): State<DispatchState>,
    Json(request): Json<DriverRequest>,
) -> ApiResult<Json<DriverRegistrationResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;

    state.service.register_driver(&request.driver_id).await?;
    Ok(Json(DriverRegistrationResponse {
        status: DriverRegistrationStatus::DriverRegistered,
    }))
}

/// 注销司机
pub async fn unregister_driver(
    State(state): State<DispatchState>,
    Path(driver_id): Path<String>,
) -> ApiResult<Json<DriverRegistrationResponse>> {
    state.service.unregister_driver(&driver_id).await?;
    Ok(Json(DriverRegistrationResponse {
        status: DriverRegistrationStatus::DriverUnregistered,
    }))
}

/// 查询指派给司机的待确认行程
pub async fn assigned_ride(
    State(state): State<DispatchState>,
    Path(driver_id): Path<String>,
) -> ApiResult<Json<AssignedRideResponse>> {
    let response = state
        .service
        .assigned_ride(&driver_id)
        .await?
        .map(|ride| AssignedRideResponse::from(&ride))
        .unwrap_or_else(AssignedRideResponse::none);

    Ok(Json(response))
}
