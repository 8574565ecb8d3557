use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use ridehail_core::DispatchResult;
use ridehail_domain::{
    AcceptRideResponse, AcceptRideStatus, CompleteRideResponse, CompleteRideStatus,
    RejectRideResponse, RejectRideStatus, RideActionRequest, RideRequest, RideResponse,
    RideStatusResponse,
};

use crate::{
    error::{ApiError, ApiResult},
    routes::DispatchState,
};

/// 业务拒绝映射为失败状态，系统故障继续向上传播
fn outcome<T>(result: DispatchResult<()>, success: T, rejected: T) -> ApiResult<T> {
    match result {
        Ok(()) => Ok(success),
        Err(e) if e.is_rejection() => {
            debug!("操作被拒绝: {}", e);
            Ok(rejected)
        }
        Err(e) => Err(ApiError::Dispatch(e)),
    }
}

/// 创建行程
pub async fn request_ride(
    State(state): State<DispatchState>,
    Json(request): Json<RideRequest>,
) -> ApiResult<Json<RideResponse>> {
    ApiError::require("rider_id", &request.rider_id)?;

    let response = state.service.request_ride(request).await?;
    Ok(Json(response))
}

/// 查询行程状态
pub async fn ride_status(
    State(state): State<DispatchState>,
    Path(ride_id): Path<String>,
) -> ApiResult<Json<RideStatusResponse>> {
    let status = state.service.ride_status(&ride_id).await?;
    Ok(Json(RideStatusResponse::from_status(status)))
}

/// 司机接单
pub async fn accept_ride(
    State(state): State<DispatchState>,
    Path(ride_id): Path<String>,
    Json(request): Json<RideActionRequest>,
) -> ApiResult<Json<AcceptRideResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;

    let result = state.service.accept_ride(&request.driver_id, &ride_id).await;
    let status = outcome(
        result,
        AcceptRideStatus::RideAccepted,
        AcceptRideStatus::RideAlreadyAccepted,
    )?;

    Ok(Json(AcceptRideResponse { status, ride_id }))
}

/// 司机拒单
pub async fn reject_ride(
    State(state): State<DispatchState>,
    Path(ride_id): Path<String>,
    Json(request): Json<RideActionRequest>,
) -> ApiResult<Json<RejectRideResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;

    let result = state.service.reject_ride(&request.driver_id, &ride_id).await;
    let status = outcome(
        result,
        RejectRideStatus::RideRejected,
        RejectRideStatus::NoSuchRide,
    )?;

    Ok(Json(RejectRideResponse { status }))
}

/// 完成行程
pub async fn complete_ride(
    State(state): State<DispatchState>,
    Path(ride_id): Path<String>,
    Json(request): Json<RideActionRequest>,
) -> ApiResult<Json<CompleteRideResponse>> {
    ApiError::require("driver_id", &request.driver_id)?;

    let result = state.service.complete_ride(&request.driver_id, &ride_id).await;
    let status = outcome(
        result,
        CompleteRideStatus::RideCompleted,
        CompleteRideStatus::RideNotFound,
    )?;

    Ok(Json(CompleteRideResponse { status }))
}
