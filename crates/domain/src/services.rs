//! # 服务接口
//!
//! 网络层只依赖这里定义的接口：每个后端服务器暴露一个 [`RideDispatchService`]，
//! 负载均衡器暴露一个 [`RoutingService`]。实现分别位于 `ridehail-dispatcher`
//! 和 `ridehail-balancer`。

use async_trait::async_trait;
use ridehail_core::DispatchResult;

use crate::entities::{Ride, RideStatus};
use crate::messages::{RideRequest, RideResponse};

/// 行程派单服务
#[async_trait]
pub trait RideDispatchService: Send + Sync {
    /// 创建行程并尝试首次指派
    async fn request_ride(&self, request: RideRequest) -> DispatchResult<RideResponse>;

    /// 注册司机（重复注册会重置为空闲）
    async fn register_driver(&self, driver_id: &str) -> DispatchResult<()>;

    /// 注销司机，不影响已指派的行程
    async fn unregister_driver(&self, driver_id: &str) -> DispatchResult<()>;

    /// 查询指派给司机、等待确认的行程
    async fn assigned_ride(&self, driver_id: &str) -> DispatchResult<Option<Ride>>;

    async fn accept_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()>;

    async fn reject_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()>;

    async fn complete_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()>;

    /// 行程状态，不存在时返回 None
    async fn ride_status(&self, ride_id: &str) -> DispatchResult<Option<RideStatus>>;
}

/// 负载均衡路由服务
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// 乘客：按轮询顺序返回全部服务器
    async fn route_rider(&self, rider_id: &str) -> DispatchResult<Vec<String>>;

    /// 司机：返回当前司机数最少的服务器并计数
    async fn route_driver(&self, driver_id: &str) -> DispatchResult<String>;

    /// 司机退出：释放服务器上的司机计数
    async fn release_driver(&self, driver_id: &str, server_address: &str) -> DispatchResult<()>;
}
