//! # Ridehail API
//!
//! 派单服务与负载均衡路由服务的 HTTP/JSON 接口。
//!
//! ## 派单服务（每个后端服务器）
//! - `POST /api/v1/rides` - 创建行程
//! - `GET /api/v1/rides/{ride_id}/status` - 行程状态
//! - `POST /api/v1/rides/{ride_id}/accept` - 接单
//! - `POST /api/v1/rides/{ride_id}/reject` - 拒单
//! - `POST /api/v1/rides/{ride_id}/complete` - 完成行程
//! - `POST /api/v1/drivers` - 注册司机
//! - `DELETE /api/v1/drivers/{driver_id}` - 注销司机
//! - `GET /api/v1/drivers/{driver_id}/assigned-ride` - 待确认行程
//!
//! ## 路由服务（负载均衡器）
//! - `POST /api/v1/route/rider` - 乘客服务器列表
//! - `POST /api/v1/route/driver` - 司机服务器
//! - `POST /api/v1/route/driver-exit` - 司机退出
//!
//! 业务结果一律返回 200 和状态字段，空ID返回 400，系统故障返回 500。
//!
//! ## 中间件
//! - **追踪**: `tower-http` TraceLayer
//! - **日志记录**: 请求方法、路径、状态和耗时
//! - **并发限制**: 全局并发上限，对应服务器的工作线程池
//! - **审计**: 可选，调用前后通知 [`ridehail_core::CallAuditor`]

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::Router;
use std::sync::Arc;
use tower::{limit::GlobalConcurrencyLimitLayer, ServiceBuilder};

use middleware::{audit_calls, request_logging, trace_layer, AuditState};
use ridehail_core::CallAuditor;
use ridehail_domain::{RideDispatchService, RoutingService};
use routes::{create_dispatch_routes, create_routing_routes, DispatchState, RoutingState};

/// 默认并发请求上限
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 10;

/// 应用层选项
#[derive(Clone)]
pub struct ApiOptions {
    pub max_concurrent_requests: usize,
    pub auditor: Option<Arc<dyn CallAuditor>>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            auditor: None,
        }
    }
}

/// 创建派单服务应用
pub fn create_dispatch_app(service: Arc<dyn RideDispatchService>, options: ApiOptions) -> Router {
    let router = create_dispatch_routes(DispatchState { service });
    with_layers(router, "server", options)
}

/// 创建负载均衡路由服务应用
pub fn create_routing_app(service: Arc<dyn RoutingService>, options: ApiOptions) -> Router {
    let router = create_routing_routes(RoutingState { service });
    with_layers(router, "load_balancer", options)
}

fn with_layers(router: Router, role: &'static str, options: ApiOptions) -> Router {
    let router = match options.auditor {
        Some(auditor) => router.layer(axum::middleware::from_fn_with_state(
            AuditState { auditor, role },
            audit_calls,
        )),
        None => router,
    };

    router.layer(
        ServiceBuilder::new()
            .layer(trace_layer())
            .layer(axum::middleware::from_fn(request_logging))
            .layer(GlobalConcurrencyLimitLayer::new(
                options.max_concurrent_requests.max(1),
            )),
    )
}
