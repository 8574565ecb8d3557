use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use ridehail_core::CallAuditor;

use crate::error::ApiError;
use crate::routes::rpc_method_name;

/// 审计时缓冲的请求/响应体上限
const MAX_AUDITED_BODY_BYTES: usize = 1024 * 1024;

pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    info!("开始处理请求: {} {}", method, uri);

    let response = next.run(request).await;
    let duration = start.elapsed();

    info!(
        "完成请求处理: {} {} - 状态: {} - 耗时: {:?}",
        method,
        uri,
        response.status(),
        duration
    );

    response
}

pub fn trace_layer(
) -> TraceLayer<tower_http::classify::SharedClassifier<tower_http::classify::ServerErrorsAsFailures>>
{
    TraceLayer::new_for_http()
}

/// 审计中间件状态
#[derive(Clone)]
pub struct AuditState {
    pub auditor: Arc<dyn CallAuditor>,
    /// `server` 或 `load_balancer`
    pub role: &'static str,
}

/// 在每次调用前后通知审计钩子
///
/// 请求体和响应体会被完整缓冲后原样转发。未映射到RPC方法的路由（如健康检查）不审计。
pub async fn audit_calls(
    State(audit): State<AuditState>,
    request: Request,
    next: Next,
) -> Response {
    let method_name = request
        .extensions()
        .get::<MatchedPath>()
        .and_then(|path| rpc_method_name(request.method(), path.as_str()));

    let Some(method_name) = method_name else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let request_bytes = match to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return ApiError::BadRequest(format!("读取请求体失败: {e}")).into_response(),
    };

    let request_payload = if request_bytes.is_empty() {
        parts.uri.path().to_string()
    } else {
        String::from_utf8_lossy(&request_bytes).into_owned()
    };
    audit
        .auditor
        .before_call(audit.role, method_name, &request_payload)
        .await;

    let response = next
        .run(Request::from_parts(parts, Body::from(request_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let response_bytes = match to_bytes(body, MAX_AUDITED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => return ApiError::Internal(format!("读取响应体失败: {e}")).into_response(),
    };

    audit
        .auditor
        .after_call(
            audit.role,
            method_name,
            &String::from_utf8_lossy(&response_bytes),
        )
        .await;

    Response::from_parts(parts, Body::from(response_bytes))
}
