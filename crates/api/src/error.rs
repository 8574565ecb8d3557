use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ridehail_core::{DispatchError, ErrorKind};
use serde_json::json;

/// 传输层错误
///
/// 行程状态机的拒绝在处理器中映射为状态字符串并以 200 返回，
/// 只有非法输入和系统故障才会走到这里。
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Dispatch(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::StateConflict | ErrorKind::Timeout => StatusCode::CONFLICT,
                ErrorKind::ResourceExhausted => StatusCode::SERVICE_UNAVAILABLE,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Dispatch(e) => match e.kind() {
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::StateConflict => "STATE_CONFLICT",
                ErrorKind::ResourceExhausted => "RESOURCE_EXHAUSTED",
                ErrorKind::Timeout => "TIMEOUT",
                ErrorKind::Internal => "INTERNAL_ERROR",
            },
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 空ID视为非法输入
    pub fn require(field: &str, value: &str) -> ApiResult<()> {
        if value.trim().is_empty() {
            return Err(ApiError::BadRequest(format!("{field} 不能为空")));
        }
        Ok(())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("请求处理失败: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "error_type": self.error_type(),
            "code": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
