use async_trait::async_trait;

/// 调用审计钩子
///
/// 在每次RPC调用分发前后被调用，`role` 标识调用方或服务方角色
/// （`server`、`load_balancer`、`rider`、`driver`）。
/// 审计失败不会影响调用结果，实现方自行处理内部错误。
#[async_trait]
pub trait CallAuditor: Send + Sync {
    /// 调用分发前
    async fn before_call(&self, role: &str, method: &str, request: &str);

    /// 调用完成后
    async fn after_call(&self, role: &str, method: &str, response: &str);
}

/// 不做任何记录的审计实现
#[derive(Debug, Clone, Default)]
pub struct NoopAuditor;

#[async_trait]
impl CallAuditor for NoopAuditor {
    async fn before_call(&self, _role: &str, _method: &str, _request: &str) {}

    async fn after_call(&self, _role: &str, _method: &str, _response: &str) {}
}
