use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use ridehail_core::{CallAuditor, DispatchError, DispatchResult};

/// 把 `host:port` 形式的服务器地址转换为基础URL
pub fn server_url(address: &str) -> String {
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{address}")
    }
}

/// JSON over HTTP 的调用通道，负责URL拼接、审计和响应解码
#[derive(Clone)]
pub(crate) struct JsonTransport {
    base_url: Url,
    http_client: Client,
    auditor: Option<Arc<dyn CallAuditor>>,
    role: &'static str,
}

impl JsonTransport {
    pub(crate) fn new(base_url: &str, timeout: Duration, role: &'static str) -> DispatchResult<Self> {
        let base_url = Url::parse(&server_url(base_url))
            .map_err(|e| DispatchError::Configuration(format!("无效的服务地址 {base_url}: {e}")))?;

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Configuration(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            base_url,
            http_client,
            auditor: None,
            role,
        })
    }

    pub(crate) fn with_auditor(mut self, auditor: Option<Arc<dyn CallAuditor>>) -> Self {
        self.auditor = auditor;
        self
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 按路径段拼接URL，路径段会被百分号编码
    fn url(&self, segments: &[&str]) -> DispatchResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DispatchError::Configuration(format!("服务地址不能作为基础URL: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) async fn get<R: DeserializeOwned>(
        &self,
        rpc: &str,
        segments: &[&str],
    ) -> DispatchResult<R> {
        let url = self.url(segments)?;
        let payload = url.path().to_string();
        self.send(rpc, self.http_client.get(url), payload).await
    }

    pub(crate) async fn delete<R: DeserializeOwned>(
        &self,
        rpc: &str,
        segments: &[&str],
    ) -> DispatchResult<R> {
        let url = self.url(segments)?;
        let payload = url.path().to_string();
        self.send(rpc, self.http_client.delete(url), payload).await
    }

    pub(crate) async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        rpc: &str,
        segments: &[&str],
        body: &B,
    ) -> DispatchResult<R> {
        let url = self.url(segments)?;
        let payload = serde_json::to_string(body)?;
        let request = self
            .http_client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.clone());
        self.send(rpc, request, payload).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        rpc: &str,
        request: RequestBuilder,
        payload: String,
    ) -> DispatchResult<R> {
        if let Some(auditor) = &self.auditor {
            auditor.before_call(self.role, rpc, &payload).await;
        }

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::Network(format!("{rpc} 调用 {} 失败: {e}", self.base_url)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::Network(format!("{rpc} 读取响应失败: {e}")))?;

        if let Some(auditor) = &self.auditor {
            auditor.after_call(self.role, rpc, &body).await;
        }

        if !status.is_success() {
            return Err(DispatchError::Network(format!(
                "{rpc} 返回 HTTP {status}: {body}"
            )));
        }

        debug!(rpc, response = %body, "调用完成");
        Ok(serde_json::from_str(&body)?)
    }
}
