use serde::{Deserialize, Serialize};

/// 单个派单服务器的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// 司机接单时限（秒），到期后自动改派
    pub acceptance_timeout_seconds: u64,
    /// 同时处理的最大请求数
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5001".to_string(),
            acceptance_timeout_seconds: 10,
            max_concurrent_requests: 10,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("服务器监听地址不能为空"));
        }

        if self.acceptance_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("接单时限必须大于0"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("最大并发请求数必须大于0"));
        }

        Ok(())
    }

    pub fn acceptance_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.acceptance_timeout_seconds)
    }
}
