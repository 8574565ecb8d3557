use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 负载均衡器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancerConfig {
    pub bind_address: String,
    /// 后端派单服务器地址，顺序即轮询顺序
    pub servers: Vec<String>,
    pub max_concurrent_requests: usize,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            servers: vec![
                "127.0.0.1:5001".to_string(),
                "127.0.0.1:5002".to_string(),
                "127.0.0.1:5003".to_string(),
            ],
            max_concurrent_requests: 10,
        }
    }
}

impl BalancerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("负载均衡器监听地址不能为空"));
        }

        if self.servers.is_empty() {
            return Err(anyhow::anyhow!("至少需要配置一个后端服务器"));
        }

        let mut seen = HashSet::new();
        for server in &self.servers {
            if server.trim().is_empty() {
                return Err(anyhow::anyhow!("后端服务器地址不能为空"));
            }
            if !seen.insert(server.as_str()) {
                return Err(anyhow::anyhow!("后端服务器地址重复: {}", server));
            }
        }

        if self.max_concurrent_requests == 0 {
            return Err(anyhow::anyhow!("最大并发请求数必须大于0"));
        }

        Ok(())
    }
}
