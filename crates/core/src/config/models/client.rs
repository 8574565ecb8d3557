use serde::{Deserialize, Serialize};

/// 乘客端和司机端的配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub balancer_url: String,
    pub driver_poll_interval_seconds: u64,
    pub rider_poll_interval_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            balancer_url: "http://127.0.0.1:4000".to_string(),
            driver_poll_interval_seconds: 2,
            rider_poll_interval_seconds: 3,
            request_timeout_seconds: 10,
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.balancer_url.starts_with("http://") && !self.balancer_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "负载均衡器URL必须以http://或https://开头: {}",
                self.balancer_url
            ));
        }

        if self.driver_poll_interval_seconds == 0 || self.rider_poll_interval_seconds == 0 {
            return Err(anyhow::anyhow!("轮询间隔必须大于0"));
        }

        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }

        Ok(())
    }
}
