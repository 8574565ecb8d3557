use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use ridehail_core::{CallAuditor, ClientConfig, DispatchResult};
use ridehail_domain::{RideRequest, RideRequestStatus, RideStatus};

use crate::dispatch_client::DispatchClient;
use crate::routing_client::RoutingClient;

const ROLE: &str = "rider";

/// 一次叫车的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RideOutcome {
    Completed {
        ride_id: String,
        server_address: String,
    },
    /// 所有服务器都没有可用司机，或行程都被取消
    NoDriversAvailable,
    /// 收到关闭信号
    Interrupted,
}

enum RideProgress {
    Completed,
    Cancelled,
    Interrupted,
}

/// 乘客会话
///
/// 从负载均衡器获取服务器列表后依次尝试，直到某个服务器完成行程。
pub struct RiderSession {
    routing: RoutingClient,
    poll_interval: Duration,
    request_timeout: Duration,
    auditor: Option<Arc<dyn CallAuditor>>,
}

impl RiderSession {
    pub fn new(routing: RoutingClient, poll_interval: Duration, request_timeout: Duration) -> Self {
        Self {
            routing,
            poll_interval,
            request_timeout,
            auditor: None,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        auditor: Option<Arc<dyn CallAuditor>>,
    ) -> DispatchResult<Self> {
        let request_timeout = Duration::from_secs(config.request_timeout_seconds);
        let routing = RoutingClient::new(&config.balancer_url, request_timeout, ROLE)?
            .with_auditor(auditor.clone());

        Ok(Self::new(
            routing,
            Duration::from_secs(config.rider_poll_interval_seconds),
            request_timeout,
        )
        .with_auditor(auditor))
    }

    pub fn with_auditor(mut self, auditor: Option<Arc<dyn CallAuditor>>) -> Self {
        self.auditor = auditor;
        self
    }

    /// 叫车并等待行程结束
    ///
    /// 只有获取服务器列表失败会返回错误，单个服务器的故障会跳到下一个服务器。
    pub async fn request_ride(
        &self,
        request: RideRequest,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> DispatchResult<RideOutcome> {
        let servers = self.routing.route_rider(&request.rider_id).await?;
        info!(rider_id = %request.rider_id, servers = ?servers, "获取服务器列表");

        for address in &servers {
            let client = DispatchClient::new(address, self.request_timeout, ROLE)?
                .with_auditor(self.auditor.clone());

            let response = match client.request_ride(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(server = %address, error = %e, "请求行程失败，尝试下一个服务器");
                    continue;
                }
            };

            if response.status == RideRequestStatus::NoDriversAvailable {
                info!(server = %address, "服务器没有可用司机，尝试下一个服务器");
                continue;
            }

            info!(
                server = %address,
                ride_id = %response.ride_id,
                driver_id = %response.assigned_driver,
                "行程已指派，等待司机"
            );

            match self.follow_ride(&client, &response.ride_id, shutdown).await {
                RideProgress::Completed => {
                    info!(ride_id = %response.ride_id, "行程已完成");
                    return Ok(RideOutcome::Completed {
                        ride_id: response.ride_id,
                        server_address: address.clone(),
                    });
                }
                RideProgress::Cancelled => {
                    info!(ride_id = %response.ride_id, "行程已取消，尝试下一个服务器");
                }
                RideProgress::Interrupted => {
                    info!(ride_id = %response.ride_id, "收到关闭信号，停止等待行程");
                    return Ok(RideOutcome::Interrupted);
                }
            }
        }

        info!(rider_id = %request.rider_id, "所有服务器都没有可用司机");
        Ok(RideOutcome::NoDriversAvailable)
    }

    async fn follow_ride(
        &self,
        client: &DispatchClient,
        ride_id: &str,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> RideProgress {
        loop {
            tokio::select! {
                _ = shutdown.recv() => return RideProgress::Interrupted,
                _ = sleep(self.poll_interval) => {}
            }

            let response = match client.ride_status(ride_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(ride_id, error = %e, "查询行程状态失败");
                    return RideProgress::Cancelled;
                }
            };

            match response.ride_status() {
                Some(RideStatus::Completed) => return RideProgress::Completed,
                Some(RideStatus::Cancelled) => return RideProgress::Cancelled,
                Some(status) => debug!(ride_id, %status, "行程进行中"),
                None => {
                    warn!(ride_id, "服务器找不到该行程");
                    return RideProgress::Cancelled;
                }
            }
        }
    }
}
