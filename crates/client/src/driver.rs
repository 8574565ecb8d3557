use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use ridehail_core::{CallAuditor, ClientConfig, DispatchResult};
use ridehail_domain::{
    AcceptRideStatus, AssignedRideResponse, CompleteRideStatus, RejectRideStatus,
};

use crate::dispatch_client::DispatchClient;
use crate::routing_client::RoutingClient;

const ROLE: &str = "driver";

/// 司机对待确认行程的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideDecision {
    Accept,
    Reject,
}

/// 决定是否接单，以及何时结束已接的行程
#[async_trait]
pub trait RideDecider: Send + Sync {
    async fn decide(&self, ride: &AssignedRideResponse) -> RideDecision;

    /// 接单成功后调用，返回时表示行程结束，会话随即调用 CompleteRide
    async fn wait_for_completion(&self, ride: &AssignedRideResponse);
}

/// 总是接单，并在固定时长后结束行程
#[derive(Debug, Clone)]
pub struct AutoAcceptDecider {
    ride_duration: Duration,
}

impl AutoAcceptDecider {
    pub fn new(ride_duration: Duration) -> Self {
        Self { ride_duration }
    }
}

#[async_trait]
impl RideDecider for AutoAcceptDecider {
    async fn decide(&self, _ride: &AssignedRideResponse) -> RideDecision {
        RideDecision::Accept
    }

    async fn wait_for_completion(&self, _ride: &AssignedRideResponse) {
        sleep(self.ride_duration).await;
    }
}

/// 司机会话运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverReport {
    pub server_address: String,
    pub completed_rides: usize,
    pub rejected_rides: usize,
    /// 接单时行程已超时改派
    pub missed_rides: usize,
}

/// 司机会话
///
/// 向负载均衡器获取一次服务器，注册后轮询待确认行程。收到关闭信号后
/// 先在服务器注销，再通知负载均衡器释放名额。
pub struct DriverSession {
    driver_id: String,
    routing: RoutingClient,
    poll_interval: Duration,
    request_timeout: Duration,
    auditor: Option<Arc<dyn CallAuditor>>,
}

impl DriverSession {
    pub fn new(
        driver_id: impl Into<String>,
        routing: RoutingClient,
        poll_interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            driver_id: driver_id.into(),
            routing,
            poll_interval,
            request_timeout,
            auditor: None,
        }
    }

    pub fn from_config(
        driver_id: impl Into<String>,
        config: &ClientConfig,
        auditor: Option<Arc<dyn CallAuditor>>,
    ) -> DispatchResult<Self> {
        let request_timeout = Duration::from_secs(config.request_timeout_seconds);
        let routing = RoutingClient::new(&config.balancer_url, request_timeout, ROLE)?
            .with_auditor(auditor.clone());

        Ok(Self::new(
            driver_id,
            routing,
            Duration::from_secs(config.driver_poll_interval_seconds),
            request_timeout,
        )
        .with_auditor(auditor))
    }

    pub fn with_auditor(mut self, auditor: Option<Arc<dyn CallAuditor>>) -> Self {
        self.auditor = auditor;
        self
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    /// 运行直到收到关闭信号
    ///
    /// 路由或注册失败直接返回错误；注册之后的单次调用失败只记录日志并继续轮询。
    pub async fn run(
        &self,
        decider: &dyn RideDecider,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> DispatchResult<DriverReport> {
        let server_address = self.routing.route_driver(&self.driver_id).await?;
        info!(driver_id = %self.driver_id, server = %server_address, "分配到服务器");

        let client = DispatchClient::new(&server_address, self.request_timeout, ROLE)?
            .with_auditor(self.auditor.clone());

        if let Err(e) = client.register_driver(&self.driver_id).await {
            warn!(driver_id = %self.driver_id, error = %e, "注册失败，释放负载均衡器名额");
            self.exit_balancer(&server_address).await;
            return Err(e);
        }
        info!(driver_id = %self.driver_id, "司机已注册，开始等待行程");

        let mut report = DriverReport {
            server_address: server_address.clone(),
            ..DriverReport::default()
        };

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                result = self.poll_once(&client, decider, &mut report) => {
                    if let Err(e) = result {
                        warn!(driver_id = %self.driver_id, error = %e, "处理行程失败");
                    }
                }
            }

            tokio::select! {
                _ = shutdown.recv() => break,
                _ = sleep(self.poll_interval) => {}
            }
        }

        info!(driver_id = %self.driver_id, "收到关闭信号，开始注销");
        if let Err(e) = client.unregister_driver(&self.driver_id).await {
            warn!(driver_id = %self.driver_id, error = %e, "在服务器注销失败");
        }
        self.exit_balancer(&server_address).await;

        Ok(report)
    }

    async fn exit_balancer(&self, server_address: &str) {
        match self.routing.driver_exit(&self.driver_id, server_address).await {
            Ok(response) => info!(driver_id = %self.driver_id, status = %response.status, "已通知负载均衡器"),
            Err(e) => warn!(driver_id = %self.driver_id, error = %e, "通知负载均衡器失败"),
        }
    }

    async fn poll_once(
        &self,
        client: &DispatchClient,
        decider: &dyn RideDecider,
        report: &mut DriverReport,
    ) -> DispatchResult<()> {
        let ride = client.assigned_ride(&self.driver_id).await?;
        if !ride.is_assigned() {
            debug!(driver_id = %self.driver_id, "暂无待确认行程");
            return Ok(());
        }

        info!(
            driver_id = %self.driver_id,
            ride_id = %ride.ride_id,
            pickup = %ride.pickup_location,
            destination = %ride.destination,
            "收到行程"
        );

        match decider.decide(&ride).await {
            RideDecision::Reject => {
                let response = client.reject_ride(&self.driver_id, &ride.ride_id).await?;
                if response.status == RejectRideStatus::RideRejected {
                    report.rejected_rides += 1;
                    info!(ride_id = %ride.ride_id, "已拒单");
                } else {
                    report.missed_rides += 1;
                    info!(ride_id = %ride.ride_id, "拒单时行程已不再指派给本司机");
                }
            }
            RideDecision::Accept => {
                let response = client.accept_ride(&self.driver_id, &ride.ride_id).await?;
                if response.status != AcceptRideStatus::RideAccepted {
                    report.missed_rides += 1;
                    info!(ride_id = %ride.ride_id, "接单失败，行程可能已超时改派");
                    return Ok(());
                }

                info!(ride_id = %ride.ride_id, "已接单");
                decider.wait_for_completion(&ride).await;

                let response = client.complete_ride(&self.driver_id, &ride.ride_id).await?;
                if response.status == CompleteRideStatus::RideCompleted {
                    report.completed_rides += 1;
                    info!(ride_id = %ride.ride_id, "行程已完成");
                } else {
                    warn!(ride_id = %ride.ride_id, "完成行程失败");
                }
            }
        }

        Ok(())
    }
}
