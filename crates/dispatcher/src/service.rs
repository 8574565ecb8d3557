use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use ridehail_core::DispatchResult;
use ridehail_domain::{Ride, RideDispatchService, RideRequest, RideResponse, RideStatus};

use crate::driver_registry::DriverRegistry;
use crate::reassignment::{AcceptanceExpired, ReassignmentSupervisor};
use crate::ride_store::RideStore;
use crate::strategies::{DriverSelectionStrategy, RandomSelectionStrategy};

/// 派单服务门面
///
/// 组装司机注册表、行程存储和改派监督器，并在后台消费超时事件。
/// 必须在 Tokio 运行时中创建。
pub struct RideDispatcher {
    drivers: Arc<DriverRegistry>,
    rides: Arc<RideStore>,
    supervisor: Arc<ReassignmentSupervisor>,
    expiry_listener: JoinHandle<()>,
}

impl RideDispatcher {
    pub fn new(acceptance_timeout: Duration) -> Self {
        Self::with_strategy(acceptance_timeout, Arc::new(RandomSelectionStrategy::new()))
    }

    pub fn with_strategy(
        acceptance_timeout: Duration,
        strategy: Arc<dyn DriverSelectionStrategy>,
    ) -> Self {
        let drivers = Arc::new(DriverRegistry::with_strategy(strategy));
        let (supervisor, expired_rx) = ReassignmentSupervisor::new(acceptance_timeout);
        let supervisor = Arc::new(supervisor);
        let rides = Arc::new(RideStore::new(
            Arc::clone(&drivers),
            Arc::clone(&supervisor),
        ));

        let expiry_listener = tokio::spawn(Self::listen_for_expiry(
            Arc::clone(&rides),
            expired_rx,
        ));

        info!(
            timeout = ?acceptance_timeout,
            strategy = drivers.strategy_name(),
            "派单服务已创建"
        );

        Self {
            drivers,
            rides,
            supervisor,
            expiry_listener,
        }
    }

    async fn listen_for_expiry(
        rides: Arc<RideStore>,
        mut expired_rx: mpsc::UnboundedReceiver<AcceptanceExpired>,
    ) {
        while let Some(expired) = expired_rx.recv().await {
            match rides.reassign_after_timeout(&expired) {
                Ok(Some(next)) => debug!(
                    ride_id = %expired.ride_id,
                    driver_id = %next,
                    "超时改派完成"
                ),
                Ok(None) => {}
                Err(e) => error!(ride_id = %expired.ride_id, "处理接单超时失败: {}", e),
            }
        }
        debug!("超时事件监听已结束");
    }

    pub fn drivers(&self) -> &Arc<DriverRegistry> {
        &self.drivers
    }

    pub fn rides(&self) -> &Arc<RideStore> {
        &self.rides
    }

    pub fn acceptance_timeout(&self) -> Duration {
        self.supervisor.timeout()
    }

    /// 停止启动新的接单计时，放弃进行中的计时
    pub fn shutdown(&self) -> DispatchResult<()> {
        let abandoned = self.supervisor.shutdown()?;
        self.expiry_listener.abort();
        info!(
            abandoned,
            rides = self.rides.ride_count()?,
            drivers = self.drivers.driver_count()?,
            available = self.drivers.available_count()?,
            "派单服务已停止"
        );
        Ok(())
    }
}

impl Drop for RideDispatcher {
    fn drop(&mut self) {
        self.expiry_listener.abort();
    }
}

#[async_trait]
impl RideDispatchService for RideDispatcher {
    async fn request_ride(&self, request: RideRequest) -> DispatchResult<RideResponse> {
        let ride = self.rides.create_ride(request)?;
        let response = match (ride.status, ride.assigned_driver) {
            (RideStatus::WaitingForAcceptance, Some(driver_id)) => {
                RideResponse::assigned(ride.id, driver_id)
            }
            _ => RideResponse::no_drivers_available(),
        };
        Ok(response)
    }

    async fn register_driver(&self, driver_id: &str) -> DispatchResult<()> {
        self.drivers.register(driver_id)
    }

    async fn unregister_driver(&self, driver_id: &str) -> DispatchResult<()> {
        self.drivers.unregister(driver_id)?;
        Ok(())
    }

    async fn assigned_ride(&self, driver_id: &str) -> DispatchResult<Option<Ride>> {
        self.rides.assigned_ride(driver_id)
    }

    async fn accept_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()> {
        self.rides.accept_ride(driver_id, ride_id)
    }

    async fn reject_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()> {
        self.rides.reject_ride(driver_id, ride_id)?;
        Ok(())
    }

    async fn complete_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()> {
        self.rides.complete_ride(driver_id, ride_id)
    }

    async fn ride_status(&self, ride_id: &str) -> DispatchResult<Option<RideStatus>> {
        self.rides.ride_status(ride_id)
    }
}
