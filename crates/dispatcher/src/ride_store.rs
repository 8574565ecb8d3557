use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use metrics::counter;
use tracing::{debug, info, warn};

use ridehail_core::{DispatchError, DispatchResult};
use ridehail_domain::{Ride, RideRequest, RideStatus};

use crate::driver_registry::DriverRegistry;
use crate::reassignment::{AcceptanceExpired, ReassignmentSupervisor};

/// 行程表与司机占用索引，在同一把锁下维护
#[derive(Default)]
struct RideTable {
    rides: HashMap<String, Ride>,
    /// 司机 -> 其等待确认或进行中的行程
    engaged: HashMap<String, String>,
}

impl RideTable {
    fn ride_mut(&mut self, ride_id: &str) -> DispatchResult<&mut Ride> {
        self.rides
            .get_mut(ride_id)
            .ok_or_else(|| DispatchError::RideNotFound {
                ride_id: ride_id.to_string(),
            })
    }

    fn release_driver(&mut self, driver_id: &str, ride_id: &str) {
        if self.engaged.get(driver_id).map(String::as_str) == Some(ride_id) {
            self.engaged.remove(driver_id);
        }
    }
}

/// 行程存储与状态机
///
/// 所有状态转换在行程表的锁内完成。锁顺序固定为
/// 行程表 -> 司机注册表 / 改派监督器，后两者从不回调行程表。
pub struct RideStore {
    table: Mutex<RideTable>,
    drivers: Arc<DriverRegistry>,
    supervisor: Arc<ReassignmentSupervisor>,
}

impl RideStore {
    pub fn new(drivers: Arc<DriverRegistry>, supervisor: Arc<ReassignmentSupervisor>) -> Self {
        Self {
            table: Mutex::new(RideTable::default()),
            drivers,
            supervisor,
        }
    }

    fn table(&self) -> DispatchResult<MutexGuard<'_, RideTable>> {
        self.table
            .lock()
            .map_err(|_| DispatchError::lock_poisoned("ride table"))
    }

    /// 创建行程并尝试首次指派
    ///
    /// 没有可用司机时行程以 `cancelled` 状态保存，不会自动重试。
    pub fn create_ride(&self, request: RideRequest) -> DispatchResult<Ride> {
        let mut table = self.table()?;
        let mut ride = Ride::new(
            request.rider_id,
            request.pickup_location,
            request.destination,
        );
        counter!("ridehail_rides_requested_total").increment(1);

        let excluding: HashSet<String> = table.engaged.keys().cloned().collect();
        match self.drivers.pick_available(&excluding)? {
            Some(driver_id) => {
                self.supervisor.start_deadline(&ride.id, &driver_id)?;
                table.engaged.insert(driver_id.clone(), ride.id.clone());
                ride.assigned_driver = Some(driver_id);
                ride.status = RideStatus::WaitingForAcceptance;
                counter!("ridehail_rides_assigned_total").increment(1);
                info!(
                    ride_id = %ride.id,
                    rider_id = %ride.rider_id,
                    driver_id = ?ride.assigned_driver,
                    "行程已指派，等待司机确认"
                );
            }
            None => {
                ride.status = RideStatus::Cancelled;
                counter!("ridehail_rides_no_driver_total").increment(1);
                info!(ride_id = %ride.id, rider_id = %ride.rider_id, "没有可用司机");
            }
        }

        ride.touch();
        table.rides.insert(ride.id.clone(), ride.clone());
        Ok(ride)
    }

    /// 司机接单
    pub fn accept_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()> {
        let mut table = self.table()?;
        let ride = table.ride_mut(ride_id)?;
        Self::ensure_pending_for(ride, driver_id)?;

        if !self.supervisor.cancel_deadline(ride_id)? {
            debug!(ride_id, driver_id, "接单晚于超时");
            return Err(DispatchError::AcceptanceExpired {
                ride_id: ride_id.to_string(),
            });
        }

        ride.status = RideStatus::InProgress;
        ride.touch();
        self.drivers.set_busy(driver_id)?;
        counter!("ridehail_rides_accepted_total").increment(1);
        info!(ride_id, driver_id, "司机已接单");
        Ok(())
    }

    /// 司机拒单，立即改派给其他司机
    ///
    /// 返回新指派的司机，没有候选司机时行程被取消并返回 None。
    pub fn reject_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<Option<String>> {
        let mut table = self.table()?;
        let ride = table.ride_mut(ride_id)?;
        Self::ensure_pending_for(ride, driver_id)?;

        if !self.supervisor.cancel_deadline(ride_id)? {
            debug!(ride_id, driver_id, "拒单晚于超时");
            return Err(DispatchError::AcceptanceExpired {
                ride_id: ride_id.to_string(),
            });
        }

        counter!("ridehail_rides_rejected_total").increment(1);
        info!(ride_id, driver_id, "司机拒单");
        self.reassign_locked(&mut table, ride_id, driver_id)
    }

    /// 完成行程，司机恢复空闲
    pub fn complete_ride(&self, driver_id: &str, ride_id: &str) -> DispatchResult<()> {
        let mut table = self.table()?;
        let ride = table.ride_mut(ride_id)?;

        if !ride.is_assigned_to(driver_id) {
            return Err(DispatchError::WrongDriver {
                ride_id: ride_id.to_string(),
                driver_id: driver_id.to_string(),
            });
        }
        // 重复完成（如客户端重试）直接确认，不重复释放司机
        if ride.status == RideStatus::Completed {
            debug!(ride_id, driver_id, "行程已完成，重复确认");
            return Ok(());
        }
        if !ride.status.holds_driver() {
            return Err(DispatchError::InvalidRideState {
                ride_id: ride_id.to_string(),
                status: ride.status.to_string(),
            });
        }
        if ride.status == RideStatus::WaitingForAcceptance
            && !self.supervisor.cancel_deadline(ride_id)?
        {
            return Err(DispatchError::AcceptanceExpired {
                ride_id: ride_id.to_string(),
            });
        }

        ride.status = RideStatus::Completed;
        ride.touch();
        table.release_driver(driver_id, ride_id);
        self.drivers.set_available(driver_id)?;
        counter!("ridehail_rides_completed_total").increment(1);
        info!(ride_id, driver_id, "行程已完成");
        Ok(())
    }

    /// 处理接单超时：仍由同一司机持有时视为拒单并改派
    ///
    /// 事件过期（行程已离开该司机）时返回 `Ok(None)` 且不做任何修改。
    pub fn reassign_after_timeout(
        &self,
        expired: &AcceptanceExpired,
    ) -> DispatchResult<Option<String>> {
        let AcceptanceExpired { ride_id, driver_id } = expired;
        let mut table = self.table()?;

        let still_pending = table
            .rides
            .get(ride_id)
            .map(|ride| {
                ride.status == RideStatus::WaitingForAcceptance && ride.is_assigned_to(driver_id)
            })
            .unwrap_or(false);

        if !still_pending {
            debug!(%ride_id, %driver_id, "超时事件已过期，忽略");
            self.supervisor.discard_expired(ride_id, driver_id)?;
            return Ok(None);
        }

        self.supervisor.discard_expired(ride_id, driver_id)?;
        counter!("ridehail_rides_timed_out_total").increment(1);
        info!(%ride_id, %driver_id, "司机接单超时，开始改派");
        self.reassign_locked(&mut table, ride_id, driver_id)
    }

    /// 把行程从当前司机手中收回并尝试指派下一位司机
    fn reassign_locked(
        &self,
        table: &mut RideTable,
        ride_id: &str,
        previous_driver: &str,
    ) -> DispatchResult<Option<String>> {
        table.release_driver(previous_driver, ride_id);

        let RideTable { rides, engaged } = table;
        let ride = rides
            .get_mut(ride_id)
            .ok_or_else(|| DispatchError::RideNotFound {
                ride_id: ride_id.to_string(),
            })?;

        ride.rejected_drivers.insert(previous_driver.to_string());
        ride.assigned_driver = None;
        ride.status = RideStatus::WaitingForAcceptance;

        let mut excluding = ride.rejected_drivers.clone();
        excluding.extend(engaged.keys().cloned());

        let next = self.drivers.pick_available(&excluding)?;
        match &next {
            Some(driver_id) => {
                self.supervisor.start_deadline(ride_id, driver_id)?;
                engaged.insert(driver_id.clone(), ride_id.to_string());
                ride.assigned_driver = Some(driver_id.clone());
                counter!("ridehail_rides_assigned_total").increment(1);
                info!(ride_id, driver_id = %driver_id, "行程已改派");
            }
            None => {
                ride.status = RideStatus::Cancelled;
                counter!("ridehail_rides_cancelled_total").increment(1);
                warn!(
                    ride_id,
                    rejected = ride.rejected_drivers.len(),
                    "没有其他可用司机，行程已取消"
                );
            }
        }

        ride.touch();
        Ok(next)
    }

    fn ensure_pending_for(ride: &Ride, driver_id: &str) -> DispatchResult<()> {
        // 已接单的行程不能再拒绝，否则进行中的行程会被改派
        if ride.status != RideStatus::WaitingForAcceptance {
            return Err(DispatchError::InvalidRideState {
                ride_id: ride.id.clone(),
                status: ride.status.to_string(),
            });
        }
        if !ride.is_assigned_to(driver_id) {
            return Err(DispatchError::WrongDriver {
                ride_id: ride.id.clone(),
                driver_id: driver_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn ride_status(&self, ride_id: &str) -> DispatchResult<Option<RideStatus>> {
        Ok(self.table()?.rides.get(ride_id).map(|ride| ride.status))
    }

    /// 指派给司机且等待确认的行程
    pub fn assigned_ride(&self, driver_id: &str) -> DispatchResult<Option<Ride>> {
        let table = self.table()?;
        let ride = table
            .engaged
            .get(driver_id)
            .and_then(|ride_id| table.rides.get(ride_id))
            .filter(|ride| ride.status == RideStatus::WaitingForAcceptance)
            .cloned();
        Ok(ride)
    }

    pub fn get(&self, ride_id: &str) -> DispatchResult<Option<Ride>> {
        Ok(self.table()?.rides.get(ride_id).cloned())
    }

    pub fn ride_count(&self) -> DispatchResult<usize> {
        Ok(self.table()?.rides.len())
    }
}
