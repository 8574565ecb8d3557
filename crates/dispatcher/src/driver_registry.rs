use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use ridehail_core::{DispatchError, DispatchResult};
use ridehail_domain::DriverStatus;

use crate::strategies::{DriverSelectionStrategy, RandomSelectionStrategy};

/// 司机注册表
///
/// 只记录司机身份和空闲/忙碌状态，不感知行程。
pub struct DriverRegistry {
    drivers: Mutex<HashMap<String, DriverStatus>>,
    strategy: Arc<dyn DriverSelectionStrategy>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::with_strategy(Arc::new(RandomSelectionStrategy::new()))
    }

    pub fn with_strategy(strategy: Arc<dyn DriverSelectionStrategy>) -> Self {
        Self {
            drivers: Mutex::new(HashMap::new()),
            strategy,
        }
    }

    fn drivers(&self) -> DispatchResult<MutexGuard<'_, HashMap<String, DriverStatus>>> {
        self.drivers
            .lock()
            .map_err(|_| DispatchError::lock_poisoned("driver registry"))
    }

    /// 注册司机，已存在时重置为空闲
    pub fn register(&self, driver_id: &str) -> DispatchResult<()> {
        let previous = self
            .drivers()?
            .insert(driver_id.to_string(), DriverStatus::Available);

        match previous {
            Some(status) => info!(driver_id, ?status, "司机重新注册，状态重置为空闲"),
            None => info!(driver_id, "司机已注册"),
        }
        Ok(())
    }

    /// 注销司机，返回司机之前是否存在
    pub fn unregister(&self, driver_id: &str) -> DispatchResult<bool> {
        let removed = self.drivers()?.remove(driver_id).is_some();
        if removed {
            info!(driver_id, "司机已注销");
        } else {
            debug!(driver_id, "注销未注册的司机，忽略");
        }
        Ok(removed)
    }

    pub fn set_busy(&self, driver_id: &str) -> DispatchResult<()> {
        self.set_status(driver_id, DriverStatus::Busy)
    }

    pub fn set_available(&self, driver_id: &str) -> DispatchResult<()> {
        self.set_status(driver_id, DriverStatus::Available)
    }

    // 司机可能已经中途断开，不存在时静默忽略
    fn set_status(&self, driver_id: &str, status: DriverStatus) -> DispatchResult<()> {
        if let Some(current) = self.drivers()?.get_mut(driver_id) {
            *current = status;
            debug!(driver_id, ?status, "司机状态已更新");
        } else {
            debug!(driver_id, ?status, "司机不存在，跳过状态更新");
        }
        Ok(())
    }

    /// 选择一个空闲且不在排除集合中的司机
    pub fn pick_available(&self, excluding: &HashSet<String>) -> DispatchResult<Option<String>> {
        let drivers = self.drivers()?;
        Ok(self.strategy.select_driver(&drivers, excluding))
    }

    pub fn status(&self, driver_id: &str) -> DispatchResult<Option<DriverStatus>> {
        Ok(self.drivers()?.get(driver_id).copied())
    }

    pub fn available_count(&self) -> DispatchResult<usize> {
        Ok(self
            .drivers()?
            .values()
            .filter(|s| **s == DriverStatus::Available)
            .count())
    }

    pub fn driver_count(&self) -> DispatchResult<usize> {
        Ok(self.drivers()?.len())
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}
