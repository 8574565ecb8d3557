use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use metrics::{counter, gauge};
use tracing::{info, warn};

use ridehail_core::{DispatchError, DispatchResult};
use ridehail_domain::RoutingService;

use crate::pool::ServerPool;

/// 负载均衡器
///
/// 服务器池的游标和司机计数由同一把锁保护，每次路由在一个临界区内完成。
pub struct LoadBalancer {
    pool: Mutex<ServerPool>,
}

impl LoadBalancer {
    pub fn new(addresses: Vec<String>) -> DispatchResult<Self> {
        let pool = ServerPool::new(addresses)?;
        for address in pool.addresses() {
            gauge!("ridehail_server_drivers", "server" => address.clone()).set(0.0);
        }
        info!(servers = ?pool.addresses(), "负载均衡器已创建");
        Ok(Self {
            pool: Mutex::new(pool),
        })
    }

    fn pool(&self) -> DispatchResult<MutexGuard<'_, ServerPool>> {
        self.pool
            .lock()
            .map_err(|_| DispatchError::lock_poisoned("server pool"))
    }

    /// 乘客路由：完整的服务器列表，从当前游标开始
    pub fn next_rider_servers(&self) -> DispatchResult<Vec<String>> {
        Ok(self.pool()?.rotate())
    }

    /// 司机路由：司机数最少的服务器，计数在同一临界区内递增
    pub fn assign_driver_server(&self) -> DispatchResult<String> {
        let (address, count) = self.pool()?.assign_least_loaded();
        gauge!("ridehail_server_drivers", "server" => address.clone()).set(count as f64);
        Ok(address)
    }

    /// 释放服务器上的一个司机名额
    pub fn release_driver_slot(&self, address: &str) -> DispatchResult<usize> {
        let count = self.pool()?.release(address)?;
        gauge!("ridehail_server_drivers", "server" => address.to_string()).set(count as f64);
        Ok(count)
    }

    pub fn driver_count(&self, address: &str) -> DispatchResult<usize> {
        self.pool()?.driver_count(address)
    }

    pub fn loads(&self) -> DispatchResult<Vec<(String, usize)>> {
        Ok(self.pool()?.loads())
    }

    pub fn addresses(&self) -> DispatchResult<Vec<String>> {
        Ok(self.pool()?.addresses().to_vec())
    }
}

#[async_trait]
impl RoutingService for LoadBalancer {
    async fn route_rider(&self, rider_id: &str) -> DispatchResult<Vec<String>> {
        let servers = self.next_rider_servers()?;
        counter!("ridehail_rider_routes_total").increment(1);
        info!(rider_id, servers = ?servers, "为乘客分配服务器列表");
        Ok(servers)
    }

    async fn route_driver(&self, driver_id: &str) -> DispatchResult<String> {
        let server = self.assign_driver_server()?;
        counter!("ridehail_driver_routes_total").increment(1);
        info!(driver_id, server = %server, "为司机分配服务器");
        Ok(server)
    }

    async fn release_driver(&self, driver_id: &str, server_address: &str) -> DispatchResult<()> {
        match self.release_driver_slot(server_address) {
            Ok(remaining) => {
                info!(driver_id, server = server_address, remaining, "司机已退出");
                Ok(())
            }
            Err(DispatchError::UnknownServer { address }) => {
                warn!(driver_id, server = %address, "司机退出时提供了未知的服务器地址，忽略");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
