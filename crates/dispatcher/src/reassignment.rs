use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ridehail_core::{DispatchError, DispatchResult};

/// 默认接单时限
pub const DEFAULT_ACCEPTANCE_TIMEOUT: Duration = Duration::from_secs(10);

/// 接单时限到期事件，由派单服务消费并触发改派
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceExpired {
    pub ride_id: String,
    pub driver_id: String,
}

/// 一个行程当前等待确认的司机及其计时器
struct PendingAcceptance {
    driver_id: String,
    /// 接单、拒单、超时三者之一置位后，其余两方都视为失败
    resolved: Arc<AtomicBool>,
    timer: JoinHandle<()>,
}

impl PendingAcceptance {
    /// 尝试以调用方身份结束等待，成功时停止计时器
    fn resolve(&self) -> bool {
        let won = !self.resolved.swap(true, Ordering::AcqRel);
        if won {
            self.timer.abort();
        }
        won
    }
}

/// 改派监督器
///
/// 为每个等待确认的行程维护一个可取消的计时器。计时器在锁外休眠，
/// 到期后只发送 [`AcceptanceExpired`] 事件，不直接修改行程。
/// 计时器依赖 Tokio 运行时，必须在运行时上下文中调用 `start_deadline`。
pub struct ReassignmentSupervisor {
    timeout: Duration,
    pending: Mutex<HashMap<String, PendingAcceptance>>,
    expired_tx: mpsc::UnboundedSender<AcceptanceExpired>,
    shutting_down: AtomicBool,
}

impl ReassignmentSupervisor {
    pub fn new(timeout: Duration) -> (Self, mpsc::UnboundedReceiver<AcceptanceExpired>) {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        let supervisor = Self {
            timeout,
            pending: Mutex::new(HashMap::new()),
            expired_tx,
            shutting_down: AtomicBool::new(false),
        };
        (supervisor, expired_rx)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn pending(&self) -> DispatchResult<MutexGuard<'_, HashMap<String, PendingAcceptance>>> {
        self.pending
            .lock()
            .map_err(|_| DispatchError::lock_poisoned("pending acceptances"))
    }

    /// 为行程启动接单计时，替换该行程之前的计时
    pub fn start_deadline(&self, ride_id: &str, driver_id: &str) -> DispatchResult<()> {
        // 关闭标志在计时表锁内检查，与 shutdown 的清空互斥
        let mut pending = self.pending()?;
        if self.shutting_down.load(Ordering::Acquire) {
            warn!(ride_id, driver_id, "正在关闭，不再启动接单计时");
            return Ok(());
        }

        let resolved = Arc::new(AtomicBool::new(false));
        let timer = {
            let resolved = Arc::clone(&resolved);
            let expired_tx = self.expired_tx.clone();
            let event = AcceptanceExpired {
                ride_id: ride_id.to_string(),
                driver_id: driver_id.to_string(),
            };
            let timeout = self.timeout;

            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                if resolved.swap(true, Ordering::AcqRel) {
                    return;
                }
                info!(
                    ride_id = %event.ride_id,
                    driver_id = %event.driver_id,
                    "司机未在时限内响应"
                );
                if expired_tx.send(event).is_err() {
                    debug!("超时事件接收方已关闭");
                }
            })
        };

        let previous = pending.insert(
            ride_id.to_string(),
            PendingAcceptance {
                driver_id: driver_id.to_string(),
                resolved,
                timer,
            },
        );
        if let Some(previous) = previous {
            previous.resolve();
        }

        debug!(ride_id, driver_id, timeout = ?self.timeout, "接单计时已启动");
        Ok(())
    }

    /// 取消行程的接单计时
    ///
    /// 返回 `true` 表示调用方赢得了该行程（计时器尚未触发或不存在）；
    /// 返回 `false` 表示计时器已经触发，调用方应视为状态冲突。
    /// 不等待计时任务结束。
    pub fn cancel_deadline(&self, ride_id: &str) -> DispatchResult<bool> {
        let Some(pending) = self.pending()?.remove(ride_id) else {
            return Ok(true);
        };

        let won = pending.resolve();
        if won {
            debug!(ride_id, driver_id = %pending.driver_id, "接单计时已取消");
        } else {
            debug!(ride_id, driver_id = %pending.driver_id, "接单计时已先行触发");
        }
        Ok(won)
    }

    /// 清除已触发的计时记录（仅当记录仍属于该司机时）
    pub fn discard_expired(&self, ride_id: &str, driver_id: &str) -> DispatchResult<()> {
        let mut pending = self.pending()?;
        let matches = pending
            .get(ride_id)
            .map(|p| p.driver_id == driver_id && p.resolved.load(Ordering::Acquire))
            .unwrap_or(false);
        if matches {
            pending.remove(ride_id);
        }
        Ok(())
    }

    pub fn is_pending(&self, ride_id: &str) -> DispatchResult<bool> {
        Ok(self
            .pending()?
            .get(ride_id)
            .map(|p| !p.resolved.load(Ordering::Acquire))
            .unwrap_or(false))
    }

    pub fn pending_count(&self) -> DispatchResult<usize> {
        Ok(self
            .pending()?
            .values()
            .filter(|p| !p.resolved.load(Ordering::Acquire))
            .count())
    }

    /// 停止启动新的计时，并放弃所有进行中的计时
    pub fn shutdown(&self) -> DispatchResult<usize> {
        let mut pending = self.pending()?;
        self.shutting_down.store(true, Ordering::Release);

        let abandoned = pending
            .drain()
            .filter(|(_, pending)| pending.resolve())
            .count();

        info!(abandoned, "改派监督器已停止");
        Ok(abandoned)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}
