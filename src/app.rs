use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};

use ridehail_api::{create_dispatch_app, create_routing_app, ApiOptions};
use ridehail_balancer::LoadBalancer;
use ridehail_core::{AppConfig, CallAuditor};
use ridehail_dispatcher::RideDispatcher;
use ridehail_domain::RideDispatchService;
use ridehail_infrastructure::FileAuditLog;

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// 派单服务器
    Server,
    /// 负载均衡器
    Balancer,
}

impl AppMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "server" => Ok(AppMode::Server),
            "balancer" => Ok(AppMode::Balancer),
            _ => Err(anyhow::anyhow!("不支持的运行模式: {mode}")),
        }
    }
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    mode: AppMode,
    auditor: Option<Arc<dyn CallAuditor>>,
}

impl Application {
    pub fn new(config: AppConfig, mode: AppMode) -> Self {
        info!("初始化应用程序，模式: {:?}", mode);

        let auditor = config
            .observability
            .audit_log_path
            .as_ref()
            .map(|path| {
                info!("调用审计日志: {}", path);
                Arc::new(FileAuditLog::new(path)) as Arc<dyn CallAuditor>
            });

        Self {
            config,
            mode,
            auditor,
        }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    /// 当前模式的监听地址
    pub fn bind_address(&self) -> &str {
        match self.mode {
            AppMode::Server => &self.config.server.bind_address,
            AppMode::Balancer => &self.config.balancer.bind_address,
        }
    }

    /// 绑定配置的地址并运行，直到收到关闭信号
    pub async fn run(&self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let listener = TcpListener::bind(self.bind_address())
            .await
            .with_context(|| format!("绑定地址失败: {}", self.bind_address()))?;

        self.serve(listener, shutdown_rx).await
    }

    /// 在已绑定的监听器上运行
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        match self.mode {
            AppMode::Server => self.run_server(listener, shutdown_rx).await,
            AppMode::Balancer => self.run_balancer(listener, shutdown_rx).await,
        }
    }

    async fn run_server(
        &self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let config = &self.config.server;
        let dispatcher = Arc::new(RideDispatcher::new(config.acceptance_timeout()));

        let service: Arc<dyn RideDispatchService> = dispatcher.clone();
        let app = create_dispatch_app(
            service,
            ApiOptions {
                max_concurrent_requests: config.max_concurrent_requests,
                auditor: self.auditor.clone(),
            },
        );

        info!("派单服务器启动在 http://{}", local_address(&listener));

        // 收到信号即停止计时，排空连接期间不再启动新的接单计时
        serve_until_shutdown(listener, app, shutdown_rx, move || {
            if let Err(e) = dispatcher.shutdown() {
                error!("停止接单计时失败: {}", e);
            }
        })
        .await?;

        info!("派单服务器已停止");
        Ok(())
    }

    async fn run_balancer(
        &self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        let config = &self.config.balancer;
        let balancer =
            LoadBalancer::new(config.servers.clone()).context("创建负载均衡器失败")?;

        let app = create_routing_app(
            Arc::new(balancer),
            ApiOptions {
                max_concurrent_requests: config.max_concurrent_requests,
                auditor: self.auditor.clone(),
            },
        );

        info!(
            servers = ?config.servers,
            "负载均衡器启动在 http://{}",
            local_address(&listener)
        );
        serve_until_shutdown(listener, app, shutdown_rx, || {}).await?;

        info!("负载均衡器已停止");
        Ok(())
    }
}

/// 运行 HTTP 服务直到收到关闭信号
///
/// `on_signal` 在信号到达时、排空进行中的请求之前调用。
async fn serve_until_shutdown<F>(
    listener: TcpListener,
    app: axum::Router,
    mut shutdown_rx: broadcast::Receiver<()>,
    on_signal: F,
) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("收到关闭信号，停止接受新连接");
            on_signal();
        })
        .await
        .context("HTTP服务运行失败")
}

fn local_address(listener: &TcpListener) -> String {
    listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
