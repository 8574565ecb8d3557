use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use ridehail_core::AppConfig;
use ridehail_infrastructure::{init_logging, init_metrics};

use crate::app::{AppMode, Application};
use crate::shutdown::ShutdownManager;

/// 等待应用关闭的最长时间
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 命令行启动参数，未指定的字段使用配置文件中的值
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub bind_address: Option<String>,
    pub servers: Option<Vec<String>>,
    pub acceptance_timeout_seconds: Option<u64>,
}

/// 加载配置并应用命令行覆盖
pub fn load_config(startup: &StartupConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(startup.config_path.as_deref()).with_context(|| {
        format!(
            "加载配置失败: {}",
            startup.config_path.as_deref().unwrap_or("<默认路径>")
        )
    })?;

    if let Some(ref level) = startup.log_level {
        config.observability.log_level = level.clone();
    }
    if let Some(ref format) = startup.log_format {
        config.observability.log_format = format.clone();
    }
    if let Some(ref servers) = startup.servers {
        config.balancer.servers = servers.clone();
    }
    if let Some(timeout) = startup.acceptance_timeout_seconds {
        config.server.acceptance_timeout_seconds = timeout;
    }

    config.validate()?;
    Ok(config)
}

/// 按运行模式覆盖监听地址
pub fn apply_bind_address(config: &mut AppConfig, mode: AppMode, bind_address: Option<&str>) {
    let Some(address) = bind_address else {
        return;
    };
    match mode {
        AppMode::Server => config.server.bind_address = address.to_string(),
        AppMode::Balancer => config.balancer.bind_address = address.to_string(),
    }
}

/// 启动服务进程，直到收到 Ctrl+C 或 SIGTERM
pub async fn start_application(startup: StartupConfig, mode: AppMode) -> Result<()> {
    let mut config = load_config(&startup)?;
    apply_bind_address(&mut config, mode, startup.bind_address.as_deref());

    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    info!("启动网约车派单系统，模式: {:?}", mode);

    if config.observability.metrics_enabled {
        init_metrics(&config.observability.metrics_listen_address)?;
    }

    let app = Arc::new(Application::new(config, mode));
    let shutdown_manager = ShutdownManager::new();

    let mut app_handle = {
        let shutdown_rx = shutdown_manager.subscribe().await;
        let app = Arc::clone(&app);

        tokio::spawn(async move {
            if let Err(e) = app.run(shutdown_rx).await {
                error!("应用运行失败: {:#}", e);
            }
        })
    };

    let exited_early = tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
            false
        }
        result = &mut app_handle => {
            if let Err(e) = result {
                error!("应用任务异常结束: {e}");
            }
            warn!("应用提前退出");
            true
        }
    };

    shutdown_manager.shutdown().await;

    if !exited_early {
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
            Ok(Ok(())) => info!("应用已优雅关闭"),
            Ok(Err(e)) => error!("应用关闭时发生错误: {e}"),
            Err(_) => warn!("应用关闭超时，强制退出"),
        }
    }

    info!("网约车派单系统已退出");
    Ok(())
}

/// 客户端进程的配置：加载配置文件并覆盖负载均衡器地址
pub fn load_client_config(
    config_path: Option<&str>,
    balancer_url: Option<&str>,
    log_level: Option<&str>,
) -> Result<AppConfig> {
    let mut config = AppConfig::load(config_path).context("加载客户端配置失败")?;

    if let Some(url) = balancer_url {
        config.client.balancer_url = ridehail_client::server_url(url);
    }
    if let Some(level) = log_level {
        config.observability.log_level = level.to_string();
    }

    config.validate()?;
    Ok(config)
}

/// 收到 Ctrl+C 或 SIGTERM 时触发关闭
pub fn spawn_signal_listener(shutdown_manager: ShutdownManager) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        shutdown_manager.shutdown().await;
    });
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}
