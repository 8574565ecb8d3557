use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::{Arg, ArgAction, Command};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{info, warn};

use ridehail::common::{load_client_config, spawn_signal_listener};
use ridehail::shutdown::ShutdownManager;
use ridehail_client::{AutoAcceptDecider, DriverSession, RideDecider, RideDecision};
use ridehail_core::CallAuditor;
use ridehail_domain::AssignedRideResponse;
use ridehail_infrastructure::{init_logging, FileAuditLog};

/// 从标准输入读取司机的决定
struct StdinDecider {
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl StdinDecider {
    fn new() -> Self {
        Self {
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn prompt(&self, text: &str) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(text.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return None;
        }

        match self.lines.lock().await.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("读取标准输入失败: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl RideDecider for StdinDecider {
    async fn decide(&self, ride: &AssignedRideResponse) -> RideDecision {
        let text = format!(
            "New ride {} from {} to {}. Accept? (y/n): ",
            ride.ride_id, ride.pickup_location, ride.destination
        );
        match self.prompt(&text).await {
            Some(answer) if answer.trim().eq_ignore_ascii_case("y") => RideDecision::Accept,
            _ => RideDecision::Reject,
        }
    }

    async fn wait_for_completion(&self, ride: &AssignedRideResponse) {
        let text = format!("Ride {} in progress. Press Enter to complete: ", ride.ride_id);
        // 标准输入关闭时直接完成
        let _ = self.prompt(&text).await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("driver")
        .version("1.0.0")
        .about("分布式网约车派单系统 - 司机端")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("balancer")
                .long("balancer")
                .value_name("ADDR")
                .help("负载均衡器地址，覆盖配置文件"),
        )
        .arg(
            Arg::new("driver-id")
                .short('d')
                .long("driver-id")
                .value_name("ID")
                .help("司机ID")
                .required(true),
        )
        .arg(
            Arg::new("auto-accept")
                .long("auto-accept")
                .help("自动接单，不读取标准输入")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ride-seconds")
                .long("ride-seconds")
                .value_name("SECONDS")
                .help("自动接单模式下每个行程的时长")
                .value_parser(clap::value_parser!(u64))
                .default_value("5"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .get_matches();

    let config = load_client_config(
        matches.get_one::<String>("config").map(String::as_str),
        matches.get_one::<String>("balancer").map(String::as_str),
        matches.get_one::<String>("log-level").map(String::as_str),
    )?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    )?;

    let driver_id = matches
        .get_one::<String>("driver-id")
        .cloned()
        .unwrap_or_default();

    let auditor = config
        .observability
        .audit_log_path
        .as_ref()
        .map(|path| Arc::new(FileAuditLog::new(path)) as Arc<dyn CallAuditor>);
    let session = DriverSession::from_config(driver_id, &config.client, auditor)?;

    let decider: Box<dyn RideDecider> = if matches.get_flag("auto-accept") {
        let seconds = matches.get_one::<u64>("ride-seconds").copied().unwrap_or(5);
        Box::new(AutoAcceptDecider::new(Duration::from_secs(seconds)))
    } else {
        Box::new(StdinDecider::new())
    };

    let shutdown_manager = ShutdownManager::new();
    let mut shutdown_rx = shutdown_manager.subscribe().await;
    spawn_signal_listener(shutdown_manager);

    let report = session.run(decider.as_ref(), &mut shutdown_rx).await?;
    info!(
        driver_id = %session.driver_id(),
        server = %report.server_address,
        completed = report.completed_rides,
        rejected = report.rejected_rides,
        missed = report.missed_rides,
        "司机端已退出"
    );

    Ok(())
}
