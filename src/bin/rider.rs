use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Arg, Command};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use ridehail::common::{load_client_config, spawn_signal_listener};
use ridehail::shutdown::ShutdownManager;
use ridehail_client::{RideOutcome, RiderSession};
use ridehail_core::CallAuditor;
use ridehail_domain::RideRequest;
use ridehail_infrastructure::{init_logging, FileAuditLog};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("rider")
        .version("1.0.0")
        .about("分布式网约车派单系统 - 乘客端")
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
        .arg(Arg::new("rider-id").long("rider-id").value_name("ID").help("乘客ID"))
        .arg(Arg::new("pickup").long("pickup").value_name("LOCATION").help("上车地点"))
        .arg(
            Arg::new("destination")
                .long("destination")
                .value_name("LOCATION")
                .help("目的地"),
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

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let rider_id = value_or_prompt(&matches, "rider-id", "Enter rider ID: ", &mut stdin).await?;
    let pickup_location =
        value_or_prompt(&matches, "pickup", "Enter pickup location: ", &mut stdin).await?;
    let destination =
        value_or_prompt(&matches, "destination", "Enter destination: ", &mut stdin).await?;

    let auditor = config
        .observability
        .audit_log_path
        .as_ref()
        .map(|path| Arc::new(FileAuditLog::new(path)) as Arc<dyn CallAuditor>);
    let session = RiderSession::from_config(&config.client, auditor)?;

    let shutdown_manager = ShutdownManager::new();
    let mut shutdown_rx = shutdown_manager.subscribe().await;
    spawn_signal_listener(shutdown_manager);

    let request = RideRequest {
        rider_id,
        pickup_location,
        destination,
    };

    match session.request_ride(request, &mut shutdown_rx).await? {
        RideOutcome::Completed {
            ride_id,
            server_address,
        } => println!("Ride {ride_id} completed (server {server_address})."),
        RideOutcome::NoDriversAvailable => println!("No drivers available, please try again later."),
        RideOutcome::Interrupted => info!("乘客端已退出"),
    }

    Ok(())
}

type StdinLines = tokio::io::Lines<BufReader<tokio::io::Stdin>>;

async fn value_or_prompt(
    matches: &clap::ArgMatches,
    name: &str,
    prompt: &str,
    stdin: &mut StdinLines,
) -> Result<String> {
    if let Some(value) = matches.get_one::<String>(name) {
        return Ok(value.clone());
    }

    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let line = stdin
        .next_line()
        .await?
        .with_context(|| format!("标准输入已关闭，缺少参数: {name}"))?;
    Ok(line.trim().to_string())
}
