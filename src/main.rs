use anyhow::Result;
use clap::{Arg, Command};

use ridehail::app::AppMode;
use ridehail::common::{start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("ridehail")
        .version("1.0.0")
        .about("分布式网约车派单系统")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，默认查找 config/ridehail.toml"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("运行模式")
                .value_parser(["server", "balancer"])
                .default_value("server"),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDR")
                .help("监听地址，覆盖配置文件"),
        )
        .arg(
            Arg::new("servers")
                .long("servers")
                .value_name("ADDRS")
                .help("后端服务器地址，逗号分隔（仅balancer模式）")
                .value_delimiter(','),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .help("司机接单时限（仅server模式）")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"]),
        )
        .get_matches();

    let mode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("server");
    let mode = AppMode::parse(mode)?;

    let startup = StartupConfig {
        config_path: matches.get_one::<String>("config").cloned(),
        log_level: matches.get_one::<String>("log-level").cloned(),
        log_format: matches.get_one::<String>("log-format").cloned(),
        bind_address: matches.get_one::<String>("bind").cloned(),
        servers: matches
            .get_many::<String>("servers")
            .map(|servers| servers.cloned().collect()),
        acceptance_timeout_seconds: matches.get_one::<u64>("timeout").copied(),
    };

    start_application(startup, mode).await
}
