use crate::config::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    // 验证默认值
    assert_eq!(config.server.acceptance_timeout_seconds, 10);
    assert_eq!(config.server.max_concurrent_requests, 10);
    assert_eq!(config.balancer.bind_address, "0.0.0.0:4000");
    assert_eq!(config.balancer.servers.len(), 3);
    assert_eq!(config.client.driver_poll_interval_seconds, 2);
    assert_eq!(config.client.rider_poll_interval_seconds, 3);
    assert!(config.observability.audit_log_path.is_none());
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[server]
bind_address = "127.0.0.1:6001"
acceptance_timeout_seconds = 5

[balancer]
bind_address = "127.0.0.1:4100"
servers = ["127.0.0.1:6001", "127.0.0.1:6002"]

[observability]
log_level = "debug"
log_format = "json"
audit_log_path = "audit.txt"
"#;

    let config = AppConfig::from_toml(toml_content).unwrap();
    assert_eq!(config.server.bind_address, "127.0.0.1:6001");
    assert_eq!(config.server.acceptance_timeout_seconds, 5);
    // 未出现的字段使用默认值
    assert_eq!(config.server.max_concurrent_requests, 10);
    assert_eq!(
        config.balancer.servers,
        vec!["127.0.0.1:6001".to_string(), "127.0.0.1:6002".to_string()]
    );
    assert_eq!(config.observability.log_format, "json");
    assert_eq!(config.observability.audit_log_path.as_deref(), Some("audit.txt"));
    assert_eq!(config.client.balancer_url, "http://127.0.0.1:4000");
}

#[test]
fn test_toml_round_trip() {
    let config = AppConfig::default();
    let toml_str = config.to_toml().unwrap();
    let parsed = AppConfig::from_toml(&toml_str).unwrap();

    assert_eq!(parsed.balancer.servers, config.balancer.servers);
    assert_eq!(
        parsed.server.acceptance_timeout_seconds,
        config.server.acceptance_timeout_seconds
    );
}

#[test]
fn test_invalid_acceptance_timeout() {
    let toml_content = r#"
[server]
acceptance_timeout_seconds = 0
"#;
    let result = AppConfig::from_toml(toml_content);
    assert!(result.is_err());
}

#[test]
fn test_empty_server_pool_rejected() {
    let mut config = AppConfig::default();
    config.balancer.servers.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_duplicate_servers_rejected() {
    let mut config = AppConfig::default();
    config.balancer.servers = vec!["127.0.0.1:5001".to_string(), "127.0.0.1:5001".to_string()];
    let err = config.validate().unwrap_err();
    assert!(format!("{err:#}").contains("重复"));
}

#[test]
fn test_invalid_log_format() {
    let mut config = AppConfig::default();
    config.observability.log_format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_invalid_balancer_url() {
    let mut config = AppConfig::default();
    config.client.balancer_url = "127.0.0.1:4000".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[balancer]
servers = ["10.0.0.1:5001"]

[client]
rider_poll_interval_seconds = 7
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    // NamedTempFile 没有 .toml 后缀，显式按 TOML 解析
    let config = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(config.balancer.servers, vec!["10.0.0.1:5001".to_string()]);
    assert_eq!(config.client.rider_poll_interval_seconds, 7);
    assert_eq!(config.server.acceptance_timeout_seconds, 10);
}

#[test]
fn test_load_missing_file() {
    let result = AppConfig::load(Some("/nonexistent/ridehail.toml"));
    assert!(result.is_err());
}

#[test]
fn test_env_override() {
    std::env::set_var("RIDEHAIL_SERVER__MAX_CONCURRENT_REQUESTS", "32");
    let config = AppConfig::load(None);
    std::env::remove_var("RIDEHAIL_SERVER__MAX_CONCURRENT_REQUESTS");

    let config = config.unwrap();
    assert_eq!(config.server.max_concurrent_requests, 32);
}
