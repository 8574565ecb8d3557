//! 配置管理
//!
//! 配置按以下顺序合并，后者覆盖前者：
//!
//! 1. 内置默认值（`AppConfig::default()`）
//! 2. TOML 配置文件（默认查找 `config/ridehail.toml`、`ridehail.toml`）
//! 3. `RIDEHAIL_` 前缀的环境变量，嵌套字段以 `__` 分隔，
//!    例如 `RIDEHAIL_SERVER__ACCEPTANCE_TIMEOUT_SECONDS=15`
//!
//! 合并完成后统一执行校验，任何一个分段校验失败都会导致加载失败。

pub mod models;

pub use models::*;

#[cfg(test)]
mod config_test;
