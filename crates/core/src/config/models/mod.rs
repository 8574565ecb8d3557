pub mod app_config;
pub mod balancer;
pub mod client;
pub mod dispatch;
pub mod observability;

// Re-export main types for easier imports
pub use app_config::AppConfig;
pub use balancer::BalancerConfig;
pub use client::ClientConfig;
pub use dispatch::ServerConfig;
pub use observability::ObservabilityConfig;
