//! 派单引擎
//!
//! - [`DriverRegistry`]：司机身份与空闲/忙碌状态
//! - [`RideStore`]：行程状态机，负责指派、接单、拒单、完成与超时改派
//! - [`ReassignmentSupervisor`]：每个等待确认行程的可取消接单计时
//! - [`RideDispatcher`]：对网络层暴露的 [`ridehail_domain::RideDispatchService`] 实现

pub mod driver_registry;
pub mod reassignment;
pub mod ride_store;
pub mod service;
pub mod strategies;

pub use driver_registry::DriverRegistry;
pub use reassignment::{AcceptanceExpired, ReassignmentSupervisor, DEFAULT_ACCEPTANCE_TIMEOUT};
pub use ride_store::RideStore;
pub use service::RideDispatcher;
pub use strategies::*;
