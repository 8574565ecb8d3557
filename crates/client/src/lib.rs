//! 乘客端与司机端
//!
//! [`DispatchClient`] 和 [`RoutingClient`] 通过 HTTP/JSON 调用派单服务和负载均衡器，
//! 可选地在每次调用前后通知审计钩子。[`RiderSession`] 和 [`DriverSession`]
//! 在这两个客户端之上实现叫车和接单流程。

pub mod dispatch_client;
pub mod driver;
pub mod rider;
pub mod routing_client;
mod transport;

pub use dispatch_client::DispatchClient;
pub use driver::{AutoAcceptDecider, DriverReport, DriverSession, RideDecider, RideDecision};
pub use rider::{RideOutcome, RiderSession};
pub use routing_client::RoutingClient;
pub use transport::server_url;
