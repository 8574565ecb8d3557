//! 负载均衡路由
//!
//! 乘客按轮询顺序拿到全部服务器，司机被放到当前司机数最少的服务器。

pub mod load_balancer;
pub mod pool;

pub use load_balancer::LoadBalancer;
pub use pool::ServerPool;
