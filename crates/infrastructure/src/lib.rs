pub mod audit_log;
pub mod observability;

pub use audit_log::*;
pub use observability::*;
