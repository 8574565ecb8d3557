pub mod entities;
pub mod messages;
pub mod services;

pub use entities::*;
pub use messages::*;
pub use ridehail_core::{DispatchError, DispatchResult};
pub use services::*;
