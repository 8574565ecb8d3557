pub mod config;
pub mod errors;
pub mod traits;

pub use config::*;
pub use errors::*;
pub use traits::*;
