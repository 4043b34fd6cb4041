pub mod config;
pub mod errors;
pub mod logging;

pub use config::*;
pub use errors::*;
pub use logging::*;

/// 统一的Result类型
pub type TurnoverResult<T> = std::result::Result<T, TurnoverError>;
