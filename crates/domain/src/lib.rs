pub mod entities;
pub mod repositories;
pub mod value_objects;

pub use entities::*;
pub use repositories::*;
pub use turnover_core::{TurnoverError, TurnoverResult};
pub use value_objects::*;
