pub mod app_config;
pub mod models;

pub use app_config::AppConfig;
pub use models::{AlertConfig, ApiConfig, DatabaseConfig};
