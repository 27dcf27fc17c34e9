pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod startup;
pub mod util;

pub use app::{AppConfig, AppState, setup_db};
pub use config::MonitorConfig;
pub use error::{ApiError, AppError, Result};
pub use services::{
    AppServices, HealthService, PingInput, PingReceipt, PingService, ReadinessSnapshot,
    validate_ping,
};
pub use startup::{AppPaths, default_data_dir, ensure_app_data_dir};
pub use util::time::now_millis;
