mod health;
mod ping;

use std::sync::Arc;

use crate::app::AppConfig;
use crate::error::Result;
use monitor_db::Db;

pub use health::{HealthService, ReadinessSnapshot};
pub use ping::{PingInput, PingReceipt, PingService, validate_ping};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub ping: PingService,
    pub health: HealthService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            ping: PingService::new(shared.clone()),
            health: HealthService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}
