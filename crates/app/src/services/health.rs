use monitor_core::STREAM_PREFIX;
use monitor_db::Db;

use crate::error::Result;
use crate::services::SharedConfig;

/// Result of a readiness probe against the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadinessSnapshot {
    pub streams: usize,
}

#[derive(Clone)]
pub struct HealthService {
    config: SharedConfig,
}

impl HealthService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Opens the store and lists the usage streams; any failure means the
    /// endpoint cannot accept pings.
    pub fn readiness(&self) -> Result<ReadinessSnapshot> {
        let db = Db::open_migrated(&self.config.db_path)?;
        let streams = db.stream_keys_with_prefix(STREAM_PREFIX)?.len();
        Ok(ReadinessSnapshot { streams })
    }
}
