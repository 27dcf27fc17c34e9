use std::time::Duration;

use monitor_core::EntryId;
use monitor_db::DbError;
use serde::Serialize;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CRITICAL_THRESHOLD: f64 = 0.9;
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_CONSUMER: &str = "context-watcher";

/// Runtime knobs of the stream watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct WatcherConfig {
    pub poll_interval: Duration,
    pub critical_threshold: f64,
    pub batch_size: usize,
    /// Persist cursors in the store so a restart resumes instead of rescanning.
    pub checkpoint: bool,
    pub consumer: String,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            critical_threshold: DEFAULT_CRITICAL_THRESHOLD,
            batch_size: DEFAULT_BATCH_SIZE,
            checkpoint: true,
            consumer: DEFAULT_CONSUMER.to_string(),
        }
    }
}

impl WatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.critical_threshold) {
            return Err(WatchError::InvalidConfig(format!(
                "critical threshold must be within [0, 1], got {}",
                self.critical_threshold
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(WatchError::InvalidConfig(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(WatchError::InvalidConfig(
                "batch size must be greater than zero".to_string(),
            ));
        }
        if self.consumer.trim().is_empty() {
            return Err(WatchError::InvalidConfig(
                "consumer name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Summary of a single poll tick.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollReport {
    pub streams_scanned: usize,
    pub entries_processed: usize,
    pub entries_skipped: usize,
    pub flags_raised: Vec<String>,
    pub issues: Vec<WatchIssue>,
}

/// Non-fatal problems met while polling.
#[derive(Debug, Clone, Serialize)]
pub struct WatchIssue {
    pub stream_key: String,
    pub entry_id: Option<EntryId>,
    pub message: String,
}

/// Why a stored entry could not be turned into a usage sample.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("entry has no task_id")]
    MissingTaskId,
    #[error("entry has no {0}")]
    MissingField(&'static str),
    #[error("{field} is not a non-negative integer: {value:?}")]
    InvalidInteger { field: &'static str, value: String },
    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,
    #[error("{0}")]
    Malformed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("store error: {0}")]
    Store(#[from] DbError),
    #[error("invalid watcher config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WatchError>;
