use monitor_core::{EntryId, FIELD_MAX_TOKENS, FIELD_TASK_ID, FIELD_TOKEN_COUNT, UsageEvent};
use monitor_db::EventLog;

use crate::error::{AppError, Result};
use crate::services::{SharedConfig, open_db};
use crate::util::time::now_millis;

/// Raw usage ping as received from a task; every field may be absent.
#[derive(Debug, Clone, Default)]
pub struct PingInput {
    pub task_id: Option<String>,
    pub token_count: Option<i64>,
    pub max_tokens: Option<i64>,
    pub timestamp: Option<i64>,
}

/// Where an accepted ping was recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct PingReceipt {
    pub entry_id: EntryId,
    pub stream_key: String,
    pub usage_percentage: f64,
}

#[derive(Clone)]
pub struct PingService {
    config: SharedConfig,
}

impl PingService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Validates the ping and appends it to its project stream. Validation
    /// happens before the store is touched.
    pub fn record(&self, input: PingInput) -> Result<PingReceipt> {
        let event = validate_ping(input, now_millis())?;
        let mut db = open_db(&self.config)?;
        record_event(&mut db, &event)
    }
}

pub(crate) fn record_event<L: EventLog + ?Sized>(
    log: &mut L,
    event: &UsageEvent,
) -> Result<PingReceipt> {
    let stream_key = event.stream_key();
    let entry_id = log.append(&stream_key, &event.to_fields())?;
    Ok(PingReceipt {
        entry_id,
        stream_key,
        usage_percentage: event.usage_percentage,
    })
}

/// Checks required fields and ranges; `now` fills a missing timestamp.
pub fn validate_ping(input: PingInput, now: i64) -> Result<UsageEvent> {
    let task_id = input.task_id.ok_or_else(|| missing(FIELD_TASK_ID))?;
    let token_count = input.token_count.ok_or_else(|| missing(FIELD_TOKEN_COUNT))?;
    let max_tokens = input.max_tokens.ok_or_else(|| missing(FIELD_MAX_TOKENS))?;

    if task_id.trim().is_empty() {
        return Err(AppError::Validation("task_id must not be empty".to_string()));
    }
    if token_count < 0 {
        return Err(AppError::Validation(
            "token_count must not be negative".to_string(),
        ));
    }
    if max_tokens <= 0 {
        return Err(AppError::Validation(
            "max_tokens must be greater than zero".to_string(),
        ));
    }

    let timestamp = input.timestamp.unwrap_or(now);
    UsageEvent::new(task_id, token_count as u64, max_tokens as u64, timestamp).ok_or_else(|| {
        AppError::Validation("max_tokens must be greater than zero".to_string())
    })
}

fn missing(field: &str) -> AppError {
    AppError::Validation(format!("Missing required field: {}", field))
}
