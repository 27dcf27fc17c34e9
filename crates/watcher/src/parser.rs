use monitor_core::{FIELD_MAX_TOKENS, FIELD_TASK_ID, FIELD_TOKEN_COUNT, StreamEntry, usage_ratio};

use crate::types::EntryError;

/// Usage numbers decoded from one stream entry.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageSample {
    pub task_id: String,
    pub token_count: u64,
    pub max_tokens: u64,
    pub ratio: f64,
}

pub fn parse_usage_sample(entry: &StreamEntry) -> Result<UsageSample, EntryError> {
    if let Some(reason) = &entry.malformed {
        return Err(EntryError::Malformed(reason.clone()));
    }
    let task_id = entry
        .field(FIELD_TASK_ID)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(EntryError::MissingTaskId)?;
    let token_count = parse_count(entry, FIELD_TOKEN_COUNT)?;
    let max_tokens = parse_count(entry, FIELD_MAX_TOKENS)?;
    let ratio = usage_ratio(token_count, max_tokens).ok_or(EntryError::ZeroMaxTokens)?;
    Ok(UsageSample {
        task_id: task_id.to_string(),
        token_count,
        max_tokens,
        ratio,
    })
}

fn parse_count(entry: &StreamEntry, field: &'static str) -> Result<u64, EntryError> {
    let raw = entry.field(field).ok_or(EntryError::MissingField(field))?;
    raw.trim()
        .parse::<u64>()
        .map_err(|_| EntryError::InvalidInteger {
            field,
            value: raw.to_string(),
        })
}
