use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix shared by every per-project usage stream.
pub const STREAM_PREFIX: &str = "context:";
/// Prefix of the per-task handover flag keys.
pub const HANDOVER_PREFIX: &str = "handover_required:";
pub const HANDOVER_VALUE: &str = "true";
pub const DEFAULT_PROJECT: &str = "default";
pub const TASK_SEPARATOR: char = ':';

pub const FIELD_TASK_ID: &str = "task_id";
pub const FIELD_TOKEN_COUNT: &str = "token_count";
pub const FIELD_MAX_TOKENS: &str = "max_tokens";
pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_USAGE_PERCENTAGE: &str = "usage_percentage";

/// Schemaless field map of a stream entry; every value is stored as text.
pub type EntryFields = BTreeMap<String, String>;

/// Store-assigned stream entry id, rendered as `<millis>-<seq>`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    pub millis: u64,
    pub seq: u64,
}

impl EntryId {
    /// Position before the first entry of any stream.
    pub const ZERO: EntryId = EntryId { millis: 0, seq: 0 };

    pub fn new(millis: u64, seq: u64) -> Self {
        Self { millis, seq }
    }

    /// Smallest id strictly greater than `last` for an append observed at `now_millis`.
    pub fn next_after(last: Option<EntryId>, now_millis: u64) -> EntryId {
        match last {
            Some(last) if now_millis <= last.millis => EntryId::new(last.millis, last.seq + 1),
            _ => EntryId::new(now_millis, 0),
        }
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.millis, self.seq)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid entry id: {0}")]
pub struct InvalidEntryId(pub String);

impl FromStr for EntryId {
    type Err = InvalidEntryId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidEntryId(value.to_string());
        let (millis, seq) = value.split_once('-').ok_or_else(invalid)?;
        let millis = millis.parse::<u64>().map_err(|_| invalid())?;
        let seq = seq.parse::<u64>().map_err(|_| invalid())?;
        Ok(EntryId { millis, seq })
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One entry read back from a stream. `malformed` holds the decode error
/// when the stored fields could not be read; `fields` is then empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub id: EntryId,
    pub fields: EntryFields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub malformed: Option<String>,
}

impl StreamEntry {
    pub fn new(id: EntryId, fields: EntryFields) -> Self {
        Self {
            id,
            fields,
            malformed: None,
        }
    }

    pub fn malformed(id: EntryId, reason: impl Into<String>) -> Self {
        Self {
            id,
            fields: EntryFields::new(),
            malformed: Some(reason.into()),
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A validated usage ping, ready to be appended to its project stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEvent {
    pub task_id: String,
    pub token_count: u64,
    pub max_tokens: u64,
    pub timestamp: i64,
    pub usage_percentage: f64,
}

impl UsageEvent {
    /// Returns `None` when `max_tokens` is zero.
    pub fn new(task_id: String, token_count: u64, max_tokens: u64, timestamp: i64) -> Option<Self> {
        let usage_percentage = usage_percentage(token_count, max_tokens)?;
        Some(Self {
            task_id,
            token_count,
            max_tokens,
            timestamp,
            usage_percentage,
        })
    }

    pub fn project_id(&self) -> &str {
        project_id_from_task(&self.task_id)
    }

    pub fn stream_key(&self) -> String {
        stream_key_for_project(self.project_id())
    }

    pub fn to_fields(&self) -> EntryFields {
        let mut fields = EntryFields::new();
        fields.insert(FIELD_TASK_ID.to_string(), self.task_id.clone());
        fields.insert(FIELD_TOKEN_COUNT.to_string(), self.token_count.to_string());
        fields.insert(FIELD_MAX_TOKENS.to_string(), self.max_tokens.to_string());
        fields.insert(FIELD_TIMESTAMP.to_string(), self.timestamp.to_string());
        fields.insert(
            FIELD_USAGE_PERCENTAGE.to_string(),
            self.usage_percentage.to_string(),
        );
        fields
    }
}

pub fn project_id_from_task(task_id: &str) -> &str {
    match task_id.split_once(TASK_SEPARATOR) {
        Some((project, _)) if !project.is_empty() => project,
        _ => DEFAULT_PROJECT,
    }
}

pub fn stream_key_for_project(project_id: &str) -> String {
    format!("{STREAM_PREFIX}{project_id}")
}

pub fn handover_key(task_id: &str) -> String {
    format!("{HANDOVER_PREFIX}{task_id}")
}

/// `token_count / max_tokens`, or `None` for a zero denominator.
pub fn usage_ratio(token_count: u64, max_tokens: u64) -> Option<f64> {
    if max_tokens == 0 {
        return None;
    }
    Some(token_count as f64 / max_tokens as f64)
}

/// Usage as a percentage rounded to two decimal places.
pub fn usage_percentage(token_count: u64, max_tokens: u64) -> Option<f64> {
    usage_ratio(token_count, max_tokens).map(|ratio| round_to_hundredths(ratio * 100.0))
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn exceeds_threshold(ratio: f64, critical_threshold: f64) -> bool {
    ratio >= critical_threshold
}
