use serde::Deserialize;

/// Body of `POST /context-ping`. Required fields are optional here so a
/// missing one can be reported by name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContextPingRequest {
    pub task_id: Option<String>,
    pub token_count: Option<i64>,
    pub max_tokens: Option<i64>,
    pub timestamp: Option<i64>,
}
