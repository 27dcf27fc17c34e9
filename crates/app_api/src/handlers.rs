use monitor_app::{PingInput, Result};

use crate::{
    AppContext, ContextPingRequest, ContextPingResponse, HealthResponse, ReadyResponse,
};

pub fn context_ping(ctx: &AppContext, req: ContextPingRequest) -> Result<ContextPingResponse> {
    let input = PingInput {
        task_id: req.task_id,
        token_count: req.token_count,
        max_tokens: req.max_tokens,
        timestamp: req.timestamp,
    };
    let receipt = ctx.app_state.services.ping.record(input)?;
    Ok(ContextPingResponse {
        status: "success".to_string(),
        message: "Context data recorded".to_string(),
        entry_id: receipt.entry_id,
        stream_key: receipt.stream_key,
    })
}

/// Liveness only: reports healthy without touching the store.
pub fn health() -> HealthResponse {
    HealthResponse {
        status: "healthy".to_string(),
    }
}

pub fn ready(ctx: &AppContext) -> Result<ReadyResponse> {
    let snapshot = ctx.app_state.services.health.readiness()?;
    Ok(ReadyResponse {
        status: "ready".to_string(),
        streams: snapshot.streams,
    })
}
