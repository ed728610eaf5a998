//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::Json;
use caderneta_chat::{DialogueState, TurnRequest, TurnResponse};
use caderneta_core::types::ConversationId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Longest accepted conversation id.
const MAX_CONVERSATION_ID_LEN: usize = 128;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub chat_enabled: bool,
    pub active_conversations: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationStateResponse {
    pub conversation_id: String,
    pub state: DialogueState,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub conversation_id: String,
    pub cleared: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        chat_enabled: state.config.chat.enabled,
        active_conversations: state.orchestrator.context_store().live_len() as u64,
    })
}

/// POST /conversations/{id}/turns
pub async fn post_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let id = conversation_id(id)?;
    let response = state.orchestrator.handle_turn(&id, &body.text).await?;
    debug!(conversation_id = %id, kind = ?response.kind, "Turn answered");
    Ok(Json(response))
}

/// GET /conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationStateResponse>, ApiError> {
    let id = conversation_id(id)?;
    let dialogue_state = state.orchestrator.state(&id)?;
    Ok(Json(ConversationStateResponse {
        conversation_id: id.to_string(),
        state: dialogue_state,
    }))
}

/// DELETE /conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResetResponse>, ApiError> {
    let id = conversation_id(id)?;
    let cleared = state.orchestrator.reset(&id)?;
    Ok(Json(ResetResponse {
        conversation_id: id.to_string(),
        cleared,
    }))
}

fn conversation_id(raw: String) -> Result<ConversationId, ApiError> {
    let valid = !raw.is_empty()
        && raw.len() <= MAX_CONVERSATION_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ApiError::BadRequest(format!(
            "conversation id must be 1-{} characters of letters, digits, '-' or '_'",
            MAX_CONVERSATION_ID_LEN
        )));
    }
    Ok(ConversationId::from(raw))
}
