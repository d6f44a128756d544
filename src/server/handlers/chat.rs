use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::rag::{ContextRef, OutcomeKind};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub outcome: OutcomeKind,
    pub context: Vec<ContextRef>,
}

/// Pipeline failures are reported in `response`, never as an HTTP error.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let outcome = state.chat.answer(message).await;
    Ok(Json(ChatResponse {
        response: outcome.response,
        outcome: outcome.kind,
        context: outcome.context,
    }))
}
