use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let documents = state.store.count().await?;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);

    Ok(Json(json!({
        "status": "ok",
        "documents": documents,
        "vector_backend": state.settings.vector_index.backend,
        "uptime_secs": uptime_secs,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::{RecordingGenerator, RecordingIndex};
    use crate::server::handlers::test_state;

    #[tokio::test]
    async fn health_reports_document_count() {
        let (state, _dir) = test_state::build(
            Arc::new(RecordingIndex::default()),
            Arc::new(RecordingGenerator::replying("ok")),
        )
        .await;

        let Json(body) = health(State(state)).await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["documents"], 0);
        assert_eq!(body["vector_backend"], "sqlite");
    }
}
