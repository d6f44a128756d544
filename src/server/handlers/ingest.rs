use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::models::StoreId;
use crate::rag::{load_records, IngestReport};
use crate::state::AppState;

/// Inline records win over `path`; with neither, `ingest.source_path` is used.
#[derive(Debug, Default, Deserialize)]
pub struct IngestRequest {
    #[serde(default)]
    pub records: Option<Vec<Value>>,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<Json<IngestReport>, ApiError> {
    let records = match (payload.records, payload.path) {
        (Some(records), _) => records,
        (None, Some(path)) => load_records(&path)?,
        (None, None) => match &state.settings.ingest.source_path {
            Some(path) => load_records(path)?,
            None => {
                return Err(ApiError::BadRequest(
                    "provide `records`, `path`, or configure ingest.source_path".to_string(),
                ))
            }
        },
    };

    tracing::info!("Ingesting {} restaurant records", records.len());
    Ok(Json(state.ingestion.ingest(records).await))
}

pub async fn reembed_restaurant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = StoreId::parse(&id)?;
    let text = state.ingestion.reembed_restaurant(&id).await?;
    Ok(Json(json!({ "id": id.to_string(), "text": text })))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::rag::test_support::{RecordingGenerator, RecordingIndex};
    use crate::server::handlers::test_state;

    async fn state_with(index: Arc<RecordingIndex>) -> (Arc<AppState>, tempfile::TempDir) {
        test_state::build(index, Arc::new(RecordingGenerator::replying("unused"))).await
    }

    #[tokio::test]
    async fn inline_records_are_ingested() {
        let index = Arc::new(RecordingIndex::default());
        let (state, _dir) = state_with(index.clone()).await;

        let payload = IngestRequest {
            records: Some(vec![json!({
                "name": "Royal Cafe",
                "cuisine": ["Chaat", "Cafe"],
                "menu_items": [{ "name": "Basket Chaat", "price": 150 }]
            })]),
            path: None,
        };
        let Json(report) = ingest(State(state), Json(payload)).await.unwrap();

        assert_eq!(report.restaurants, 1);
        assert_eq!(report.menu_items, 1);
        assert_eq!(index.upserts().len(), 2);
    }

    #[tokio::test]
    async fn records_are_loaded_from_a_path() {
        let (state, dir) = state_with(Arc::new(RecordingIndex::default())).await;
        let file = dir.path().join("restaurants.json");
        std::fs::write(&file, r#"[{"name": "Tunday Kababi", "cuisine": "Mughlai"}]"#).unwrap();

        let payload = IngestRequest {
            records: None,
            path: Some(file),
        };
        let Json(report) = ingest(State(state), Json(payload)).await.unwrap();
        assert_eq!(report.restaurants, 1);
    }

    #[tokio::test]
    async fn missing_source_is_a_bad_request() {
        let (state, _dir) = state_with(Arc::new(RecordingIndex::default())).await;

        let result = ingest(State(state), Json(IngestRequest::default())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn reembed_rejects_bad_ids_and_unknown_restaurants() {
        let (state, _dir) = state_with(Arc::new(RecordingIndex::default())).await;

        let bad = reembed_restaurant(State(state.clone()), Path("nope".to_string())).await;
        assert!(matches!(bad, Err(ApiError::BadRequest(_))));

        let missing =
            reembed_restaurant(State(state), Path(StoreId::new().to_string())).await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn reembed_returns_the_registered_text() {
        let index = Arc::new(RecordingIndex::default());
        let (state, _dir) = state_with(index.clone()).await;
        let payload = IngestRequest {
            records: Some(vec![json!({
                "name": "Dastarkhwan",
                "cuisine": "Awadhi",
                "menu_items": [{ "name": "Mutton Biryani", "price": 320 }]
            })]),
            path: None,
        };
        ingest(State(state.clone()), Json(payload)).await.unwrap();
        let raw_id = index.upserts()[0].1.split_whitespace().next().unwrap().to_string();

        let Json(body) = reembed_restaurant(State(state), Path(raw_id.clone())).await.unwrap();
        assert_eq!(body["id"], raw_id);
        assert!(body["text"].as_str().unwrap().ends_with("menu: Mutton Biryani"));
    }
}
