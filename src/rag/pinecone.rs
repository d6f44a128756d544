//! Pinecone records API with integrated embedding.
//!
//! Text is sent as-is; the index embeds it server-side. Records are keyed by
//! the composite key so search hits map straight back to stored documents.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::key;
use super::vector::{VectorHit, VectorIndex};
use crate::core::config::settings::PineconeSettings;
use crate::core::errors::{PipelineError, Upstream};
use crate::models::TypeTag;

const API_VERSION: &str = "2025-01";

#[derive(Clone)]
pub struct PineconeIndex {
    host: String,
    api_key: String,
    namespace: String,
    text_field: String,
    top_k: usize,
    client: Client,
}

impl PineconeIndex {
    pub fn new(settings: &PineconeSettings, top_k: usize) -> Result<Self, PipelineError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            PipelineError::upstream(Upstream::VectorIndex, "pinecone requires vector_index.pinecone.api_key")
        })?;

        let host = settings.host.trim_end_matches('/');
        let host = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        Ok(Self {
            host,
            api_key,
            namespace: settings.namespace.clone(),
            text_field: settings.text_field.clone(),
            top_k,
            client: Client::new(),
        })
    }

    fn record(&self, text: &str, id: &str, tag: &TypeTag) -> Value {
        let mut record = json!({
            "_id": key::encode(id, tag),
            "type": tag.as_str(),
        });
        record[self.text_field.as_str()] = Value::String(text.to_string());
        record
    }

    fn search_body(&self, query: &str) -> Value {
        json!({
            "query": {
                "inputs": { "text": query },
                "top_k": self.top_k,
            },
            "fields": ["type"],
        })
    }

    fn delete_body(&self, id: &str, tag: &TypeTag) -> Value {
        json!({
            "ids": [key::encode(id, tag)],
            "namespace": self.namespace,
        })
    }

    fn url(&self, action: &str) -> String {
        format!("{}/records/namespaces/{}/{}", self.host, self.namespace, action)
    }

    /// Deletes live on the vectors endpoint; records have no delete action.
    fn delete_url(&self) -> String {
        format!("{}/vectors/delete", self.host)
    }
}

fn index_error<E: std::fmt::Display>(err: E) -> PipelineError {
    PipelineError::upstream(Upstream::VectorIndex, err)
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, text: &str, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        // NDJSON: one record per line
        let body = format!("{}\n", self.record(text, id, tag));

        let res = self
            .client
            .post(self.url("upsert"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .header("Content-Type", "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(index_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(index_error(format!("upsert returned {}: {}", status, text)));
        }

        Ok(())
    }

    async fn delete(&self, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        let res = self
            .client
            .post(self.delete_url())
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&self.delete_body(id, tag))
            .send()
            .await
            .map_err(index_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(index_error(format!("delete returned {}: {}", status, text)));
        }

        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<VectorHit>, PipelineError> {
        let res = self
            .client
            .post(self.url("search"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&self.search_body(query))
            .send()
            .await
            .map_err(index_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(index_error(format!("search returned {}: {}", status, text)));
        }

        let payload: Value = res.json().await.map_err(index_error)?;
        Ok(parse_search_hits(&payload))
    }
}

/// Hits in the order the index ranked them.
fn parse_search_hits(payload: &Value) -> Vec<VectorHit> {
    payload["result"]["hits"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| {
                    let id = hit["_id"].as_str()?;
                    let score = hit["_score"].as_f64().unwrap_or(0.0) as f32;
                    Some(VectorHit::new(id, score))
                })
                .collect()
        })
        .unwrap_or_default()
}
