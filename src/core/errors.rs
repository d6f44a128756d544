use std::fmt;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// External collaborator that failed during a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    VectorIndex,
    DocumentStore,
    Generation,
    Embedding,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::VectorIndex => "vector index",
            Upstream::DocumentStore => "document store",
            Upstream::Generation => "generative model",
            Upstream::Embedding => "embedding service",
        };
        f.write_str(name)
    }
}

/// Failures raised inside the retrieval, enrichment and ingestion pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed composite key: {0:?}")]
    MalformedKey(String),
    #[error("invalid store id: {0:?}")]
    InvalidId(String),
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("{service} failure: {message}")]
    Upstream { service: Upstream, message: String },
    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

impl PipelineError {
    pub fn upstream<E: fmt::Display>(service: Upstream, err: E) -> Self {
        PipelineError::Upstream {
            service,
            message: err.to_string(),
        }
    }

    pub fn store<E: fmt::Display>(err: E) -> Self {
        Self::upstream(Upstream::DocumentStore, err)
    }
}

/// A single related document that could not be attached during expansion.
#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("invalid child id {0:?}")]
    InvalidId(String),
    #[error("child document {0} not found")]
    NotFound(String),
    #[error("lookup of {id} failed: {source}")]
    Store {
        id: String,
        #[source]
        source: PipelineError,
    },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MalformedKey(_)
            | PipelineError::InvalidId(_)
            | PipelineError::InvalidRecord(_) => ApiError::BadRequest(err.to_string()),
            PipelineError::NotFound(_) => ApiError::NotFound(err.to_string()),
            PipelineError::Upstream { .. } => ApiError::ServiceUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
