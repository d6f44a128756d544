//! VectorIndex trait: similarity search over embedded restaurant and menu text.
//!
//! Scoring happens inside the index; callers only see ranked composite keys.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;
use crate::models::TypeTag;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    /// `"<store_id> <type_tag>"`.
    pub composite_id: String,
    /// Similarity score (higher = better).
    pub score: f32,
}

impl VectorHit {
    pub fn new(composite_id: impl Into<String>, score: f32) -> Self {
        Self {
            composite_id: composite_id.into(),
            score,
        }
    }
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Register (or replace) the entry keyed `"<id> <tag>"`.
    async fn upsert(&self, text: &str, id: &str, tag: &TypeTag) -> Result<(), PipelineError>;

    /// Drop the entry keyed `"<id> <tag>"`, if present.
    async fn delete(&self, id: &str, tag: &TypeTag) -> Result<(), PipelineError>;

    /// Hits for the query text, best first.
    async fn search(&self, query: &str) -> Result<Vec<VectorHit>, PipelineError>;
}
