//! Top-level chat handler: search → select → resolve → prompt → generate.
//!
//! `ChatPipeline::answer` never fails. Upstream failures and empty results
//! become a short user-facing message instead.

use std::sync::Arc;

use serde::Serialize;

use super::expander::RelationshipExpander;
use super::intent::{self, QueryIntent};
use super::key;
use super::prompt::{self, PromptStyle};
use super::selector;
use super::store::DocumentStore;
use super::vector::{VectorHit, VectorIndex};
use crate::core::errors::PipelineError;
use crate::llm::GenerativeClient;
use crate::models::EnrichedDocument;

pub const NO_MATCHES: &str = "No matches found.";
pub const NO_VALID_DOCUMENTS: &str = "No valid documents found.";
pub const NO_RESPONSE: &str = "No response generated.";

/// Pipeline tuning taken from `PipelineSettings`.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub child_fetch_concurrency: usize,
    pub detect_small_talk: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            child_fetch_concurrency: 1,
            detect_small_talk: true,
        }
    }
}

/// Composite key and score of a document that went into the prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextRef {
    pub key: String,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Answered,
    NoMatches,
    NoValidDocuments,
    NoResponse,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub response: String,
    pub kind: OutcomeKind,
    pub context: Vec<ContextRef>,
}

impl ChatOutcome {
    fn message(kind: OutcomeKind, response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            kind,
            context: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct ChatPipeline {
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerativeClient>,
    expander: RelationshipExpander,
    options: ChatOptions,
}

impl ChatPipeline {
    pub fn new(
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn DocumentStore>,
        generator: Arc<dyn GenerativeClient>,
        options: ChatOptions,
    ) -> Self {
        let expander = RelationshipExpander::new(store, options.child_fetch_concurrency);
        Self {
            index,
            generator,
            expander,
            options,
        }
    }

    /// Answer one user message.
    pub async fn answer(&self, message: &str) -> ChatOutcome {
        if self.options.detect_small_talk && intent::classify(message) == QueryIntent::SmallTalk {
            tracing::debug!("Small talk, skipping retrieval");
            return self.generate(message, &[]).await;
        }

        let hits = match self.index.search(message).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::error!("Vector search failed: {}", err);
                return ChatOutcome::message(
                    OutcomeKind::Failed,
                    format!("Error fetching from vector store: {}", err),
                );
            }
        };

        if hits.is_empty() {
            return ChatOutcome::message(OutcomeKind::NoMatches, NO_MATCHES);
        }

        let docs = match self.resolve_hits(selector::select(&hits)).await {
            Ok(docs) => docs,
            Err(err) => {
                tracing::error!("Document lookup failed: {}", err);
                return ChatOutcome::message(
                    OutcomeKind::Failed,
                    format!("Error fetching from document store: {}", err),
                );
            }
        };
        if docs.is_empty() {
            return ChatOutcome::message(OutcomeKind::NoValidDocuments, NO_VALID_DOCUMENTS);
        }

        tracing::info!("Resolved {} of {} hits for query", docs.len(), hits.len());
        self.generate(message, &docs).await
    }

    /// Resolve hits in order, skipping any that cannot be decoded, parsed or found.
    ///
    /// Store failures are skipped too while at least one hit resolves; when
    /// none does, the last store failure is returned.
    pub async fn resolve_hits(
        &self,
        hits: &[VectorHit],
    ) -> Result<Vec<EnrichedDocument>, PipelineError> {
        let mut docs = Vec::with_capacity(hits.len());
        let mut store_failure = None;
        for hit in hits {
            match self.resolve_hit(hit).await {
                Ok(Some(doc)) => docs.push(doc),
                Ok(None) => tracing::debug!("Hit {:?} has no stored document", hit.composite_id),
                Err(err @ PipelineError::Upstream { .. }) => {
                    tracing::warn!("Store lookup for hit {:?} failed: {}", hit.composite_id, err);
                    store_failure = Some(err);
                }
                Err(err) => tracing::warn!("Skipping hit {:?}: {}", hit.composite_id, err),
            }
        }

        match store_failure {
            Some(err) if docs.is_empty() => Err(err),
            _ => Ok(docs),
        }
    }

    async fn resolve_hit(&self, hit: &VectorHit) -> Result<Option<EnrichedDocument>, PipelineError> {
        let decoded = key::decode(&hit.composite_id)?;
        self.expander.resolve(&decoded, Some(hit.score)).await
    }

    async fn generate(&self, message: &str, docs: &[EnrichedDocument]) -> ChatOutcome {
        let prompt = prompt::build(message, docs);
        let context = match prompt::style_for(docs) {
            PromptStyle::Grounded => docs.iter().map(context_ref).collect(),
            PromptStyle::Fallback => Vec::new(),
        };

        match self.generator.generate(&prompt).await {
            Ok(Some(response)) => ChatOutcome {
                response,
                kind: OutcomeKind::Answered,
                context,
            },
            Ok(None) => ChatOutcome::message(OutcomeKind::NoResponse, NO_RESPONSE),
            Err(err) => {
                tracing::error!("Generation failed: {}", err);
                ChatOutcome::message(
                    OutcomeKind::Failed,
                    format!("Error generating content: {}", err),
                )
            }
        }
    }
}

fn context_ref(doc: &EnrichedDocument) -> ContextRef {
    ContextRef {
        key: key::encode(&doc.stored.id.to_string(), &doc.vector_type),
        score: doc.score,
    }
}
