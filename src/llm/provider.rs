use async_trait::async_trait;

use crate::core::errors::PipelineError;

/// Prompt in, answer text out.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// return the provider name (e.g. "openai", "gemini")
    fn name(&self) -> &str;

    /// `Ok(None)` when the model produced no usable text.
    async fn generate(&self, prompt: &str) -> Result<Option<String>, PipelineError>;
}

/// Text embedding backend used by the local vector index.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}
