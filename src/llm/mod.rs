pub mod gemini;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;

pub use gemini::GeminiClient;
pub use openai::{OpenAiCompatClient, OpenAiEmbedder};
pub use provider::{Embedder, GenerativeClient};
pub use types::{ChatMessage, ChatRequest};

use crate::core::config::settings::{LlmProviderKind, LlmSettings};
use crate::core::errors::PipelineError;

/// Build the configured generative client.
pub fn build_generator(settings: &LlmSettings) -> Result<Arc<dyn GenerativeClient>, PipelineError> {
    let client: Arc<dyn GenerativeClient> = match settings.provider {
        LlmProviderKind::Openai => Arc::new(OpenAiCompatClient::new(settings)?),
        LlmProviderKind::Gemini => Arc::new(GeminiClient::new(settings)?),
    };
    tracing::info!("Using {} generative client ({})", client.name(), settings.model);
    Ok(client)
}
