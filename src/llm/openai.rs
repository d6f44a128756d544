use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{Embedder, GenerativeClient};
use super::types::{non_blank, ChatMessage, ChatRequest};
use crate::core::config::settings::{EmbeddingSettings, LlmSettings};
use crate::core::errors::{PipelineError, Upstream};

/// OpenAI-compatible chat completions (OpenAI, LM Studio, Ollama, vLLM...).
#[derive(Clone)]
pub struct OpenAiCompatClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    settings: LlmSettings,
    client: Client,
}

impl OpenAiCompatClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            settings: settings.clone(),
            client,
        })
    }

    fn chat_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
            if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
        }

        body
    }
}

#[async_trait]
impl GenerativeClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, PipelineError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]).with_settings(&self.settings);

        let mut builder = self.client.post(&url).json(&self.chat_body(&request));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder
            .send()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                Upstream::Generation,
                format!("chat completion returned {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        Ok(extract_chat_content(&payload))
    }
}

fn extract_chat_content(payload: &Value) -> Option<String> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .and_then(non_blank)
}

/// OpenAI-compatible `/v1/embeddings`.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(settings: &EmbeddingSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        let url = format!("{}/v1/embeddings", self.base_url);

        let body = json!({
            "model": self.model,
            "input": inputs,
        });

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let res = builder
            .send()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Embedding, e))?;

        if !res.status().is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                Upstream::Embedding,
                format!("embedding error: {}", text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Embedding, e))?;

        let embeddings = extract_embeddings(&payload);
        if embeddings.len() != inputs.len() {
            return Err(PipelineError::upstream(
                Upstream::Embedding,
                format!("expected {} embeddings, got {}", inputs.len(), embeddings.len()),
            ));
        }
        Ok(embeddings)
    }
}

fn extract_embeddings(payload: &Value) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::new();
    if let Some(data) = payload["data"].as_array() {
        for item in data {
            if let Some(vals) = item["embedding"].as_array() {
                let vec: Vec<f32> = vals.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect();
                embeddings.push(vec);
            }
        }
    }
    embeddings
}
