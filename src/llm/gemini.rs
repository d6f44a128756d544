use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerativeClient;
use super::types::non_blank;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::{PipelineError, Upstream};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `generateContent`.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    temperature: Option<f64>,
    max_tokens: Option<i32>,
    client: Client,
}

impl GeminiClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, PipelineError> {
        let api_key = settings.api_key.clone().ok_or_else(|| {
            PipelineError::upstream(Upstream::Generation, "gemini requires llm.api_key")
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        let base_url = if settings.base_url.contains("generativelanguage") {
            settings.base_url.trim_end_matches('/').to_string()
        } else {
            DEFAULT_BASE_URL.to_string()
        };

        Ok(Self {
            base_url,
            model: settings.model.clone(),
            api_key,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        let mut generation = serde_json::Map::new();
        if let Some(t) = self.temperature { generation.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = self.max_tokens { generation.insert("maxOutputTokens".to_string(), json!(t)); }
        if !generation.is_empty() {
            body["generationConfig"] = Value::Object(generation);
        }

        body
    }
}

#[async_trait]
impl GenerativeClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, PipelineError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::upstream(
                Upstream::Generation,
                format!("gemini returned {}: {}", status, text),
            ));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| PipelineError::upstream(Upstream::Generation, e))?;

        Ok(extract_candidate_text(&payload))
    }
}

/// Concatenated text parts of the first candidate.
fn extract_candidate_text(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    non_blank(&text)
}
