//! Typed view over `config.yml` + `secrets.yaml`.
//!
//! Every field has a default so an empty or missing config file still
//! produces a runnable setup (local SQLite index, OpenAI-compatible LLM
//! on localhost).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub vector_index: VectorIndexSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub pipeline: PipelineSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 0,
            cors_origins: vec!["http://localhost:8501".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorBackend {
    #[default]
    Sqlite,
    Pinecone,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorIndexSettings {
    pub backend: VectorBackend,
    /// Number of hits requested from the index per query.
    pub top_k: usize,
    pub pinecone: PineconeSettings,
}

impl Default for VectorIndexSettings {
    fn default() -> Self {
        Self {
            backend: VectorBackend::default(),
            top_k: 5,
            pinecone: PineconeSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeSettings {
    /// Index host, e.g. `https://menu-rag-abc123.svc.us-east-1.pinecone.io`.
    pub host: String,
    pub api_key: Option<String>,
    pub namespace: String,
    /// Record field the integrated embedding model reads.
    pub text_field: String,
}

impl Default for PineconeSettings {
    fn default() -> Self {
        Self {
            host: String::new(),
            api_key: None,
            namespace: "menu-rag".to_string(),
            text_field: "chunk_text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            model: "text-embedding-nomic-embed-text-v1.5".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    #[default]
    Openai,
    Gemini,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::default(),
            base_url: "http://localhost:1234".to_string(),
            model: "local-model".to_string(),
            api_key: None,
            temperature: None,
            max_tokens: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Parallel child lookups during restaurant expansion; 1 keeps them sequential.
    pub child_fetch_concurrency: usize,
    /// Answer greetings and self-description questions without retrieval.
    pub detect_small_talk: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            child_fetch_concurrency: 1,
            detect_small_talk: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub source_path: Option<PathBuf>,
}
