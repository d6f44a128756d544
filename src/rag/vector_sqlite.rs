//! SQLite-backed vector index.
//!
//! In-process index using SQLite for storage and brute-force cosine
//! similarity for search. Text is embedded through an `Embedder`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::key;
use super::vector::{VectorHit, VectorIndex};
use crate::core::errors::{PipelineError, Upstream};
use crate::llm::Embedder;
use crate::models::TypeTag;

pub struct SqliteVectorIndex {
    pool: SqlitePool,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl SqliteVectorIndex {
    pub async fn with_path(
        db_path: PathBuf,
        embedder: Arc<dyn Embedder>,
        top_k: usize,
    ) -> Result<Self, PipelineError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(index_error)?;

        let index = Self {
            pool,
            embedder,
            top_k,
        };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vectors (
                composite_id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(index_error)?;

        Ok(())
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, PipelineError> {
        self.embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::upstream(Upstream::Embedding, "empty embedding response"))
    }

    pub async fn count(&self) -> Result<usize, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vectors")
            .fetch_one(&self.pool)
            .await
            .map_err(index_error)?;
        Ok(count as usize)
    }

    fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }
}

fn index_error<E: std::fmt::Display>(err: E) -> PipelineError {
    PipelineError::upstream(Upstream::VectorIndex, err)
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert(&self, text: &str, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        let embedding = self.embed_one(text).await?;
        let blob = Self::serialize_embedding(&embedding);

        sqlx::query(
            "INSERT OR REPLACE INTO vectors (composite_id, content, embedding)
             VALUES (?1, ?2, ?3)",
        )
        .bind(key::encode(id, tag))
        .bind(text)
        .bind(&blob)
        .execute(&self.pool)
        .await
        .map_err(index_error)?;

        Ok(())
    }

    async fn delete(&self, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        sqlx::query("DELETE FROM vectors WHERE composite_id = ?1")
            .bind(key::encode(id, tag))
            .execute(&self.pool)
            .await
            .map_err(index_error)?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<VectorHit>, PipelineError> {
        let query_embedding = self.embed_one(query).await?;

        let rows = sqlx::query("SELECT composite_id, embedding FROM vectors")
            .fetch_all(&self.pool)
            .await
            .map_err(index_error)?;

        let mut scored: Vec<VectorHit> = rows
            .iter()
            .filter_map(|row| {
                let embedding_bytes: Vec<u8> = row.get("embedding");
                if embedding_bytes.is_empty() {
                    return None;
                }
                let stored = Self::deserialize_embedding(&embedding_bytes);
                let score = Self::cosine_similarity(&query_embedding, &stored);
                Some(VectorHit::new(row.get::<String, _>("composite_id"), score))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(self.top_k.max(1));

        Ok(scored)
    }
}
