//! In-process fakes shared by the rag unit tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::key;
use super::sqlite::SqliteDocumentStore;
use super::store::DocumentStore;
use super::vector::{VectorHit, VectorIndex};
use crate::core::errors::{PipelineError, Upstream};
use crate::llm::{Embedder, GenerativeClient};
use crate::models::{Document, MenuItem, Restaurant, StoreId, StoredDocument, TypeTag};

const KEYWORD_DIMS: usize = 256;

pub async fn temp_store() -> Arc<SqliteDocumentStore> {
    let tmp = std::env::temp_dir().join(format!("menu-rag-docs-{}.db", uuid::Uuid::new_v4()));
    Arc::new(SqliteDocumentStore::with_path(tmp).await.unwrap())
}

pub fn restaurant(name: &str) -> Document {
    Document::Restaurant(Restaurant {
        name: name.to_string(),
        cuisine: "North Indian".to_string(),
        address: None,
        menu_items: Vec::new(),
        extra: BTreeMap::new(),
    })
}

pub fn menu_item(name: &str, restaurant_id: &StoreId) -> Document {
    Document::MenuItem(MenuItem {
        name: name.to_string(),
        description: String::new(),
        price: 200.0,
        attributes: BTreeMap::new(),
        restaurant_id: restaurant_id.to_string(),
        extra: BTreeMap::new(),
    })
}

/// Hashed bag-of-words embedding; texts sharing words score above zero.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    fn embed_one(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; KEYWORD_DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let hash = word
                .bytes()
                .fold(0xcbf29ce484222325_u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % KEYWORD_DIMS as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError> {
        Ok(inputs.iter().map(|text| Self::embed_one(text)).collect())
    }
}

fn index_offline() -> PipelineError {
    PipelineError::upstream(Upstream::VectorIndex, "index offline")
}

fn store_offline() -> PipelineError {
    PipelineError::upstream(Upstream::DocumentStore, "connection refused")
}

/// Records upserts and answers searches with canned hits.
#[derive(Default)]
pub struct RecordingIndex {
    upserts: Mutex<Vec<(String, String)>>,
    hits: Vec<VectorHit>,
    fail: bool,
    rejected_tag: Option<TypeTag>,
}

impl RecordingIndex {
    pub fn with_hits(hits: Vec<VectorHit>) -> Self {
        Self {
            hits,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Fails upserts for one tag only.
    pub fn rejecting(tag: TypeTag) -> Self {
        Self {
            rejected_tag: Some(tag),
            ..Self::default()
        }
    }

    /// `(text, composite key)` pairs still registered, in upsert order.
    pub fn upserts(&self) -> Vec<(String, String)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn upsert(&self, text: &str, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        if self.fail || self.rejected_tag.as_ref() == Some(tag) {
            return Err(index_offline());
        }
        self.upserts
            .lock()
            .unwrap()
            .push((text.to_string(), key::encode(id, tag)));
        Ok(())
    }

    async fn delete(&self, id: &str, tag: &TypeTag) -> Result<(), PipelineError> {
        let composite = key::encode(id, tag);
        self.upserts.lock().unwrap().retain(|(_, k)| *k != composite);
        Ok(())
    }

    async fn search(&self, _query: &str) -> Result<Vec<VectorHit>, PipelineError> {
        if self.fail {
            return Err(index_offline());
        }
        Ok(self.hits.clone())
    }
}

/// Real SQLite store with selected operations failing as if the database were down.
pub struct FaultyStore {
    inner: Arc<SqliteDocumentStore>,
    fail_get: bool,
    fail_append: bool,
    fail_parent_lookup: bool,
}

impl FaultyStore {
    pub fn wrapping(inner: Arc<SqliteDocumentStore>) -> Self {
        Self {
            inner,
            fail_get: false,
            fail_append: false,
            fail_parent_lookup: false,
        }
    }

    pub fn failing_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    pub fn failing_append(mut self) -> Self {
        self.fail_append = true;
        self
    }

    pub fn failing_parent_lookup(mut self) -> Self {
        self.fail_parent_lookup = true;
        self
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get(&self, id: &StoreId) -> Result<Option<StoredDocument>, PipelineError> {
        if self.fail_get {
            return Err(store_offline());
        }
        self.inner.get(id).await
    }

    async fn insert(&self, document: &Document) -> Result<StoreId, PipelineError> {
        self.inner.insert(document).await
    }

    async fn append_menu_item(
        &self,
        restaurant_id: &StoreId,
        menu_item_id: &str,
    ) -> Result<(), PipelineError> {
        if self.fail_append {
            return Err(store_offline());
        }
        self.inner.append_menu_item(restaurant_id, menu_item_id).await
    }

    async fn find_restaurant_by_menu_item(
        &self,
        menu_item_id: &str,
    ) -> Result<Option<StoredDocument>, PipelineError> {
        if self.fail_parent_lookup {
            return Err(store_offline());
        }
        self.inner.find_restaurant_by_menu_item(menu_item_id).await
    }

    async fn delete(&self, id: &StoreId) -> Result<(), PipelineError> {
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        self.inner.count().await
    }
}

enum Reply {
    Text(String),
    Silent,
    Fail,
}

/// Generative client that records every prompt it receives.
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    reply: Reply,
}

impl RecordingGenerator {
    fn with_reply(reply: Reply) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply,
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_reply(Reply::Text(text.to_string()))
    }

    pub fn silent() -> Self {
        Self::with_reply(Reply::Silent)
    }

    pub fn failing() -> Self {
        Self::with_reply(Reply::Fail)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeClient for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<String>, PipelineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(Some(text.clone())),
            Reply::Silent => Ok(None),
            Reply::Fail => Err(PipelineError::upstream(Upstream::Generation, "quota exceeded")),
        }
    }
}
