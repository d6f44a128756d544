//! Retrieval and ingestion over restaurant and menu documents.
//!
//! This module provides:
//! - `ChatPipeline`: vector search, relationship expansion, prompt building and generation
//! - `IngestionPipeline`: stores scraped records and registers their embeddings
//! - `DocumentStore` / `VectorIndex`: the two persistence seams, with SQLite
//!   and Pinecone implementations

pub mod expander;
pub mod ingest;
pub mod intent;
pub mod key;
pub mod pinecone;
pub mod pipeline;
pub mod prompt;
pub mod selector;
pub mod sqlite;
pub mod store;
pub mod vector;
pub mod vector_sqlite;

#[cfg(test)]
pub(crate) mod test_support;

pub use expander::RelationshipExpander;
pub use ingest::{load_records, IngestReport, IngestionPipeline};
pub use pinecone::PineconeIndex;
pub use pipeline::{ChatOptions, ChatOutcome, ChatPipeline, ContextRef, OutcomeKind};
pub use sqlite::SqliteDocumentStore;
pub use store::DocumentStore;
pub use vector::{VectorHit, VectorIndex};
pub use vector_sqlite::SqliteVectorIndex;
