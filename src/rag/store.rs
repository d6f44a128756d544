//! DocumentStore trait: structured record access for restaurants and menu items.
//!
//! The primary implementation is `SqliteDocumentStore` in the `sqlite` module.

use async_trait::async_trait;

use crate::core::errors::PipelineError;
use crate::models::{Document, StoreId, StoredDocument};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id. Absent documents are `Ok(None)`.
    async fn get(&self, id: &StoreId) -> Result<Option<StoredDocument>, PipelineError>;

    /// Persist a new document and return its store-assigned id.
    async fn insert(&self, document: &Document) -> Result<StoreId, PipelineError>;

    /// Append a menu item id to a restaurant's `menu_items` list in place.
    async fn append_menu_item(
        &self,
        restaurant_id: &StoreId,
        menu_item_id: &str,
    ) -> Result<(), PipelineError>;

    /// First restaurant (in insertion order) whose `menu_items` contains the id.
    async fn find_restaurant_by_menu_item(
        &self,
        menu_item_id: &str,
    ) -> Result<Option<StoredDocument>, PipelineError>;

    /// Remove a document. Deleting an absent id is not an error.
    async fn delete(&self, id: &StoreId) -> Result<(), PipelineError>;

    /// Total number of stored documents.
    async fn count(&self) -> Result<usize, PipelineError>;
}
