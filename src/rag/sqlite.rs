//! SQLite-backed document store.
//!
//! Documents are kept as JSON bodies next to their kind; relationship
//! membership queries go through SQLite's JSON functions.

use std::path::PathBuf;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::DocumentStore;
use crate::core::config::AppPaths;
use crate::core::errors::PipelineError;
use crate::models::{Document, DocumentKind, StoreId, StoredDocument};

pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, PipelineError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, PipelineError> {
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
            .map_err(PipelineError::store)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), PipelineError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (STRFTIME('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_kind ON documents(kind)")
            .execute(&self.pool)
            .await
            .map_err(PipelineError::store)?;

        Ok(())
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<StoredDocument, PipelineError> {
        let id: String = row.get("id");
        let kind: String = row.get("kind");
        let body: String = row.get("body");

        let id = StoreId::parse(&id)?;
        let kind = DocumentKind::parse(&kind)
            .ok_or_else(|| PipelineError::store(format!("unknown document kind {:?}", kind)))?;
        let body = serde_json::from_str(&body).map_err(PipelineError::store)?;
        let document = Document::from_body(kind, body).map_err(PipelineError::store)?;

        Ok(StoredDocument { id, document })
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, id: &StoreId) -> Result<Option<StoredDocument>, PipelineError> {
        let row = sqlx::query("SELECT id, kind, body FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(PipelineError::store)?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn insert(&self, document: &Document) -> Result<StoreId, PipelineError> {
        let id = StoreId::new();
        let body = document.to_body().map_err(PipelineError::store)?;

        sqlx::query("INSERT INTO documents (id, kind, body) VALUES (?1, ?2, ?3)")
            .bind(id.to_string())
            .bind(document.kind().as_str())
            .bind(body.to_string())
            .execute(&self.pool)
            .await
            .map_err(PipelineError::store)?;

        Ok(id)
    }

    async fn append_menu_item(
        &self,
        restaurant_id: &StoreId,
        menu_item_id: &str,
    ) -> Result<(), PipelineError> {
        let result = sqlx::query(
            "UPDATE documents
             SET body = json_insert(body, '$.menu_items[#]', ?2)
             WHERE id = ?1 AND kind = ?3",
        )
        .bind(restaurant_id.to_string())
        .bind(menu_item_id)
        .bind(DocumentKind::Restaurant.as_str())
        .execute(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        if result.rows_affected() == 0 {
            return Err(PipelineError::NotFound(restaurant_id.to_string()));
        }
        Ok(())
    }

    async fn find_restaurant_by_menu_item(
        &self,
        menu_item_id: &str,
    ) -> Result<Option<StoredDocument>, PipelineError> {
        let row = sqlx::query(
            "SELECT d.id, d.kind, d.body
             FROM documents d
             WHERE d.kind = ?1
               AND EXISTS (
                   SELECT 1 FROM json_each(d.body, '$.menu_items') AS m
                   WHERE m.value = ?2
               )
             ORDER BY d.rowid
             LIMIT 1",
        )
        .bind(DocumentKind::Restaurant.as_str())
        .bind(menu_item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(PipelineError::store)?;

        row.as_ref().map(Self::row_to_document).transpose()
    }

    async fn delete(&self, id: &StoreId) -> Result<(), PipelineError> {
        sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(PipelineError::store)?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(PipelineError::store)?;

        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::test_support::{menu_item, restaurant, temp_store};

    #[tokio::test]
    async fn insert_and_get() {
        let store = temp_store().await;

        let id = store.insert(&restaurant("Kake Di Hatti")).await.unwrap();
        let stored = store.get(&id).await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.document.name(), "Kake Di Hatti");
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get(&StoreId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_menu_item_preserves_order() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Tanatan")).await.unwrap();

        let first = store.insert(&menu_item("Dal Makhani", &rid)).await.unwrap();
        let second = store.insert(&menu_item("Naan", &rid)).await.unwrap();
        store.append_menu_item(&rid, &first.to_string()).await.unwrap();
        store.append_menu_item(&rid, &second.to_string()).await.unwrap();

        let stored = store.get(&rid).await.unwrap().unwrap();
        let menu_items = &stored.as_restaurant().unwrap().menu_items;
        assert_eq!(menu_items, &vec![first.to_string(), second.to_string()]);
    }

    #[tokio::test]
    async fn append_to_missing_restaurant_is_not_found() {
        let store = temp_store().await;
        let err = store
            .append_menu_item(&StoreId::new(), "whatever")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_only_the_given_document() {
        let store = temp_store().await;
        let keep = store.insert(&restaurant("Royal Cafe")).await.unwrap();
        let gone = store.insert(&restaurant("Tunday Kababi")).await.unwrap();

        store.delete(&gone).await.unwrap();
        store.delete(&gone).await.unwrap();

        assert!(store.get(&gone).await.unwrap().is_none());
        assert!(store.get(&keep).await.unwrap().is_some());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn find_parent_by_menu_membership() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Curry Leaf")).await.unwrap();
        let other = store.insert(&restaurant("Fosho")).await.unwrap();
        let mid = store.insert(&menu_item("Appam", &rid)).await.unwrap();
        store.append_menu_item(&rid, &mid.to_string()).await.unwrap();

        let parent = store
            .find_restaurant_by_menu_item(&mid.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(parent.id, rid);
        assert_ne!(parent.id, other);

        let none = store.find_restaurant_by_menu_item("missing").await.unwrap();
        assert!(none.is_none());
    }
}
