//! Relationship expansion: resolves a vector hit into a stored document and
//! attaches its related documents (menu items of a restaurant, or the owning
//! restaurant of a menu item).

use std::sync::Arc;

use futures_util::stream::{self, StreamExt};

use super::key::CompositeKey;
use super::store::DocumentStore;
use crate::core::errors::{ExpansionError, PipelineError};
use crate::models::{Document, EnrichedDocument, Relation, StoreId, StoredDocument, TypeTag};

#[derive(Clone)]
pub struct RelationshipExpander {
    store: Arc<dyn DocumentStore>,
    /// Child lookups in flight at once. Results keep input order regardless.
    concurrency: usize,
}

impl RelationshipExpander {
    pub fn new(store: Arc<dyn DocumentStore>, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve a decoded key. `Ok(None)` when the document does not exist.
    pub async fn resolve(
        &self,
        key: &CompositeKey,
        score: Option<f32>,
    ) -> Result<Option<EnrichedDocument>, PipelineError> {
        let id = key.store_id()?;
        let Some(stored) = self.store.get(&id).await? else {
            tracing::debug!("No document for key {}", key);
            return Ok(None);
        };

        Ok(Some(self.expand(stored, key.tag.clone(), score).await))
    }

    pub async fn expand(
        &self,
        stored: StoredDocument,
        tag: TypeTag,
        score: Option<f32>,
    ) -> EnrichedDocument {
        let relation = match tag {
            TypeTag::Restaurant => {
                let child_ids = stored
                    .as_restaurant()
                    .map(|r| r.menu_items.clone())
                    .unwrap_or_default();
                Relation::Menus(self.fetch_children(&child_ids).await)
            }
            TypeTag::Menu => match self.find_parent(&stored.id).await {
                Ok(Some(parent)) => Relation::Restaurant(Box::new(parent)),
                Ok(None) => Relation::None,
                Err(err) => {
                    tracing::warn!("Parent lookup for menu item {} failed: {}", stored.id, err);
                    Relation::None
                }
            },
            TypeTag::Other(_) => Relation::None,
        };

        EnrichedDocument {
            stored,
            score,
            vector_type: tag,
            relation,
        }
    }

    /// Resolvable children in stored order; failures are logged and dropped.
    pub async fn fetch_children(&self, child_ids: &[String]) -> Vec<StoredDocument> {
        let store = self.store.clone();
        let results: Vec<Result<StoredDocument, ExpansionError>> = stream::iter(child_ids.to_vec())
            .map(move |raw| fetch_child(store.clone(), raw))
            .buffered(self.concurrency)
            .collect()
            .await;

        results
            .into_iter()
            .filter_map(|result| match result {
                Ok(doc) => Some(doc),
                Err(err) => {
                    tracing::warn!("Skipping menu item: {}", err);
                    None
                }
            })
            .collect()
    }

    async fn find_parent(&self, menu_item_id: &StoreId) -> Result<Option<StoredDocument>, PipelineError> {
        let parent = self
            .store
            .find_restaurant_by_menu_item(&menu_item_id.to_string())
            .await?;

        Ok(parent.map(|mut parent| {
            if let Document::Restaurant(restaurant) = &mut parent.document {
                restaurant.menu_items.clear();
            }
            parent
        }))
    }
}

/// Takes owned arguments so the buffered futures stay `Send`.
async fn fetch_child(
    store: Arc<dyn DocumentStore>,
    raw_id: String,
) -> Result<StoredDocument, ExpansionError> {
    let Ok(id) = StoreId::parse(&raw_id) else {
        return Err(ExpansionError::InvalidId(raw_id));
    };
    match store.get(&id).await {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => Err(ExpansionError::NotFound(raw_id)),
        Err(source) => Err(ExpansionError::Store { id: raw_id, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::key;
    use crate::rag::test_support::{menu_item, restaurant, temp_store};

    #[tokio::test]
    async fn restaurant_expands_to_menus_in_stored_order() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Kake Di Hatti")).await.unwrap();
        let mut ids = Vec::new();
        for name in ["Butter Chicken", "Amritsari Kulcha", "Lassi"] {
            let mid = store.insert(&menu_item(name, &rid)).await.unwrap();
            store.append_menu_item(&rid, &mid.to_string()).await.unwrap();
            ids.push(mid);
        }

        let expander = RelationshipExpander::new(store.clone(), 1);
        let key = key::decode(&format!("{} restaurant", rid)).unwrap();
        let enriched = expander.resolve(&key, Some(0.9)).await.unwrap().unwrap();

        let menu_ids: Vec<StoreId> = enriched.menus().iter().map(|m| m.id).collect();
        assert_eq!(menu_ids, ids);
        assert_eq!(enriched.vector_type, TypeTag::Restaurant);
        assert_eq!(enriched.score, Some(0.9));
    }

    #[tokio::test]
    async fn broken_children_are_skipped() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Tanatan")).await.unwrap();
        let good = store.insert(&menu_item("Chole", &rid)).await.unwrap();
        store.append_menu_item(&rid, "not-a-uuid").await.unwrap();
        store.append_menu_item(&rid, &good.to_string()).await.unwrap();
        store
            .append_menu_item(&rid, &StoreId::new().to_string())
            .await
            .unwrap();

        let expander = RelationshipExpander::new(store.clone(), 4);
        let stored = store.get(&rid).await.unwrap().unwrap();
        let enriched = expander.expand(stored, TypeTag::Restaurant, None).await;

        assert_eq!(enriched.menus().len(), 1);
        assert_eq!(enriched.menus()[0].id, good);
    }

    #[tokio::test]
    async fn concurrent_fetch_preserves_order() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Fosho")).await.unwrap();
        let mut ids = Vec::new();
        for i in 0..12 {
            let mid = store.insert(&menu_item(&format!("Dish {}", i), &rid)).await.unwrap();
            ids.push(mid.to_string());
        }

        let expander = RelationshipExpander::new(store.clone(), 5);
        let children = expander.fetch_children(&ids).await;
        let fetched: Vec<String> = children.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(fetched, ids);
    }

    #[tokio::test]
    async fn menu_item_gets_parent_without_menu_list() {
        let store = temp_store().await;
        let rid = store.insert(&restaurant("Dosa Planet")).await.unwrap();
        let mid = store.insert(&menu_item("Rava Dosa", &rid)).await.unwrap();
        store.append_menu_item(&rid, &mid.to_string()).await.unwrap();

        let expander = RelationshipExpander::new(store.clone(), 1);
        let key = key::decode(&format!("{} menu", mid)).unwrap();
        let enriched = expander.resolve(&key, None).await.unwrap().unwrap();

        let parent = enriched.parent().unwrap();
        assert_eq!(parent.id, rid);
        assert!(parent.as_restaurant().unwrap().menu_items.is_empty());
        assert!(enriched.fields()["restaurant"].get("menu_items").is_none());
    }

    #[tokio::test]
    async fn orphan_menu_item_has_no_parent() {
        let store = temp_store().await;
        let mid = store
            .insert(&menu_item("Kulfi", &StoreId::new()))
            .await
            .unwrap();

        let expander = RelationshipExpander::new(store.clone(), 1);
        let stored = store.get(&mid).await.unwrap().unwrap();
        let enriched = expander.expand(stored, TypeTag::Menu, None).await;

        assert_eq!(enriched.relation, Relation::None);
    }

    #[tokio::test]
    async fn missing_document_resolves_to_none() {
        let store = temp_store().await;
        let expander = RelationshipExpander::new(store, 1);
        let key = key::decode(&format!("{} menu", StoreId::new())).unwrap();

        assert!(expander.resolve(&key, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_id_is_an_error_for_the_caller_to_skip() {
        let store = temp_store().await;
        let expander = RelationshipExpander::new(store, 1);
        let key = key::decode("garbage restaurant").unwrap();

        assert!(matches!(
            expander.resolve(&key, None).await,
            Err(PipelineError::InvalidId(_))
        ));
    }
}
