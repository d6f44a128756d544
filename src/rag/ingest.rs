//! Ingestion of scraped restaurant records.
//!
//! Each restaurant is stored without its menu, embedded from its own fields,
//! and then linked to each menu item as that item is stored and embedded.
//! A failing record or menu item is reported and skipped; the batch goes on.
//! Whatever a failed step already wrote is removed again, so every stored
//! document keeps exactly one vector entry.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::store::DocumentStore;
use super::vector::VectorIndex;
use crate::core::errors::PipelineError;
use crate::models::{render_value, Document, MenuItem, Restaurant, StoreId, TypeTag};

/// One scraped restaurant object, including its nested `menu_items`.
pub type RawRestaurantRecord = Map<String, Value>;

const MENU_ITEMS_FIELD: &str = "menu_items";
const CUISINE_FIELD: &str = "cuisine";
const CUISINE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub restaurants: usize,
    pub menu_items: usize,
    pub failures: Vec<IngestFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    /// Position of the restaurant record in the input.
    pub record: usize,
    /// Position of the menu item within the record, if the item failed.
    pub menu_item: Option<usize>,
    pub name: Option<String>,
    pub error: String,
}

#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, index: Arc<dyn VectorIndex>) -> Self {
        Self { store, index }
    }

    pub async fn ingest(&self, records: Vec<Value>) -> IngestReport {
        let mut report = IngestReport::default();
        let total = records.len();

        for (idx, record) in records.into_iter().enumerate() {
            let name = record.get("name").and_then(Value::as_str).map(str::to_string);
            if let Err(err) = self.ingest_record(idx, record, &mut report).await {
                tracing::warn!("Skipping restaurant record {} ({:?}): {}", idx, name, err);
                report.failures.push(IngestFailure {
                    record: idx,
                    menu_item: None,
                    name,
                    error: err.to_string(),
                });
            }
        }

        tracing::info!(
            "Ingested {} restaurants and {} menu items from {} records ({} failures)",
            report.restaurants,
            report.menu_items,
            total,
            report.failures.len()
        );
        report
    }

    async fn ingest_record(
        &self,
        idx: usize,
        record: Value,
        report: &mut IngestReport,
    ) -> Result<(), PipelineError> {
        let Value::Object(mut fields) = record else {
            return Err(PipelineError::InvalidRecord("record is not an object".to_string()));
        };

        let menu_items = take_menu_items(&mut fields)?;
        normalize_cuisine(&mut fields);

        let restaurant: Restaurant = serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| PipelineError::InvalidRecord(e.to_string()))?;

        let restaurant_id = self.store.insert(&Document::Restaurant(restaurant)).await?;
        // embedded before any menu item is linked: menu content never reaches this vector
        if let Err(err) = self
            .index
            .upsert(&flatten_fields(&fields), &restaurant_id.to_string(), &TypeTag::Restaurant)
            .await
        {
            self.discard_document(&restaurant_id).await;
            return Err(err);
        }
        report.restaurants += 1;

        for (item_idx, item) in menu_items.into_iter().enumerate() {
            let item_name = item.get("name").and_then(Value::as_str).map(str::to_string);
            match self.ingest_menu_item(&restaurant_id, item).await {
                Ok(_) => report.menu_items += 1,
                Err(err) => {
                    tracing::warn!(
                        "Skipping menu item {} of record {} ({:?}): {}",
                        item_idx,
                        idx,
                        item_name,
                        err
                    );
                    report.failures.push(IngestFailure {
                        record: idx,
                        menu_item: Some(item_idx),
                        name: item_name,
                        error: err.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    async fn ingest_menu_item(
        &self,
        restaurant_id: &StoreId,
        item: Value,
    ) -> Result<StoreId, PipelineError> {
        let Value::Object(source_fields) = item else {
            return Err(PipelineError::InvalidRecord("menu item is not an object".to_string()));
        };

        let mut fields = source_fields.clone();
        fields.insert(
            "restaurant_id".to_string(),
            Value::String(restaurant_id.to_string()),
        );
        let menu_item: MenuItem = serde_json::from_value(Value::Object(fields))
            .map_err(|e| PipelineError::InvalidRecord(e.to_string()))?;

        let menu_item_id = self.store.insert(&Document::MenuItem(menu_item)).await?;
        let raw_id = menu_item_id.to_string();
        if let Err(err) = self
            .index
            .upsert(&flatten_fields(&source_fields), &raw_id, &TypeTag::Menu)
            .await
        {
            self.discard_document(&menu_item_id).await;
            return Err(err);
        }
        if let Err(err) = self.store.append_menu_item(restaurant_id, &raw_id).await {
            if let Err(cleanup) = self.index.delete(&raw_id, &TypeTag::Menu).await {
                tracing::warn!("Could not remove vector for menu item {}: {}", raw_id, cleanup);
            }
            self.discard_document(&menu_item_id).await;
            return Err(err);
        }

        Ok(menu_item_id)
    }

    async fn discard_document(&self, id: &StoreId) {
        if let Err(err) = self.store.delete(id).await {
            tracing::warn!("Could not remove partially ingested document {}: {}", id, err);
        }
    }

    /// Re-register a restaurant's vector from its fields plus the names of its
    /// currently linked menu items. Never called by `ingest`.
    pub async fn reembed_restaurant(&self, id: &StoreId) -> Result<String, PipelineError> {
        let stored = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| PipelineError::NotFound(id.to_string()))?;
        let Document::Restaurant(restaurant) = &stored.document else {
            return Err(PipelineError::InvalidRecord(format!("{} is not a restaurant", id)));
        };

        let mut text = restaurant_text(restaurant)?;
        let mut dish_names = Vec::new();
        for raw in &restaurant.menu_items {
            let Ok(child_id) = StoreId::parse(raw) else {
                continue;
            };
            if let Some(child) = self.store.get(&child_id).await? {
                dish_names.push(child.document.name().to_string());
            }
        }
        if !dish_names.is_empty() {
            text.push_str(&format!(" menu: {}", dish_names.join(CUISINE_SEPARATOR)));
        }

        self.index
            .upsert(&text, &id.to_string(), &TypeTag::Restaurant)
            .await?;
        tracing::info!("Re-embedded restaurant {} with {} menu items", id, dish_names.len());
        Ok(text)
    }
}

/// Read a JSON array of restaurant records.
pub fn load_records(path: &Path) -> Result<Vec<Value>, PipelineError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::InvalidRecord(format!("{}: {}", path.display(), e)))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| PipelineError::InvalidRecord(format!("{}: {}", path.display(), e)))?;

    match value {
        Value::Array(records) => Ok(records),
        _ => Err(PipelineError::InvalidRecord(format!(
            "{}: expected a JSON array of restaurants",
            path.display()
        ))),
    }
}

/// `"field: value"` pairs joined by spaces.
pub fn flatten_fields(fields: &Map<String, Value>) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}: {}", key, render_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn take_menu_items(fields: &mut Map<String, Value>) -> Result<Vec<Value>, PipelineError> {
    match fields.remove(MENU_ITEMS_FIELD) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(PipelineError::InvalidRecord(
            "menu_items must be an array".to_string(),
        )),
    }
}

/// Collapse a cuisine list into one delimited string.
fn normalize_cuisine(fields: &mut Map<String, Value>) {
    let joined = match fields.get(CUISINE_FIELD) {
        None | Some(Value::String(_)) => return,
        Some(Value::Array(items)) => items
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(CUISINE_SEPARATOR),
        Some(Value::Null) => String::new(),
        Some(other) => render_value(other),
    };
    fields.insert(CUISINE_FIELD.to_string(), Value::String(joined));
}

fn restaurant_text(restaurant: &Restaurant) -> Result<String, PipelineError> {
    let Value::Object(mut fields) =
        serde_json::to_value(restaurant).map_err(PipelineError::store)?
    else {
        return Ok(String::new());
    };
    fields.remove(MENU_ITEMS_FIELD);
    Ok(flatten_fields(&fields))
}
