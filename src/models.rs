//! Restaurant and menu data model.
//!
//! Documents are typed (`Restaurant`, `MenuItem`) but keep any field the
//! source record carried that the model does not name in an `extra` map,
//! so scraped attributes pass through the store and into prompts untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::errors::PipelineError;

/// Store-assigned document identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreId(Uuid);

impl StoreId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        Uuid::try_parse(raw)
            .map(Self)
            .map_err(|_| PipelineError::InvalidId(raw.to_string()))
    }
}

impl Default for StoreId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

/// Kind of vector entry, carried as the last token of a composite key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Restaurant,
    Menu,
    Other(String),
}

impl TypeTag {
    /// Case-insensitive. Accepts the `resturant` spelling written by older indexes.
    pub fn parse(token: &str) -> Self {
        let lowered = token.to_lowercase();
        match lowered.as_str() {
            "restaurant" | "resturant" => TypeTag::Restaurant,
            "menu" => TypeTag::Menu,
            _ => TypeTag::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Restaurant => "restaurant",
            TypeTag::Menu => "menu",
            TypeTag::Other(tag) => tag,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, TypeTag::Other(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Menu attribute values are either free text or integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub name: String,
    /// Always a single string; lists are joined with ", " at ingestion.
    #[serde(default)]
    pub cuisine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Ids of linked menu items, in ingestion order.
    #[serde(default)]
    pub menu_items: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    pub restaurant_id: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Restaurant,
    MenuItem,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Restaurant => "restaurant",
            DocumentKind::MenuItem => "menu_item",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "restaurant" => Some(DocumentKind::Restaurant),
            "menu_item" => Some(DocumentKind::MenuItem),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Restaurant(Restaurant),
    MenuItem(MenuItem),
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Restaurant(_) => DocumentKind::Restaurant,
            Document::MenuItem(_) => DocumentKind::MenuItem,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Document::Restaurant(r) => &r.name,
            Document::MenuItem(m) => &m.name,
        }
    }

    pub fn to_body(&self) -> Result<Value, serde_json::Error> {
        match self {
            Document::Restaurant(r) => serde_json::to_value(r),
            Document::MenuItem(m) => serde_json::to_value(m),
        }
    }

    pub fn from_body(kind: DocumentKind, body: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            DocumentKind::Restaurant => Document::Restaurant(serde_json::from_value(body)?),
            DocumentKind::MenuItem => Document::MenuItem(serde_json::from_value(body)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: StoreId,
    pub document: Document,
}

impl StoredDocument {
    /// Field map including `_id`, keyed and sorted by field name.
    pub fn fields(&self) -> BTreeMap<String, Value> {
        let mut fields = BTreeMap::new();
        match self.document.to_body() {
            Ok(Value::Object(body)) => fields.extend(body),
            Ok(other) => tracing::warn!("Document {} serialized to a non-object: {}", self.id, other),
            Err(err) => tracing::warn!("Could not serialize document {}: {}", self.id, err),
        }
        fields.insert("_id".to_string(), Value::String(self.id.to_string()));
        fields
    }

    pub fn as_restaurant(&self) -> Option<&Restaurant> {
        match &self.document {
            Document::Restaurant(r) => Some(r),
            Document::MenuItem(_) => None,
        }
    }
}

/// Related documents attached during expansion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Relation {
    #[default]
    None,
    /// Child menu items of a restaurant, in the restaurant's stored order.
    Menus(Vec<StoredDocument>),
    /// Owning restaurant of a menu item, with its `menu_items` list dropped.
    Restaurant(Box<StoredDocument>),
}

/// A resolved vector hit. Runtime only, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedDocument {
    pub stored: StoredDocument,
    pub score: Option<f32>,
    pub vector_type: TypeTag,
    pub relation: Relation,
}

impl EnrichedDocument {
    /// Every renderable field: the stored document plus `menus` or `restaurant`.
    /// `_score` and `vector_type` are carried separately and never appear here.
    pub fn fields(&self) -> BTreeMap<String, Value> {
        let mut fields = self.stored.fields();
        match &self.relation {
            Relation::None => {}
            Relation::Menus(menus) => {
                let items = menus.iter().map(|m| map_value(m.fields())).collect();
                fields.insert("menus".to_string(), Value::Array(items));
            }
            Relation::Restaurant(parent) => {
                let mut parent_fields = parent.fields();
                parent_fields.remove("menu_items");
                fields.insert("restaurant".to_string(), map_value(parent_fields));
            }
        }
        fields
    }

    pub fn menus(&self) -> &[StoredDocument] {
        match &self.relation {
            Relation::Menus(menus) => menus,
            _ => &[],
        }
    }

    pub fn parent(&self) -> Option<&StoredDocument> {
        match &self.relation {
            Relation::Restaurant(parent) => Some(parent),
            _ => None,
        }
    }
}

fn map_value(fields: BTreeMap<String, Value>) -> Value {
    Value::Object(fields.into_iter().collect::<Map<String, Value>>())
}

/// Render a field value for prompts and embedding text: strings verbatim,
/// everything else as compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
