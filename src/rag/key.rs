//! Composite keys joining vector-index entries to stored documents.
//!
//! Every vector entry is registered under `"<store_id> <type_tag>"`. Only the
//! first and last whitespace-delimited tokens carry meaning; anything in
//! between is ignored.

use crate::core::errors::PipelineError;
use crate::models::{StoreId, TypeTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeKey {
    pub raw_id: String,
    pub tag: TypeTag,
}

impl CompositeKey {
    /// Parse the id portion into a store id.
    pub fn store_id(&self) -> Result<StoreId, PipelineError> {
        StoreId::parse(&self.raw_id)
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.raw_id, self.tag)
    }
}

pub fn encode(id: &str, tag: &TypeTag) -> String {
    format!("{} {}", id, tag)
}

pub fn decode(raw_key: &str) -> Result<CompositeKey, PipelineError> {
    let mut tokens = raw_key.split_whitespace();
    let first = tokens
        .next()
        .ok_or_else(|| PipelineError::MalformedKey(raw_key.to_string()))?;
    let last = tokens.last().unwrap_or(first);

    Ok(CompositeKey {
        raw_id: first.to_string(),
        tag: TypeTag::parse(last),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_recovers_id_and_tag() {
        let id = StoreId::new();
        for tag in [TypeTag::Restaurant, TypeTag::Menu] {
            let key = decode(&encode(&id.to_string(), &tag)).unwrap();
            assert_eq!(key.raw_id, id.to_string());
            assert_eq!(key.tag, tag);
            assert_eq!(key.store_id().unwrap(), id);
        }
    }

    #[test]
    fn decode_rejects_blank_keys() {
        for raw in ["", "   ", "\t\n"] {
            assert!(matches!(decode(raw), Err(PipelineError::MalformedKey(_))));
        }
    }

    #[test]
    fn decode_ignores_inner_tokens_and_lowercases_tag() {
        let key = decode("abc123 stale marker MENU").unwrap();
        assert_eq!(key.raw_id, "abc123");
        assert_eq!(key.tag, TypeTag::Menu);
    }

    #[test]
    fn single_token_is_both_id_and_tag() {
        let key = decode("orphan").unwrap();
        assert_eq!(key.raw_id, "orphan");
        assert_eq!(key.tag, TypeTag::Other("orphan".to_string()));
    }

    #[test]
    fn legacy_restaurant_spelling_decodes_as_restaurant() {
        let key = decode("abc resturant").unwrap();
        assert_eq!(key.tag, TypeTag::Restaurant);
        assert_eq!(key.to_string(), "abc restaurant");
    }

    #[test]
    fn invalid_id_is_reported_not_fatal() {
        let key = decode("zz-not-a-uuid menu").unwrap();
        assert!(matches!(key.store_id(), Err(PipelineError::InvalidId(_))));
    }
}
