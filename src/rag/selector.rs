//! Context selection: how many ranked hits to resolve, decided once from the
//! type of the top hit.

use super::key;
use super::vector::VectorHit;
use crate::models::TypeTag;

/// Hits resolved when the top hit's type is neither restaurant nor menu.
const FALLBACK_HIT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Resolve the top hit only.
    TopOnly,
    /// Resolve every hit.
    All,
    /// Resolve at most two hits.
    FirstTwo,
}

impl SelectionPolicy {
    pub fn for_tag(tag: &TypeTag) -> Self {
        match tag {
            TypeTag::Restaurant => SelectionPolicy::TopOnly,
            TypeTag::Menu => SelectionPolicy::All,
            TypeTag::Other(_) => SelectionPolicy::FirstTwo,
        }
    }

    fn limit(self, available: usize) -> usize {
        match self {
            SelectionPolicy::TopOnly => available.min(1),
            SelectionPolicy::All => available,
            SelectionPolicy::FirstTwo => available.min(FALLBACK_HIT_COUNT),
        }
    }
}

/// Policy for a ranked hit list. `None` when there are no hits.
///
/// A top hit whose key cannot be decoded falls back to `FirstTwo`.
pub fn policy(hits: &[VectorHit]) -> Option<SelectionPolicy> {
    let top = hits.first()?;
    let policy = match key::decode(&top.composite_id) {
        Ok(decoded) => SelectionPolicy::for_tag(&decoded.tag),
        Err(_) => SelectionPolicy::FirstTwo,
    };
    Some(policy)
}

/// The prefix of `hits` that should be resolved into documents.
pub fn select(hits: &[VectorHit]) -> &[VectorHit] {
    match policy(hits) {
        Some(policy) => &hits[..policy.limit(hits.len())],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hits(keys: &[&str]) -> Vec<VectorHit> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| VectorHit::new(*k, 1.0 - i as f32 * 0.1))
            .collect()
    }

    fn ids(selected: &[VectorHit]) -> Vec<&str> {
        selected.iter().map(|h| h.composite_id.as_str()).collect()
    }

    #[test]
    fn menu_top_hit_selects_every_hit() {
        let hits = hits(&["x menu", "y menu"]);
        assert_eq!(ids(select(&hits)), vec!["x menu", "y menu"]);
    }

    #[test]
    fn menu_top_hit_keeps_mixed_types() {
        let hits = hits(&["x menu", "y restaurant", "z menu"]);
        assert_eq!(select(&hits).len(), 3);
    }

    #[test]
    fn restaurant_top_hit_selects_only_the_top() {
        let hits = hits(&["x restaurant", "y menu"]);
        assert_eq!(ids(select(&hits)), vec!["x restaurant"]);
    }

    #[test]
    fn unknown_top_hit_selects_first_two() {
        let hits = hits(&["x unknown", "y menu", "z menu"]);
        assert_eq!(ids(select(&hits)), vec!["x unknown", "y menu"]);
    }

    #[test]
    fn unknown_top_hit_with_single_hit() {
        let hits = hits(&["x dish"]);
        assert_eq!(select(&hits).len(), 1);
    }

    #[test]
    fn malformed_top_hit_falls_back_to_first_two() {
        let hits = hits(&["   ", "y menu", "z menu"]);
        assert_eq!(policy(&hits), Some(SelectionPolicy::FirstTwo));
        assert_eq!(select(&hits).len(), 2);
    }

    #[test]
    fn no_hits_selects_nothing() {
        assert!(select(&[]).is_empty());
        assert_eq!(policy(&[]), None);
    }
}
