//! In-memory query client over a fixed item set

use super::{NetworkQueryClient, QueryOptions};
use crate::error::QueryError;
use async_trait::async_trait;
use notefeed_model::{ContentItem, Filter};
use parking_lot::RwLock;
use std::collections::HashSet;

/// Answers filter sets from items held in memory
///
/// Each filter's matches are sorted newest first and capped at its limit;
/// the union across filters is deduplicated by id.
#[derive(Debug, Default)]
pub struct MemoryQueryClient {
    items: RwLock<Vec<ContentItem>>,
}

impl MemoryQueryClient {
    /// Create client over `items`
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
        }
    }

    /// Create client from a JSON array of wire-shaped items
    ///
    /// # Errors
    /// Returns the JSON error if the text is not an array of items.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let items: Vec<ContentItem> = serde_json::from_str(text)?;
        Ok(Self::new(items))
    }

    /// Add an item, replacing any with the same id
    pub fn insert(&self, item: ContentItem) {
        let mut items = self.items.write();
        items.retain(|existing| existing.id != item.id);
        items.push(item);
    }

    /// Item by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<ContentItem> {
        self.items.read().iter().find(|item| item.id == id).cloned()
    }

    /// Number of items held
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Whether no items are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Evaluate `filters` synchronously
    #[must_use]
    pub fn select(&self, filters: &[Filter]) -> Vec<ContentItem> {
        let items = self.items.read();
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for filter in filters {
            let mut matched: Vec<&ContentItem> =
                items.iter().filter(|item| filter.matches(item)).collect();
            matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            if let Some(limit) = filter.limit {
                matched.truncate(limit);
            }
            for item in matched {
                if seen.insert(item.id.as_str()) {
                    selected.push(item.clone());
                }
            }
        }

        selected
    }
}

#[async_trait]
impl NetworkQueryClient for MemoryQueryClient {
    async fn query(
        &self,
        filters: &[Filter],
        _options: &QueryOptions,
    ) -> Result<Vec<ContentItem>, QueryError> {
        Ok(self.select(filters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notefeed_model::{kinds, Tag};

    fn item(id: &str, author: &str, created_at: i64, kind: u32) -> ContentItem {
        ContentItem::new(id, author, created_at, kind, "")
    }

    fn client() -> MemoryQueryClient {
        MemoryQueryClient::new([
            item("a", "alice", 10, kinds::TEXT_NOTE),
            item("b", "alice", 30, kinds::TEXT_NOTE),
            item("c", "bob", 20, kinds::TEXT_NOTE),
            item("r", "bob", 40, kinds::REACTION).with_tags([Tag::new(["e", "a"])]),
        ])
    }

    #[test]
    fn by_id() {
        let found = client().select(&[Filter::new().ids(["c"]).limit(1)]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "c");
    }

    #[test]
    fn newest_first_with_limit() {
        let found = client().select(&[Filter::new().authors(["alice"]).limit(1)]);
        assert_eq!(found.iter().map(|i| i.id.as_str()).collect::<Vec<_>>(), ["b"]);
    }

    #[test]
    fn tag_constraint() {
        let found = client().select(&[Filter::new().kinds([kinds::REACTION]).referencing("a")]);
        assert_eq!(found.len(), 1);
        assert!(client().select(&[Filter::new().referencing("b")]).is_empty());
    }

    #[test]
    fn union_is_deduplicated() {
        let found = client().select(&[Filter::new().ids(["a"]), Filter::new().authors(["alice"])]);
        let ids: Vec<_> = found.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn insert_replaces_same_id() {
        let client = client();
        client.insert(ContentItem::new("a", "alice", 99, 1, "edited"));
        assert_eq!(client.len(), 4);
        assert_eq!(client.get("a").unwrap().body, "edited");
    }

    #[test]
    fn from_json_reads_wire_shape() {
        let json = r#"[{"id":"x","pubkey":"p","created_at":5,"kind":1,"content":"hello","tags":[]}]"#;
        let client = MemoryQueryClient::from_json(json).unwrap();
        assert_eq!(client.get("x").unwrap().author, "p");
        assert!(MemoryQueryClient::from_json("{").is_err());
    }
}
