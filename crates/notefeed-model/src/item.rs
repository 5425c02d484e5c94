//! Content items and their tags
//!
//! Items arrive from network sources in wire shape (`id`, `pubkey`,
//! `created_at`, `kind`, `content`, `tags`). On the way in, structured
//! attachment tags (`imeta`) are split out of the raw tag list so the
//! extractor can walk them positionally.

use serde::{Deserialize, Serialize};

/// Well-known item kinds
pub mod kinds {
    /// Short text note
    pub const TEXT_NOTE: u32 = 1;
    /// Reaction to another item
    pub const REACTION: u32 = 7;
    /// Zap (payment) receipt
    pub const ZAP_RECEIPT: u32 = 9735;
}

/// Name of the tag carrying a structured media attachment
pub const ATTACHMENT_TAG: &str = "imeta";

/// Positional string record
///
/// The first field is the tag name; the remaining fields are its values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(Vec<String>);

impl Tag {
    /// Create tag from its fields
    #[inline]
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(Into::into).collect())
    }

    /// Tag name (first field), empty string for an empty tag
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.first().map_or("", String::as_str)
    }

    /// First value after the name
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.0.get(1).map(String::as_str)
    }

    /// All fields after the name
    #[inline]
    #[must_use]
    pub fn values(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// All fields including the name
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    /// Whether this is a structured attachment tag
    #[inline]
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.name() == ATTACHMENT_TAG
    }
}

/// Immutable unit of user content
///
/// Produced only by network sources. Two items with the same `id` are the
/// same content for caching and deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireItem", into = "WireItem")]
pub struct ContentItem {
    /// Content-addressed id (hex)
    pub id: String,
    /// Author key (hex)
    pub author: String,
    /// Creation time, seconds since the epoch
    pub created_at: i64,
    /// Category tag
    pub kind: u32,
    /// Raw text body
    pub body: String,
    /// Structured attachment tags, in order
    pub attachments: Vec<Tag>,
    /// Every other tag, in order
    pub raw_tags: Vec<Tag>,
}

impl ContentItem {
    /// Create item without tags
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        created_at: i64,
        kind: u32,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            author: author.into(),
            created_at,
            kind,
            body: body.into(),
            attachments: Vec::new(),
            raw_tags: Vec::new(),
        }
    }

    /// With tags; attachment tags are routed to `attachments`
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        for tag in tags {
            if tag.is_attachment() {
                self.attachments.push(tag);
            } else {
                self.raw_tags.push(tag);
            }
        }
        self
    }

    /// Iterate all tags (attachments first, then raw tags)
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.attachments.iter().chain(self.raw_tags.iter())
    }

    /// Whether any tag named `name` carries `value` as its first value
    #[must_use]
    pub fn has_tag_value(&self, name: &str, value: &str) -> bool {
        self.tags()
            .any(|t| t.name() == name && t.value() == Some(value))
    }

    /// Short id for log lines
    #[inline]
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

#[derive(Serialize, Deserialize)]
struct WireItem {
    id: String,
    pubkey: String,
    created_at: i64,
    kind: u32,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<Tag>,
}

impl From<WireItem> for ContentItem {
    fn from(wire: WireItem) -> Self {
        ContentItem::new(wire.id, wire.pubkey, wire.created_at, wire.kind, wire.content)
            .with_tags(wire.tags)
    }
}

/// Tags are written in [`ContentItem::tags`] order, attachments first.
/// Interleaving between attachment and other tags in the source is not kept;
/// order within each group is.
impl From<ContentItem> for WireItem {
    fn from(item: ContentItem) -> Self {
        let mut tags = item.attachments;
        tags.extend(item.raw_tags);
        Self {
            id: item.id,
            pubkey: item.author,
            created_at: item.created_at,
            kind: item.kind,
            content: item.body,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_accessors() {
        let tag = Tag::new(["e", "abc", "wss://relay"]);
        assert_eq!(tag.name(), "e");
        assert_eq!(tag.value(), Some("abc"));
        assert_eq!(tag.values().len(), 2);

        let empty = Tag::default();
        assert_eq!(empty.name(), "");
        assert!(empty.values().is_empty());
    }

    #[test]
    fn wire_tags_split_into_attachments() {
        let json = r#"{
            "id": "01",
            "pubkey": "02",
            "created_at": 10,
            "kind": 1,
            "content": "hello",
            "tags": [["e", "ff"], ["imeta", "url https://x/a.png", "m image/png"], ["p", "aa"]]
        }"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.author, "02");
        assert_eq!(item.body, "hello");
        assert_eq!(item.attachments.len(), 1);
        assert_eq!(item.raw_tags.len(), 2);
        assert!(item.has_tag_value("e", "ff"));
        assert!(!item.has_tag_value("e", "aa"));
    }

    #[test]
    fn serializes_back_to_wire_shape() {
        let item = ContentItem::new("01", "02", 10, kinds::TEXT_NOTE, "hi")
            .with_tags([Tag::new(["imeta", "url https://x/a.png"])]);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(value["pubkey"], "02");
        assert_eq!(value["content"], "hi");
        assert_eq!(value["tags"][0][0], "imeta");
    }

    #[test]
    fn wire_tags_follow_tags_order() {
        let item = ContentItem::new("01", "02", 10, kinds::TEXT_NOTE, "hi").with_tags([
            Tag::new(["e", "ff"]),
            Tag::new(["imeta", "url https://x/a.png"]),
            Tag::new(["p", "aa"]),
            Tag::new(["imeta", "url https://x/b.png"]),
        ]);
        let value = serde_json::to_value(&item).unwrap();
        let names: Vec<_> = value["tags"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tag| tag[0].as_str().unwrap())
            .collect();

        assert_eq!(names, ["imeta", "imeta", "e", "p"]);
        assert!(item.tags().map(Tag::name).eq(names.iter().copied()));

        let back: ContentItem = serde_json::from_value(value).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn short_id_handles_short_ids() {
        let item = ContentItem::new("abc", "02", 0, 1, "");
        assert_eq!(item.short_id(), "abc");
        let item = ContentItem::new("0123456789", "02", 0, 1, "");
        assert_eq!(item.short_id(), "01234567");
    }
}
