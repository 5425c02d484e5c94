//! Reference extraction
//!
//! References are written in bodies as `nostr:nevent1...` or
//! `nostr:note1...`. Every match is decoded on its own; a match that fails
//! to decode is dropped and the rest are kept.

use crate::media::collect_media;
use crate::pointer::decode_pointer;
use indexmap::IndexMap;
use notefeed_model::{ContentItem, MediaAttachment, Reference};
use once_cell::sync::Lazy;
use regex::Regex;

/// URI scheme preceding every embedded pointer
pub const POINTER_SCHEME: &str = "nostr:";

static POINTER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"nostr:((?:nevent1|note1)[023456789acdefghjklmnpqrstuvwxyz]+)")
        .expect("pointer token pattern compiles")
});

/// Everything extracted from one item
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Decoded references, first-occurrence order, one per pointer
    pub references: Vec<Reference>,
    /// Media attachments, structured first then inline
    pub media: Vec<MediaAttachment>,
}

impl Extraction {
    /// Whether nothing was found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.is_empty() && self.media.is_empty()
    }
}

/// Stateless reference and media extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceExtractor;

impl ReferenceExtractor {
    /// Create extractor
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Extract references and media from an item
    #[must_use]
    pub fn extract(&self, item: &ContentItem) -> Extraction {
        Extraction {
            references: self.references(&item.body),
            media: collect_media(item),
        }
    }

    /// Decode every well-formed pointer in `body`
    #[must_use]
    pub fn references(&self, body: &str) -> Vec<Reference> {
        let mut found: IndexMap<&str, Reference> = IndexMap::new();

        for capture in POINTER_TOKEN.captures_iter(body) {
            let Some(pointer) = capture.get(1).map(|m| m.as_str()) else {
                continue;
            };
            if found.contains_key(pointer) {
                continue;
            }
            match decode_pointer(pointer) {
                Ok(reference) => {
                    found.insert(pointer, reference);
                }
                Err(err) => {
                    tracing::debug!(pointer, error = %err, "dropping malformed reference");
                }
            }
        }

        found.into_values().collect()
    }
}

/// Extract references and media from an item
#[inline]
#[must_use]
pub fn extract(item: &ContentItem) -> Extraction {
    ReferenceExtractor.extract(item)
}

/// Body text with every extracted reference token removed, trimmed
#[must_use]
pub fn strip_references(body: &str, references: &[Reference]) -> String {
    let mut text = body.to_string();
    for reference in references {
        let token = format!("{POINTER_SCHEME}{}", reference.pointer);
        text = text.replace(&token, "");
    }
    text.trim().to_string()
}
