//! References to other items and media attachments

use serde::{Deserialize, Serialize};

/// Image file extensions recognised in free text (lowercase, no dot)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// Pointer addressing variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKind {
    /// Id plus optional author, relay and kind hints (`nevent1...`)
    Event,
    /// Bare id (`note1...`)
    Note,
}

impl PointerKind {
    /// Human-readable prefix of the encoded pointer
    #[inline]
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Event => "nevent",
            Self::Note => "note",
        }
    }

    /// Look up by prefix
    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "nevent" => Some(Self::Event),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// Embedded pointer from one item's body to another item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Encoded pointer text as it appeared in the body (without `nostr:`)
    pub pointer: String,
    /// Addressing variant
    pub pointer_kind: PointerKind,
    /// Decoded target id; absent when decoding failed
    pub target_id: Option<String>,
    /// Author hint, when the pointer carries one
    pub target_author: Option<String>,
    /// Relay hints carried by the pointer
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relays: Vec<String>,
    /// Kind hint carried by the pointer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u32>,
}

impl Reference {
    /// Reference to a bare id
    #[must_use]
    pub fn note(pointer: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            pointer_kind: PointerKind::Note,
            target_id: Some(target_id.into()),
            target_author: None,
            relays: Vec::new(),
            kind: None,
        }
    }

    /// Whether a lookup can be attempted at all
    #[inline]
    #[must_use]
    pub fn is_resolvable(&self) -> bool {
        self.target_id.is_some()
    }

    /// Label shown when the target cannot be previewed
    #[must_use]
    pub fn fallback_label(&self) -> String {
        let head: String = self.pointer.chars().take(20).collect();
        format!("View note: {head}...")
    }

    /// Link path for the unresolved target
    #[inline]
    #[must_use]
    pub fn href(&self) -> String {
        format!("/{}", self.pointer)
    }
}

/// Image attached to or linked from an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaAttachment {
    /// Media URL, the dedup key
    pub url: String,
    /// MIME type, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Alt text, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

impl MediaAttachment {
    /// Attachment with only a URL
    #[inline]
    #[must_use]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: None,
            alt_text: None,
        }
    }

    /// Whether this attachment renders as an image
    #[must_use]
    pub fn is_image(&self) -> bool {
        if self
            .mime_type
            .as_deref()
            .is_some_and(|m| m.starts_with("image/"))
        {
            return true;
        }
        self.url
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Alt text or the generic placeholder
    #[inline]
    #[must_use]
    pub fn alt_or_default(&self) -> &str {
        self.alt_text.as_deref().unwrap_or("Media attachment")
    }
}
