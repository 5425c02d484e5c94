//! Notefeed extraction
//!
//! Pure, synchronous scanning of a content item for embedded references to
//! other items and for media attachments.
//!
//! # Architecture
//!
//! ```text
//! ContentItem.body ──► pointer tokens ──► decode_pointer ──► Vec<Reference>
//!        │                                   (failures dropped)
//!        └──────────► image URLs ──┐
//! ContentItem.attachments ─────────┴──► dedup by URL ──► Vec<MediaAttachment>
//! ```
//!
//! # Example
//!
//! ```rust
//! use notefeed_extract::{encode_note, extract};
//! use notefeed_model::ContentItem;
//!
//! let target = "ab".repeat(32);
//! let pointer = encode_note(&target).unwrap();
//! let item = ContentItem::new("01", "02", 0, 1, format!("quoting nostr:{pointer}"));
//!
//! let extraction = extract(&item);
//! assert_eq!(extraction.references[0].target_id.as_deref(), Some(target.as_str()));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod extractor;
pub mod media;
pub mod pointer;

pub use error::{DecodeError, EncodeError};
pub use extractor::{extract, strip_references, Extraction, ReferenceExtractor, POINTER_SCHEME};
pub use media::{collect_media, parse_attachment};
pub use pointer::{decode_pointer, encode_nevent, encode_note};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
