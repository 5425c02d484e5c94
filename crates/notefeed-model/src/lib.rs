//! Notefeed data model
//!
//! Immutable records produced by network sources and the derived values the
//! resolution and engagement engines hand to display code.
//!
//! # Core Concepts
//!
//! - [`ContentItem`]: content-addressed unit of user content, identity is its `id`
//! - [`Tag`]: positional string record attached to an item
//! - [`Filter`]: one clause of a network query
//! - [`Reference`]: decoded pointer from one item's body to another item
//! - [`MediaAttachment`]: image attached to or linked from an item
//! - [`EngagementSnapshot`]: reaction / comment / zap counts for one item
//!
//! # Example
//!
//! ```rust
//! use notefeed_model::{ContentItem, Filter, kinds};
//!
//! let item = ContentItem::new("ab".repeat(32), "cd".repeat(32), 1_700_000_000, kinds::TEXT_NOTE, "gm");
//! let filter = Filter::new().ids([item.id.clone()]).limit(1);
//! assert!(filter.matches(&item));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod engagement;
mod filter;
mod item;
mod reference;

pub use engagement::{EngagementCategory, EngagementSnapshot};
pub use filter::Filter;
pub use item::{kinds, ContentItem, Tag};
pub use reference::{MediaAttachment, PointerKind, Reference, IMAGE_EXTENSIONS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
