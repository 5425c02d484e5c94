//! Notefeed Core
//!
//! Bounded reference resolution and engagement aggregation over untrusted,
//! best-effort content sources.
//!
//! # Architecture
//!
//! ```text
//! ContentItem ──► ReferenceExtractor ──► RecursiveResolver ──► ResolutionTree
//!                                             │
//!                                   ContentCache<Option<ContentItem>>
//!                                             │
//! item id ────► EngagementAggregator ─────────┼──► NetworkQueryClient
//!                 (3 concurrent sub-queries)  │      (guarded: signal + timeout)
//!                                             │
//! author ─────► AuthorFeed ───────────────────┘
//! ```
//!
//! Nothing here returns an error to the caller for a network problem:
//! lookups degrade to `Missing`, engagement categories to zero, author
//! feeds to empty.
//!
//! # Example
//!
//! ```rust
//! use notefeed_core::prelude::*;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let item = ContentItem::new("aa".repeat(32), "bb".repeat(32), 0, 1, "gm");
//! let client = Arc::new(MemoryQueryClient::new([item.clone()]));
//! let engine = FeedEngine::new(client, FeedConfig::default());
//!
//! let preview = engine.preview(&item, &CancellationToken::new()).await;
//! assert_eq!(preview.body, "gm");
//! # });
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod author_feed;
pub mod cache;
pub mod client;
pub mod config;
pub mod engagement;
pub mod engine;
pub mod error;
pub mod resolver;

pub use author_feed::AuthorFeed;
pub use cache::{CacheStats, ContentCache};
pub use client::{
    guarded_query, until_cancelled, CancellationToken, MemoryQueryClient, NetworkQueryClient,
    QueryOptions,
};
pub use config::FeedConfig;
pub use engagement::EngagementAggregator;
pub use engine::{EngineCacheStats, FeedEngine, NotePreview};
pub use error::{ConfigError, Fetched, QueryError};
pub use resolver::{
    NodeEvent, NodeId, NodeStatus, PreviewNode, PreviewStatus, RecursiveResolver, ResolutionNode,
    ResolutionTree,
};

/// Prelude for common imports
pub mod prelude {
    pub use crate::{
        CancellationToken, EngagementAggregator, FeedConfig, FeedEngine, Fetched,
        MemoryQueryClient, NetworkQueryClient, NodeStatus, QueryError, QueryOptions,
        RecursiveResolver, ResolutionTree,
    };
    pub use notefeed_model::{ContentItem, EngagementSnapshot, Filter, Reference};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
