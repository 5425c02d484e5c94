//! Feed engine façade
//!
//! Owns one query client and three isolated caches (items, engagement
//! snapshots, author feeds) and exposes everything a view needs to render
//! a note.

use crate::author_feed::AuthorFeed;
use crate::cache::CacheStats;
use crate::client::{CancellationToken, NetworkQueryClient};
use crate::config::FeedConfig;
use crate::engagement::EngagementAggregator;
use crate::resolver::{date_label, PreviewNode, RecursiveResolver, ResolutionTree};
use notefeed_extract::{extract, strip_references};
use notefeed_model::{ContentItem, EngagementSnapshot, MediaAttachment};
use serde::Serialize;
use std::sync::Arc;

/// Everything needed to render one note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotePreview {
    pub id: String,
    pub author: String,
    pub date_label: String,
    /// Body with reference tokens removed
    pub body: String,
    pub media: Vec<MediaAttachment>,
    /// Nested previews of referenced notes; these carry no engagement
    pub references: Vec<PreviewNode>,
    pub engagement: EngagementSnapshot,
}

/// Per-cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineCacheStats {
    pub items: CacheStats,
    pub engagement: CacheStats,
    pub author_feeds: CacheStats,
}

/// Resolution, engagement and author feeds over one client
pub struct FeedEngine<C: ?Sized> {
    config: FeedConfig,
    resolver: RecursiveResolver<C>,
    engagement: EngagementAggregator<C>,
    authors: AuthorFeed<C>,
}

impl<C> FeedEngine<C>
where
    C: NetworkQueryClient + ?Sized,
{
    /// Create engine; `config` is expected to be validated
    #[must_use]
    pub fn new(client: Arc<C>, config: FeedConfig) -> Self {
        Self {
            resolver: RecursiveResolver::new(Arc::clone(&client), &config),
            engagement: EngagementAggregator::new(Arc::clone(&client), &config),
            authors: AuthorFeed::new(client, &config),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn resolver(&self) -> &RecursiveResolver<C> {
        &self.resolver
    }

    /// Render-ready preview of `item`
    ///
    /// Reference resolution and engagement run concurrently.
    pub async fn preview(&self, item: &ContentItem, signal: &CancellationToken) -> NotePreview {
        tracing::info!(item = item.short_id(), "building preview");

        let (tree, engagement) = tokio::join!(
            self.resolver.resolve(item, signal),
            self.engagement.aggregate(&item.id, signal),
        );
        let extraction = extract(item);

        NotePreview {
            id: item.id.clone(),
            author: item.author.clone(),
            date_label: date_label(item.created_at),
            body: strip_references(&item.body, &extraction.references),
            media: extraction.media,
            references: tree.to_preview(),
            engagement,
        }
    }

    /// Engagement counts for one item id
    pub async fn engagement(&self, item_id: &str, signal: &CancellationToken) -> EngagementSnapshot {
        tracing::info!(item = item_id, "aggregating engagement");
        self.engagement.aggregate(item_id, signal).await
    }

    /// Reference tree for `item`
    pub async fn resolve(&self, item: &ContentItem, signal: &CancellationToken) -> ResolutionTree {
        tracing::info!(item = item.short_id(), "resolving references");
        self.resolver.resolve(item, signal).await
    }

    /// Newest notes by `author`
    pub async fn author_notes(
        &self,
        author: &str,
        limit: Option<usize>,
        signal: &CancellationToken,
    ) -> Vec<ContentItem> {
        tracing::info!(author, ?limit, "loading author notes");
        self.authors.recent(author, limit, signal).await
    }

    /// Statistics for every cache, after flushing pending maintenance
    pub async fn cache_stats(&self) -> EngineCacheStats {
        self.resolver.cache().sync().await;
        self.engagement.cache().sync().await;
        self.authors.cache().sync().await;

        EngineCacheStats {
            items: self.resolver.cache().stats(),
            engagement: self.engagement.cache().stats(),
            author_feeds: self.authors.cache().stats(),
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for FeedEngine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedEngine")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .field("engagement", &self.engagement)
            .field("authors", &self.authors)
            .finish()
    }
}
