//! Recent notes by one author

use crate::cache::ContentCache;
use crate::client::{guarded_query, until_cancelled, CancellationToken, NetworkQueryClient, QueryOptions};
use crate::config::FeedConfig;
use crate::error::QueryError;
use notefeed_model::{kinds, ContentItem, Filter};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Cached "latest notes by author" lookups
pub struct AuthorFeed<C: ?Sized> {
    client: Arc<C>,
    cache: ContentCache<Vec<ContentItem>>,
    timeout: Duration,
    default_limit: usize,
}

impl<C> AuthorFeed<C>
where
    C: NetworkQueryClient + ?Sized,
{
    #[must_use]
    pub fn new(client: Arc<C>, config: &FeedConfig) -> Self {
        Self {
            client,
            cache: ContentCache::new(
                "author_feed",
                config.cache_capacity,
                config.author_feed_staleness(),
            ),
            timeout: config.author_feed_timeout(),
            default_limit: config.author_feed_limit,
        }
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ContentCache<Vec<ContentItem>> {
        &self.cache
    }

    /// Newest text notes by `author`, at most `limit` (default from config)
    ///
    /// Empty when the query fails or is cancelled; such results are not cached.
    pub async fn recent(
        &self,
        author: &str,
        limit: Option<usize>,
        signal: &CancellationToken,
    ) -> Vec<ContentItem> {
        let limit = limit.unwrap_or(self.default_limit);
        let key = format!("{author}:{limit}");
        let load = self.load(author, limit, signal);

        match until_cancelled(signal, self.cache.fetch(key, load)).await {
            Some(Ok(notes)) => notes,
            Some(Err(err)) => {
                if !err.is_cancelled() {
                    tracing::warn!(author, error = %err, "author feed unavailable");
                }
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    async fn load(
        &self,
        author: &str,
        limit: usize,
        signal: &CancellationToken,
    ) -> Result<Vec<ContentItem>, QueryError> {
        let filter = Filter::new()
            .kinds([kinds::TEXT_NOTE])
            .authors([author])
            .limit(limit);
        let options = QueryOptions::new(signal.clone(), self.timeout);
        let items = guarded_query(self.client.as_ref(), std::slice::from_ref(&filter), &options).await?;

        let mut seen = HashSet::new();
        let mut notes: Vec<ContentItem> = items
            .into_iter()
            .filter(|item| filter.matches(item))
            .filter(|item| seen.insert(item.id.clone()))
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notes.truncate(limit);
        Ok(notes)
    }
}

impl<C: ?Sized> std::fmt::Debug for AuthorFeed<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorFeed")
            .field("cache", &self.cache)
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}
