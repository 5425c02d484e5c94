//! Engagement aggregation
//!
//! Three sub-queries (reactions, comments, zaps) run concurrently against
//! the same target id, each under its own timeout. A sub-query that fails
//! counts as zero; the snapshot is assembled only after all three settle
//! and is cached per item id.

use crate::cache::ContentCache;
use crate::client::{guarded_query, until_cancelled, CancellationToken, NetworkQueryClient, QueryOptions};
use crate::config::FeedConfig;
use crate::error::QueryError;
use notefeed_model::{EngagementCategory, EngagementSnapshot};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Computes and caches [`EngagementSnapshot`]s
pub struct EngagementAggregator<C: ?Sized> {
    client: Arc<C>,
    cache: ContentCache<EngagementSnapshot>,
    timeout: Duration,
    limit: usize,
}

impl<C> EngagementAggregator<C>
where
    C: NetworkQueryClient + ?Sized,
{
    /// Create aggregator with its own snapshot cache
    #[must_use]
    pub fn new(client: Arc<C>, config: &FeedConfig) -> Self {
        Self {
            client,
            cache: ContentCache::new(
                "engagement",
                config.cache_capacity,
                config.engagement_staleness(),
            ),
            timeout: config.engagement_timeout(),
            limit: config.engagement_limit,
        }
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ContentCache<EngagementSnapshot> {
        &self.cache
    }

    /// Engagement counts for `item_id`; never fails
    ///
    /// Cancellation yields an all-zero snapshot that is not cached.
    pub async fn aggregate(&self, item_id: &str, signal: &CancellationToken) -> EngagementSnapshot {
        let load = self.load(item_id, signal);
        match until_cancelled(signal, self.cache.fetch(item_id, load)).await {
            Some(Ok(snapshot)) => snapshot,
            Some(Err(err)) => {
                tracing::debug!(item = item_id, error = %err, "engagement not settled");
                EngagementSnapshot::default()
            }
            None => EngagementSnapshot::default(),
        }
    }

    async fn load(
        &self,
        item_id: &str,
        signal: &CancellationToken,
    ) -> Result<EngagementSnapshot, QueryError> {
        let options = QueryOptions::new(signal.clone(), self.timeout);
        let (reactions, comments, zaps) = tokio::join!(
            self.count(EngagementCategory::Reaction, item_id, &options),
            self.count(EngagementCategory::Comment, item_id, &options),
            self.count(EngagementCategory::Zap, item_id, &options),
        );

        if signal.is_cancelled() {
            return Err(QueryError::Cancelled);
        }

        let snapshot = EngagementSnapshot::new(reactions, comments, zaps);
        tracing::debug!(
            item = item_id,
            reactions,
            comments,
            zaps,
            "engagement aggregated"
        );
        Ok(snapshot)
    }

    /// Distinct matching items for one category, 0 on failure
    async fn count(&self, category: EngagementCategory, item_id: &str, options: &QueryOptions) -> u64 {
        let filter = category.filter(item_id, self.limit);
        match guarded_query(self.client.as_ref(), std::slice::from_ref(&filter), options).await {
            Ok(items) => {
                let distinct: HashSet<&str> = items
                    .iter()
                    .filter(|item| filter.matches(item))
                    .map(|item| item.id.as_str())
                    .collect();
                u64::try_from(distinct.len().min(self.limit)).unwrap_or(u64::MAX)
            }
            Err(QueryError::Cancelled) => 0,
            Err(err) => {
                tracing::warn!(item = item_id, %category, error = %err, "engagement sub-query degraded to zero");
                0
            }
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for EngagementAggregator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngagementAggregator")
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
