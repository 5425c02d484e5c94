//! Bounded recursive reference resolution
//!
//! # Depth
//!
//! The root item sits at depth 0 and each reference found in an item at
//! depth `d` becomes a node at depth `d + 1`. A node with
//! `depth >= max_depth` is created `Disabled` and no lookup is issued for
//! it. With the default bound of 2 the root's references are fetched and
//! their own references are shown as links only.
//!
//! # Cancellation
//!
//! When the caller's signal fires, nodes still `Loading` stay that way, the
//! tree is marked abandoned and nothing further is expanded.

mod tree;

pub use tree::{
    date_label, NodeId, NodeStatus, PreviewNode, PreviewStatus, ResolutionNode, ResolutionTree,
};

use crate::cache::ContentCache;
use crate::client::{guarded_query, until_cancelled, CancellationToken, NetworkQueryClient, QueryOptions};
use crate::config::FeedConfig;
use crate::error::{Fetched, QueryError};
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use notefeed_extract::ReferenceExtractor;
use notefeed_model::{ContentItem, Filter, Reference};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Cache of looked-up items keyed by target id; `None` records a settled miss
pub type ItemCache = ContentCache<Option<ContentItem>>;

/// Progress of a resolve pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// Node added with its initial status
    Created {
        id: NodeId,
        parent: Option<NodeId>,
        depth: usize,
        reference: Reference,
        status: NodeStatus,
    },
    /// `Loading` node reached a terminal status
    Settled { id: NodeId, status: NodeStatus },
}

/// Walks an item's references up to the depth bound
pub struct RecursiveResolver<C: ?Sized> {
    client: Arc<C>,
    cache: ItemCache,
    extractor: ReferenceExtractor,
    max_depth: usize,
    timeout: Duration,
    retries: u32,
}

impl<C> RecursiveResolver<C>
where
    C: NetworkQueryClient + ?Sized,
{
    /// Create resolver with its own item cache
    #[must_use]
    pub fn new(client: Arc<C>, config: &FeedConfig) -> Self {
        let cache = ContentCache::new("items", config.cache_capacity, config.lookup_staleness());
        Self::with_cache(client, cache, config)
    }

    /// Create resolver over an existing item cache
    #[must_use]
    pub fn with_cache(client: Arc<C>, cache: ItemCache, config: &FeedConfig) -> Self {
        Self {
            client,
            cache,
            extractor: ReferenceExtractor::new(),
            max_depth: config.max_depth,
            timeout: config.lookup_timeout(),
            retries: config.lookup_retries,
        }
    }

    #[inline]
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &ItemCache {
        &self.cache
    }

    /// Resolve every reference reachable from `item` within the depth bound
    pub async fn resolve(&self, item: &ContentItem, signal: &CancellationToken) -> ResolutionTree {
        self.walk(item, signal, None).await
    }

    /// As [`RecursiveResolver::resolve`], reporting each node as it is
    /// created and as it settles
    ///
    /// Sibling lookups run concurrently, so `Settled` events arrive in
    /// completion order. A closed receiver does not stop the pass.
    pub async fn resolve_with_events(
        &self,
        item: &ContentItem,
        signal: &CancellationToken,
        events: UnboundedSender<NodeEvent>,
    ) -> ResolutionTree {
        self.walk(item, signal, Some(events)).await
    }

    async fn walk(
        &self,
        item: &ContentItem,
        signal: &CancellationToken,
        events: Option<UnboundedSender<NodeEvent>>,
    ) -> ResolutionTree {
        let walk = Walk {
            resolver: self,
            tree: Mutex::new(ResolutionTree::new(item.id.clone(), self.max_depth)),
            signal,
            events,
        };
        walk.expand(None, item, 0).await;

        let mut tree = walk.tree.into_inner();
        if signal.is_cancelled() {
            tree.abandon();
        }
        tracing::debug!(
            root = item.short_id(),
            nodes = tree.len(),
            abandoned = tree.is_abandoned(),
            "resolution finished"
        );
        tree
    }

    /// Look up the target of one reference through the item cache
    ///
    /// A settled miss is cached like a hit. Failures are retried up to the
    /// configured count inside the same load and are not cached.
    pub async fn lookup(&self, reference: &Reference, signal: &CancellationToken) -> Fetched<ContentItem> {
        let Some(target) = reference.target_id.as_deref() else {
            return Fetched::Absent;
        };

        let options = QueryOptions::new(signal.clone(), self.timeout);
        let load = self.load(target, options);
        match until_cancelled(signal, self.cache.fetch(target, load)).await {
            Some(Ok(Some(item))) => Fetched::Found(item),
            Some(Ok(None)) => Fetched::Absent,
            Some(Err(err)) => Fetched::Failed((*err).clone()),
            None => Fetched::Failed(QueryError::Cancelled),
        }
    }

    async fn load(&self, target: &str, options: QueryOptions) -> Result<Option<ContentItem>, QueryError> {
        let filters = [Filter::new().ids([target]).limit(1)];
        let mut attempt = 0;
        loop {
            match guarded_query(self.client.as_ref(), &filters, &options).await {
                Ok(items) => return Ok(items.into_iter().find(|item| item.id == target)),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(id = target, attempt, error = %err, "retrying lookup");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl<C: ?Sized> std::fmt::Debug for RecursiveResolver<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecursiveResolver")
            .field("cache", &self.cache)
            .field("max_depth", &self.max_depth)
            .field("timeout", &self.timeout)
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

/// State of one resolve pass; the lock is never held across an await
struct Walk<'a, C: ?Sized> {
    resolver: &'a RecursiveResolver<C>,
    tree: Mutex<ResolutionTree>,
    signal: &'a CancellationToken,
    events: Option<UnboundedSender<NodeEvent>>,
}

impl<'a, C> Walk<'a, C>
where
    C: NetworkQueryClient + ?Sized,
{
    fn emit(&self, event: NodeEvent) {
        if let Some(events) = &self.events {
            // receiver gone means nobody is watching; keep resolving
            let _ = events.send(event);
        }
    }

    /// Add nodes for `item`'s references and settle the loading ones
    fn expand<'w>(
        &'w self,
        parent: Option<NodeId>,
        item: &'w ContentItem,
        item_depth: usize,
    ) -> BoxFuture<'w, ()> {
        async move {
            let references = self.resolver.extractor.references(&item.body);
            let depth = item_depth + 1;

            let mut loading = Vec::new();
            for reference in references {
                let (id, status) = {
                    let mut tree = self.tree.lock();
                    let id = tree.push(parent, reference.clone(), depth);
                    (id, tree.get(id).map(|node| node.status.clone()))
                };
                let Some(status) = status else { continue };
                tracing::debug!(node = %id, depth, status = status.name(), "node created");
                if status == NodeStatus::Loading {
                    loading.push((id, reference.clone()));
                }
                self.emit(NodeEvent::Created {
                    id,
                    parent,
                    depth,
                    reference,
                    status,
                });
            }

            join_all(
                loading
                    .into_iter()
                    .map(|(id, reference)| self.settle(id, reference, depth)),
            )
            .await;
        }
        .boxed()
    }

    /// Look up one `Loading` node, then expand it if resolved
    fn settle<'w>(&'w self, id: NodeId, reference: Reference, depth: usize) -> BoxFuture<'w, ()> {
        async move {
            let fetched = self.resolver.lookup(&reference, self.signal).await;
            if self.signal.is_cancelled() {
                tracing::debug!(node = %id, "resolution abandoned");
                self.tree.lock().abandon();
                return;
            }

            let status = match &fetched {
                Fetched::Found(item) => NodeStatus::Resolved(item.clone()),
                Fetched::Absent => NodeStatus::Missing,
                Fetched::Failed(err) => {
                    tracing::warn!(node = %id, pointer = %reference.pointer, error = %err, "lookup failed");
                    NodeStatus::Missing
                }
            };

            let settled = self.tree.lock().settle(id, status.clone());
            if !settled {
                return;
            }
            self.emit(NodeEvent::Settled { id, status });

            if let Fetched::Found(item) = fetched {
                self.expand(Some(id), &item, depth).await;
            }
        }
        .boxed()
    }
}
