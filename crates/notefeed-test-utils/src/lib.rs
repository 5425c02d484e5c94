//! Testing utilities for the Notefeed workspace
//!
//! Fixture builders and an instrumented query client whose per-id and
//! per-kind behaviour can be scripted (delay, hang, fail).

#![allow(missing_docs)]

use async_trait::async_trait;
use notefeed_core::{MemoryQueryClient, NetworkQueryClient, QueryError, QueryOptions};
use notefeed_extract::{encode_nevent, encode_note};
use notefeed_model::{kinds, ContentItem, Filter, Tag};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Timestamp of fixture item 0
pub const BASE_TIME: i64 = 1_700_000_000;

/// 64-char hex id derived from `n`
pub fn hex_id(n: u8) -> String {
    format!("{n:02x}").repeat(32)
}

/// Author used by [`note`]
pub fn default_author() -> String {
    hex_id(0xaa)
}

/// Text note with id `hex_id(n)`, created `n` seconds after [`BASE_TIME`]
pub fn note(n: u8, body: impl Into<String>) -> ContentItem {
    ContentItem::new(
        hex_id(n),
        default_author(),
        BASE_TIME + i64::from(n),
        kinds::TEXT_NOTE,
        body,
    )
}

/// Text note by `author`
pub fn note_by(n: u8, author: &str, created_at: i64, body: impl Into<String>) -> ContentItem {
    ContentItem::new(hex_id(n), author, created_at, kinds::TEXT_NOTE, body)
}

/// `nostr:note1...` token pointing at `hex_id(target)`
pub fn note_pointer(target: u8) -> String {
    format!("nostr:{}", encode_note(&hex_id(target)).unwrap())
}

/// `nostr:nevent1...` token pointing at `hex_id(target)` with an author hint
pub fn nevent_pointer(target: u8, author: &str) -> String {
    let pointer = encode_nevent(&hex_id(target), Some(author), &[], Some(kinds::TEXT_NOTE)).unwrap();
    format!("nostr:{pointer}")
}

/// Text note whose body quotes every id in `targets`
pub fn quoting(n: u8, targets: &[u8]) -> ContentItem {
    let body = targets
        .iter()
        .map(|target| note_pointer(*target))
        .collect::<Vec<_>>()
        .join(" ");
    note(n, format!("quoting {body}"))
}

fn reply(n: u8, kind: u32, target: &str) -> ContentItem {
    ContentItem::new(hex_id(n), hex_id(0xbb), BASE_TIME + i64::from(n), kind, "")
        .with_tags([Tag::new(["e", target])])
}

/// Reaction to `target`
pub fn reaction_to(n: u8, target: &str) -> ContentItem {
    let mut item = reply(n, kinds::REACTION, target);
    item.body = "+".to_string();
    item
}

/// Reply note to `target`
pub fn comment_on(n: u8, target: &str) -> ContentItem {
    let mut item = reply(n, kinds::TEXT_NOTE, target);
    item.body = "nice".to_string();
    item
}

/// Zap receipt for `target`
pub fn zap_for(n: u8, target: &str) -> ContentItem {
    reply(n, kinds::ZAP_RECEIPT, target)
}

/// Scripted response for matching queries
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer normally after a delay
    Delay(Duration),
    /// Never answer
    Hang,
    /// Answer with an error
    Fail(QueryError),
}

/// In-memory client that records calls and follows scripted behaviours
#[derive(Debug, Default)]
pub struct ScriptedQueryClient {
    inner: MemoryQueryClient,
    latency: Option<Duration>,
    by_id: HashMap<String, Behavior>,
    by_kind: HashMap<u32, Behavior>,
    calls: Mutex<Vec<Vec<Filter>>>,
}

impl ScriptedQueryClient {
    pub fn new(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            inner: MemoryQueryClient::new(items),
            ..Self::default()
        }
    }

    /// Delay every answer by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Script queries asking for `id`
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>, behavior: Behavior) -> Self {
        self.by_id.insert(id.into(), behavior);
        self
    }

    /// Script queries asking for `kind`
    #[must_use]
    pub fn with_kind(mut self, kind: u32, behavior: Behavior) -> Self {
        self.by_kind.insert(kind, behavior);
        self
    }

    /// Every filter set received, in call order
    pub fn calls(&self) -> Vec<Vec<Filter>> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls whose filters ask for `id`
    pub fn calls_for_id(&self, id: &str) -> usize {
        self.count_calls(|filter| filter.ids.as_ref().is_some_and(|ids| ids.iter().any(|i| i == id)))
    }

    /// Calls whose filters ask for `kind`
    pub fn calls_for_kind(&self, kind: u32) -> usize {
        self.count_calls(|filter| filter.kinds.as_ref().is_some_and(|kinds| kinds.contains(&kind)))
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    fn count_calls(&self, pred: impl Fn(&Filter) -> bool) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|filters| filters.iter().any(&pred))
            .count()
    }

    fn behavior_for(&self, filters: &[Filter]) -> Option<Behavior> {
        filters.iter().find_map(|filter| {
            let by_id = filter
                .ids
                .iter()
                .flatten()
                .find_map(|id| self.by_id.get(id));
            let by_kind = filter
                .kinds
                .iter()
                .flatten()
                .find_map(|kind| self.by_kind.get(kind));
            by_id.or(by_kind).cloned()
        })
    }
}

#[async_trait]
impl NetworkQueryClient for ScriptedQueryClient {
    async fn query(
        &self,
        filters: &[Filter],
        _options: &QueryOptions,
    ) -> Result<Vec<ContentItem>, QueryError> {
        self.calls.lock().push(filters.to_vec());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match self.behavior_for(filters) {
            Some(Behavior::Delay(delay)) => tokio::time::sleep(delay).await,
            Some(Behavior::Hang) => futures::future::pending::<()>().await,
            Some(Behavior::Fail(err)) => return Err(err),
            None => {}
        }

        Ok(self.inner.select(filters))
    }
}
