use notefeed_core::{CancellationToken, EngagementAggregator, FeedConfig, QueryError};
use notefeed_model::{kinds, EngagementSnapshot};
use notefeed_test_utils::{comment_on, hex_id, reaction_to, zap_for, Behavior, ScriptedQueryClient};
use std::sync::Arc;
use std::time::Duration;

fn engaged(target: &str, reactions: u8, comments: u8, zaps: u8) -> Vec<notefeed_model::ContentItem> {
    let mut items = Vec::new();
    let mut n = 100;
    for _ in 0..reactions {
        items.push(reaction_to(n, target));
        n += 1;
    }
    for _ in 0..comments {
        items.push(comment_on(n, target));
        n += 1;
    }
    for _ in 0..zaps {
        items.push(zap_for(n, target));
        n += 1;
    }
    items
}

fn aggregator(
    client: ScriptedQueryClient,
    config: &FeedConfig,
) -> (Arc<ScriptedQueryClient>, EngagementAggregator<ScriptedQueryClient>) {
    let client = Arc::new(client);
    let aggregator = EngagementAggregator::new(Arc::clone(&client), config);
    (client, aggregator)
}

#[tokio::test(start_paused = true)]
async fn test_reaction_timeout_degrades_only_reactions() {
    let target = hex_id(1);
    let client = ScriptedQueryClient::new(engaged(&target, 3, 5, 2))
        .with_kind(kinds::REACTION, Behavior::Hang);
    let (_client, aggregator) = aggregator(client, &FeedConfig::new());

    let snapshot = aggregator.aggregate(&target, &CancellationToken::new()).await;

    assert_eq!(snapshot, EngagementSnapshot::new(0, 5, 2));
}

#[tokio::test]
async fn test_simultaneous_requests_share_one_load() {
    let target = hex_id(1);
    let client = ScriptedQueryClient::new(engaged(&target, 1, 2, 3))
        .with_latency(Duration::from_millis(20));
    let (client, aggregator) = aggregator(client, &FeedConfig::new());
    let signal = CancellationToken::new();

    let (first, second) = tokio::join!(
        aggregator.aggregate(&target, &signal),
        aggregator.aggregate(&target, &signal),
    );

    assert_eq!(first, second);
    assert_eq!(first, EngagementSnapshot::new(1, 2, 3));
    // one load: one sub-query per category
    assert_eq!(client.call_count(), 3);
    assert_eq!(aggregator.cache().stats().loads, 1);
}

#[tokio::test]
async fn test_each_category_is_queried_by_kind_and_target() {
    let target = hex_id(1);
    let (client, aggregator) = aggregator(ScriptedQueryClient::new([]), &FeedConfig::new());

    aggregator.aggregate(&target, &CancellationToken::new()).await;

    for kind in [kinds::REACTION, kinds::TEXT_NOTE, kinds::ZAP_RECEIPT] {
        assert_eq!(client.calls_for_kind(kind), 1);
    }
    for filters in client.calls() {
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].tags.get(&'e'), Some(&vec![target.clone()]));
        assert_eq!(filters[0].limit, Some(1_000));
    }
}

#[tokio::test]
async fn test_failed_category_is_zero() {
    let target = hex_id(1);
    let client = ScriptedQueryClient::new(engaged(&target, 4, 1, 2))
        .with_kind(kinds::ZAP_RECEIPT, Behavior::Fail(QueryError::source_error("closed")));
    let (_client, aggregator) = aggregator(client, &FeedConfig::new());

    let snapshot = aggregator.aggregate(&target, &CancellationToken::new()).await;

    assert_eq!(snapshot, EngagementSnapshot::new(4, 1, 0));
}

#[tokio::test]
async fn test_counts_saturate_at_limit() {
    let target = hex_id(1);
    let mut config = FeedConfig::new();
    config.engagement_limit = 2;
    let (_client, aggregator) = aggregator(ScriptedQueryClient::new(engaged(&target, 5, 0, 1)), &config);

    let snapshot = aggregator.aggregate(&target, &CancellationToken::new()).await;

    assert_eq!(snapshot, EngagementSnapshot::new(2, 0, 1));
}

#[tokio::test]
async fn test_items_are_cached_independently() {
    let first = hex_id(1);
    let second = hex_id(2);
    let mut items = engaged(&first, 1, 0, 0);
    items.push(reaction_to(200, &second));
    items.push(reaction_to(201, &second));
    let (client, aggregator) = aggregator(ScriptedQueryClient::new(items), &FeedConfig::new());
    let signal = CancellationToken::new();

    let a = aggregator.aggregate(&first, &signal).await;
    let b = aggregator.aggregate(&second, &signal).await;

    assert_eq!(a.reaction_count, 1);
    assert_eq!(b.reaction_count, 2);
    assert_eq!(client.call_count(), 6);
}

#[tokio::test]
async fn test_stale_snapshot_is_recomputed() {
    let target = hex_id(1);
    let config = FeedConfig::new().with_engagement_staleness(Duration::from_millis(50));
    let (client, aggregator) = aggregator(ScriptedQueryClient::new(engaged(&target, 1, 1, 1)), &config);
    let signal = CancellationToken::new();

    aggregator.aggregate(&target, &signal).await;
    aggregator.aggregate(&target, &signal).await;
    assert_eq!(client.call_count(), 3);

    tokio::time::sleep(Duration::from_millis(120)).await;
    aggregator.aggregate(&target, &signal).await;
    assert_eq!(client.call_count(), 6);
}
