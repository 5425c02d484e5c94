//! Network query capability
//!
//! [`NetworkQueryClient`] is supplied by the embedder and may fan out to
//! any number of untrusted sources. The engine never calls it directly:
//! every call goes through [`guarded_query`], which races it against the
//! caller's lifecycle signal and a per-call timeout.

mod memory;

pub use memory::MemoryQueryClient;
pub use tokio_util::sync::CancellationToken;

use crate::error::QueryError;
use async_trait::async_trait;
use notefeed_model::{ContentItem, Filter};
use std::future::Future;
use std::time::Duration;

/// Per-call options handed to the client
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Caller's lifecycle signal
    pub signal: CancellationToken,
    /// Timeout for this call
    pub timeout: Duration,
}

impl QueryOptions {
    /// Create options
    #[inline]
    #[must_use]
    pub fn new(signal: CancellationToken, timeout: Duration) -> Self {
        Self { signal, timeout }
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Source of content items
///
/// Implementations should honour `options.signal` and apply their own
/// internal guard, but the engine does not rely on either: a hung source
/// surfaces as [`QueryError::Timeout`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkQueryClient: Send + Sync {
    /// Items matching any of `filters`
    async fn query(
        &self,
        filters: &[Filter],
        options: &QueryOptions,
    ) -> Result<Vec<ContentItem>, QueryError>;
}

/// Run one query under the caller's signal and the per-call timeout
///
/// # Errors
/// - `QueryError::Cancelled` if the signal fires first (or already has)
/// - `QueryError::Timeout` if the timeout elapses first
/// - the client's own error otherwise
pub async fn guarded_query<C>(
    client: &C,
    filters: &[Filter],
    options: &QueryOptions,
) -> Result<Vec<ContentItem>, QueryError>
where
    C: NetworkQueryClient + ?Sized,
{
    if options.signal.is_cancelled() {
        return Err(QueryError::Cancelled);
    }

    tokio::select! {
        biased;
        () = options.signal.cancelled() => Err(QueryError::Cancelled),
        result = tokio::time::timeout(options.timeout, client.query(filters, options)) => {
            result.unwrap_or(Err(QueryError::Timeout {
                after_ms: options.timeout_ms(),
            }))
        }
    }
}

/// Await `fut` unless `signal` fires first
pub async fn until_cancelled<F: Future>(signal: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = signal.cancelled() => None,
        output = fut => Some(output),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(timeout_ms: u64) -> QueryOptions {
        QueryOptions::new(CancellationToken::new(), Duration::from_millis(timeout_ms))
    }

    #[tokio::test]
    async fn passes_through_results() {
        let mut client = MockNetworkQueryClient::new();
        client
            .expect_query()
            .times(1)
            .returning(|_, _| Ok(vec![ContentItem::new("a", "b", 0, 1, "hi")]));

        let items = guarded_query(&client, &[Filter::new()], &options(1_000))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_signal_skips_the_call() {
        let mut client = MockNetworkQueryClient::new();
        client.expect_query().times(0);

        let options = options(1_000);
        options.signal.cancel();

        let err = guarded_query(&client, &[Filter::new()], &options)
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Cancelled);
    }

    #[tokio::test]
    async fn client_errors_pass_through() {
        let mut client = MockNetworkQueryClient::new();
        client
            .expect_query()
            .returning(|_, _| Err(QueryError::source_error("relay closed")));

        let err = guarded_query(&client, &[Filter::new()], &options(1_000))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    struct Hanging;

    #[async_trait]
    impl NetworkQueryClient for Hanging {
        async fn query(
            &self,
            _filters: &[Filter],
            _options: &QueryOptions,
        ) -> Result<Vec<ContentItem>, QueryError> {
            futures::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_source_times_out() {
        let err = guarded_query(&Hanging, &[Filter::new()], &options(3_000))
            .await
            .unwrap_err();
        assert_eq!(err, QueryError::Timeout { after_ms: 3_000 });
    }

    #[tokio::test(start_paused = true)]
    async fn signal_cancels_hung_source() {
        let options = options(60_000);
        let signal = options.signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            signal.cancel();
        });

        let err = guarded_query(&Hanging, &[Filter::new()], &options)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn until_cancelled_yields_none_after_cancel() {
        let signal = CancellationToken::new();
        assert_eq!(until_cancelled(&signal, async { 7 }).await, Some(7));

        signal.cancel();
        assert_eq!(until_cancelled(&signal, futures::future::pending::<u8>()).await, None);
    }
}
