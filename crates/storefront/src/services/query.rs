//! Keyed, cached, deduplicated async queries.
//!
//! A [`QueryClient`] runs a producer future for a [`QueryKey`] and keeps the
//! result in a `moka` cache. Concurrent fetches of the same key share one
//! producer run; later fetches are served from the cache until the entry
//! expires. Failed producers are never cached.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

const DEFAULT_CAPACITY: u64 = 1000;
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Identifies a query: a namespace plus the values that distinguish one
/// fetch from another within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    namespace: String,
    params: Vec<String>,
}

impl QueryKey {
    /// Start a key in `namespace` with no parameters.
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            params: Vec::new(),
        }
    }

    /// Append an identifying value.
    #[must_use]
    pub fn with(mut self, param: impl ToString) -> Self {
        self.params.push(param.to_string());
        self
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

/// Per-call query options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// When `false` the producer is not run and no value is returned.
    pub enabled: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl QueryOptions {
    /// Options that only fetch when `enabled` holds.
    #[must_use]
    pub const fn enabled_if(enabled: bool) -> Self {
        Self { enabled }
    }
}

/// Cache-backed query runner for values of type `V`.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct QueryClient<V> {
    cache: Cache<QueryKey, V>,
}

impl<V> QueryClient<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Client with the default policy (1000 entries, 5 minute TTL).
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(DEFAULT_CAPACITY, DEFAULT_TTL)
    }

    /// Client with an explicit capacity and time-to-live.
    #[must_use]
    pub fn with_policy(max_capacity: u64, time_to_live: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(time_to_live)
            .build();

        Self { cache }
    }

    /// Fetch the value for `key`, running `producer` only on a cache miss.
    ///
    /// Returns `Ok(None)` without touching the cache when the query is
    /// disabled.
    ///
    /// # Errors
    ///
    /// Returns the producer's error, shared with every caller that was
    /// waiting on the same key. The error is not cached.
    #[instrument(skip_all, fields(key = %key))]
    pub async fn fetch<F, Fut, E>(
        &self,
        key: QueryKey,
        options: QueryOptions,
        producer: F,
    ) -> Result<Option<V>, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Send + Sync + 'static,
    {
        if !options.enabled {
            debug!("Query disabled, skipping fetch");
            return Ok(None);
        }

        // Deferred so a cache hit never calls the producer.
        self.cache
            .try_get_with(key, async move { producer().await })
            .await
            .map(Some)
    }

    /// Drop the cached value for `key`.
    pub async fn invalidate(&self, key: &QueryKey) {
        self.cache.invalidate(key).await;
    }
}

impl<V> Default for QueryClient<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_producer(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> std::future::Ready<Result<u32, String>> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(value))
        }
    }

    #[test]
    fn test_query_key_display() {
        let key = QueryKey::new("orders").with("user-1").with(2);
        assert_eq!(key.to_string(), "orders:user-1:2");
    }

    #[test]
    fn test_options_default_enabled() {
        assert!(QueryOptions::default().enabled);
        assert!(!QueryOptions::enabled_if(false).enabled);
    }

    #[tokio::test]
    async fn test_disabled_query_never_runs_producer() {
        let client = QueryClient::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let result = client
            .fetch(
                QueryKey::new("profile"),
                QueryOptions::enabled_if(false),
                counting_producer(&calls, 7),
            )
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_second_fetch_served_from_cache() {
        let client = QueryClient::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("profile").with("user-1");

        let first = client
            .fetch(key.clone(), QueryOptions::default(), counting_producer(&calls, 7))
            .await
            .unwrap();
        let second = client
            .fetch(key, QueryOptions::default(), counting_producer(&calls, 8))
            .await
            .unwrap();

        assert_eq!(first, Some(7));
        assert_eq!(second, Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_fetch_separately() {
        let client = QueryClient::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a = client
            .fetch(
                QueryKey::new("profile").with("a"),
                QueryOptions::default(),
                counting_producer(&calls, 1),
            )
            .await
            .unwrap();
        let b = client
            .fetch(
                QueryKey::new("profile").with("b"),
                QueryOptions::default(),
                counting_producer(&calls, 2),
            )
            .await
            .unwrap();

        assert_eq!((a, b), (Some(1), Some(2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let client = QueryClient::<u32>::new();
        let key = QueryKey::new("flaky");

        let err = client
            .fetch(key.clone(), QueryOptions::default(), || async {
                Err::<u32, _>("upstream down".to_string())
            })
            .await
            .unwrap_err();
        assert_eq!(err.as_str(), "upstream down");

        let ok = client
            .fetch(key, QueryOptions::default(), || async { Ok::<_, String>(3) })
            .await
            .unwrap();
        assert_eq!(ok, Some(3));
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_producer() {
        let client = QueryClient::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("slow");

        let slow = |value: u32| {
            let calls = Arc::clone(&calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(value)
            }
        };

        let (a, b) = tokio::join!(
            client.fetch(key.clone(), QueryOptions::default(), slow(1)),
            client.fetch(key.clone(), QueryOptions::default(), slow(2)),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let client = QueryClient::<u32>::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = QueryKey::new("profile").with("user-1");

        client
            .fetch(key.clone(), QueryOptions::default(), counting_producer(&calls, 1))
            .await
            .unwrap();
        client.invalidate(&key).await;
        let refreshed = client
            .fetch(key, QueryOptions::default(), counting_producer(&calls, 2))
            .await
            .unwrap();

        assert_eq!(refreshed, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
