//! The request-scoped query cache.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;

use crate::{
    DehydratedQuery, DehydratedQueryState, DehydratedState, QueryError, QueryKey, QueryOptions,
    QueryStatus,
};

#[derive(Debug, Clone)]
struct Entry {
    key: QueryKey,
    data: Option<Value>,
    data_updated_at: i64,
    fetched_at: Instant,
    status: QueryStatus,
    error: Option<QueryError>,
}

struct Inner {
    options: QueryOptions,
    entries: Mutex<HashMap<String, Entry>>,
    /// One async gate per query hash; holding it means "this key is being fetched".
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Data-fetching cache for a single render.
///
/// Cloning is cheap and clones share the same cache. A client must never
/// outlive the request it was created for: the renderer dehydrates and then
/// [`clear`](QueryClient::clear)s it when rendering finishes.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryClient")
            .field("options", &self.inner.options)
            .field("queries", &self.len())
            .finish()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryClient {
    /// Client with server defaults.
    pub fn new() -> Self {
        Self::with_options(QueryOptions::server())
    }

    pub fn with_options(options: QueryOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                entries: Mutex::new(HashMap::new()),
                gates: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.inner.options
    }

    /// Number of cached queries, in any status.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Whether two handles share the same cache.
    pub fn ptr_eq(&self, other: &QueryClient) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Cached data for `key`, regardless of staleness.
    pub fn get_query_data<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let value = self.entries().get(&key.hash())?.data.clone()?;
        serde_json::from_value(value).ok()
    }

    pub fn status(&self, key: &QueryKey) -> Option<QueryStatus> {
        self.entries().get(&key.hash()).map(|e| e.status)
    }

    /// Store data directly, as if it had just been fetched.
    pub fn set_query_data<T: Serialize>(&self, key: QueryKey, data: &T) -> Result<(), QueryError> {
        let hash = key.hash();
        let value = encode(&hash, data)?;
        self.store_success(hash, key, value, now_millis());
        Ok(())
    }

    /// Return fresh cached data for `key`, or fetch it.
    ///
    /// Concurrent calls for the same key share one fetch: the first caller
    /// runs `fetch` while the others wait and then read its result.
    pub async fn ensure_query_data<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, QueryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let hash = key.hash();
        if let Some(value) = self.fresh_value(&hash) {
            return decode(&hash, value);
        }

        let waiting_since = Instant::now();
        let gate = self.gate(&hash);
        let _fetching = gate.lock().await;

        if let Some(value) = self.fresh_value(&hash) {
            return decode(&hash, value);
        }
        if let Some(err) = self.error_since(&hash, waiting_since) {
            return Err(err);
        }

        match self.run_fetch(&hash, fetch).await {
            Ok(data) => {
                let value = encode(&hash, &data)?;
                self.store_success(hash, key, value, now_millis());
                Ok(data)
            }
            Err(err) => {
                self.store_error(hash, key, err.clone());
                Err(err)
            }
        }
    }

    /// Like [`ensure_query_data`](Self::ensure_query_data), but a failure is
    /// only recorded as an error entry, never returned.
    pub async fn prefetch_query<T, F, Fut>(&self, key: QueryKey, fetch: F)
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Err(err) = self.ensure_query_data::<T, F, Fut>(key, fetch).await {
            tracing::debug!(query = err.key(), error = %err, "prefetch failed");
        }
    }

    /// Snapshot of every successful query.
    pub fn dehydrate(&self) -> DehydratedState {
        let mut queries: Vec<DehydratedQuery> = self
            .entries()
            .iter()
            .filter(|(_, e)| e.status == QueryStatus::Success)
            .filter_map(|(hash, e)| {
                Some(DehydratedQuery {
                    query_key: e.key.clone(),
                    query_hash: hash.clone(),
                    state: DehydratedQueryState {
                        data: e.data.clone()?,
                        data_updated_at: e.data_updated_at,
                        status: e.status,
                    },
                })
            })
            .collect();
        queries.sort_by(|a, b| a.query_hash.cmp(&b.query_hash));

        DehydratedState {
            mutations: Vec::new(),
            queries,
        }
    }

    /// Load a snapshot produced by [`dehydrate`](Self::dehydrate).
    pub fn hydrate(&self, state: &DehydratedState) {
        for query in &state.queries {
            if query.state.status != QueryStatus::Success {
                continue;
            }
            self.store_success(
                query.query_hash.clone(),
                query.query_key.clone(),
                query.state.data.clone(),
                query.state.data_updated_at,
            );
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries().clear();
        self.inner
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    async fn run_fetch<T, F, Fut>(&self, hash: &str, mut fetch: F) -> Result<T, QueryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let options = &self.inner.options;
        let mut attempt = 0;

        loop {
            let outcome = match options.fetch_timeout {
                Some(limit) => match tokio::time::timeout(limit, fetch()).await {
                    Ok(result) => result.map_err(|e| fetch_error(hash, e)),
                    Err(_) => Err(QueryError::Timeout {
                        key: hash.to_string(),
                        after: limit,
                    }),
                },
                None => fetch().await.map_err(|e| fetch_error(hash, e)),
            };

            match outcome {
                Ok(data) => return Ok(data),
                Err(err) if options.retry.should_retry(attempt) => {
                    let delay = options.retry.backoff.delay_for_attempt(attempt);
                    tracing::debug!(query = hash, attempt, error = %err, "retrying query");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn gate(&self, hash: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.inner
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(hash.to_string())
            .or_default()
            .clone()
    }

    fn fresh_value(&self, hash: &str) -> Option<Value> {
        let entries = self.entries();
        let entry = entries.get(hash)?;
        let fresh = entry.status == QueryStatus::Success
            && entry.fetched_at.elapsed() < self.inner.options.stale_time;
        if fresh {
            entry.data.clone()
        } else {
            None
        }
    }

    fn error_since(&self, hash: &str, since: Instant) -> Option<QueryError> {
        let entries = self.entries();
        let entry = entries.get(hash)?;
        if entry.status == QueryStatus::Error && entry.fetched_at >= since {
            entry.error.clone()
        } else {
            None
        }
    }

    fn store_success(&self, hash: String, key: QueryKey, value: Value, updated_at: i64) {
        self.entries().insert(
            hash,
            Entry {
                key,
                data: Some(value),
                data_updated_at: updated_at,
                fetched_at: Instant::now(),
                status: QueryStatus::Success,
                error: None,
            },
        );
    }

    fn store_error(&self, hash: String, key: QueryKey, error: QueryError) {
        let mut entries = self.entries();
        let previous = entries.remove(&hash);
        entries.insert(
            hash,
            Entry {
                key,
                // Keep the last good data around, as the client cache does.
                data: previous.as_ref().and_then(|p| p.data.clone()),
                data_updated_at: previous.map(|p| p.data_updated_at).unwrap_or_default(),
                fetched_at: Instant::now(),
                status: QueryStatus::Error,
                error: Some(error),
            },
        );
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn fetch_error(hash: &str, err: anyhow::Error) -> QueryError {
    QueryError::Fetch {
        key: hash.to_string(),
        message: format!("{:#}", err),
    }
}

fn encode<T: Serialize>(hash: &str, data: &T) -> Result<Value, QueryError> {
    serde_json::to_value(data).map_err(|e| QueryError::Data {
        key: hash.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(hash: &str, value: Value) -> Result<T, QueryError> {
    serde_json::from_value(value).map_err(|e| QueryError::Data {
        key: hash.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackoffStrategy, RetryPolicy};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    // === ensure_query_data Tests ===

    #[tokio::test]
    async fn test_ensure_fetches_once_then_serves_cache() {
        let client = QueryClient::new();
        let calls = counter();

        for _ in 0..3 {
            let calls = calls.clone();
            let title: String = client
                .ensure_query_data(QueryKey::new("article").with("1"), move || {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok("Hello".to_string())
                    }
                })
                .await
                .unwrap();
            assert_eq!(title, "Hello");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_is_coalesced() {
        let client = QueryClient::new();
        let calls = counter();

        let fetches = (0..8).map(|_| {
            let client = client.clone();
            let calls = calls.clone();
            async move {
                client
                    .ensure_query_data(QueryKey::new("tags"), || {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(vec!["rust".to_string()])
                        }
                    })
                    .await
            }
        });

        let results = futures::future::join_all(fetches).await;
        assert!(results.iter().all(|r| r.as_ref().unwrap() == &vec!["rust"]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_data_is_refetched() {
        let client = QueryClient::new();
        let calls = counter();
        let fetch = || {
            let calls = calls.clone();
            async move { Ok(calls.fetch_add(1, Ordering::SeqCst)) }
        };

        let first: usize = client.ensure_query_data("n".into(), fetch).await.unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        let cached: usize = client.ensure_query_data("n".into(), fetch).await.unwrap();
        tokio::time::advance(Duration::from_secs(6)).await;
        let refreshed: usize = client.ensure_query_data("n".into(), fetch).await.unwrap();

        assert_eq!((first, cached, refreshed), (0, 0, 1));
    }

    #[tokio::test]
    async fn test_fetch_error_is_recorded_and_not_dehydrated() {
        let client = QueryClient::new();
        let result: Result<String, _> = client
            .ensure_query_data(QueryKey::new("broken"), || async {
                Err(anyhow::anyhow!("upstream down"))
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, QueryError::Fetch { ref message, .. } if message.contains("upstream down")));
        assert_eq!(client.status(&QueryKey::new("broken")), Some(QueryStatus::Error));
        assert!(client.dehydrate().is_empty());
    }

    // === Retry & Timeout Tests ===

    #[tokio::test]
    async fn test_retry_policy_repeats_failed_fetch() {
        let client = QueryClient::with_options(
            QueryOptions::server()
                .with_retry(RetryPolicy::new(2).with_backoff(BackoffStrategy::None)),
        );
        let calls = counter();

        let value: u32 = client
            .ensure_query_data(QueryKey::new("flaky"), || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        anyhow::bail!("try again");
                    }
                    Ok(7)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout() {
        let client = QueryClient::with_options(
            QueryOptions::server().with_fetch_timeout(Duration::from_millis(100)),
        );

        let result: Result<u32, _> = client
            .ensure_query_data(QueryKey::new("slow"), || async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(QueryError::Timeout { .. })));
    }

    // === Prefetch Tests ===

    #[tokio::test]
    async fn test_prefetch_swallows_errors() {
        let client = QueryClient::new();
        client
            .prefetch_query::<u32, _, _>(QueryKey::new("x"), || async { anyhow::bail!("nope") })
            .await;
        client
            .prefetch_query(QueryKey::new("y"), || async { Ok(json!({"ok": true})) })
            .await;

        assert_eq!(client.status(&QueryKey::new("x")), Some(QueryStatus::Error));
        assert_eq!(
            client.get_query_data::<serde_json::Value>(&QueryKey::new("y")),
            Some(json!({"ok": true}))
        );
    }

    // === Dehydrate / Clear Tests ===

    #[tokio::test]
    async fn test_dehydrate_hydrate_and_clear() {
        let server = QueryClient::new();
        server
            .set_query_data(QueryKey::new("article").with("2"), &json!({"title": "B"}))
            .unwrap();
        server
            .set_query_data(QueryKey::new("article").with("1"), &json!({"title": "A"}))
            .unwrap();

        let snapshot = server.dehydrate();
        assert_eq!(snapshot.queries.len(), 2);
        assert_eq!(snapshot.queries[0].query_hash, r#"["article","1"]"#);

        server.clear();
        assert!(server.is_empty());
        assert!(server.dehydrate().is_empty());

        let client = QueryClient::new();
        client.hydrate(&snapshot);
        assert_eq!(
            client.get_query_data::<serde_json::Value>(&QueryKey::new("article").with("1")),
            Some(json!({"title": "A"}))
        );
    }

    #[test]
    fn test_clones_share_cache_but_new_clients_do_not() {
        let a = QueryClient::new();
        let b = a.clone();
        let c = QueryClient::new();
        a.set_query_data(QueryKey::new("k"), &1).unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(b.get_query_data::<i32>(&QueryKey::new("k")), Some(1));
        assert!(!a.ptr_eq(&c));
        assert!(c.is_empty());
    }
}
