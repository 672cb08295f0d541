//! Remote data cache.
//!
//! [`QueryClient`] keeps the last good response per [`QueryKey`] and makes
//! sure concurrent readers of the same key share a single request.
//!
//! # Consistency
//!
//! - A fetch only stores its result if it is still the registered flight for
//!   its key when it completes. [`QueryClient::invalidate`],
//!   [`QueryClient::write`] and [`QueryClient::clear`] unregister flights, so
//!   a response that was already on its way when the user logged out can
//!   never repopulate the cache.
//! - Errors are handed to every waiting reader but never stored.
//! - Registration, commit and invalidation are serialized by one mutex; the
//!   mutex is never held while a request is in progress.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::ClientError;
use crate::transport::decode;

/// What a read resolves to. Values are shared, not copied, between readers.
pub type QueryResult = Result<Arc<Value>, ClientError>;

type SharedFetch = Shared<BoxFuture<'static, QueryResult>>;

/// Default upper bound on cached entries.
const DEFAULT_MAX_ENTRIES: u64 = 1_000;

/// How long `auth/me` is served without asking the server again.
pub const IDENTITY_STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Well-known cache paths.
pub mod keys {
    use loomline_core::OrderId;

    use super::QueryKey;

    pub const AUTH_ME: &str = "auth/me";
    pub const CART: &str = "cart";
    pub const ORDERS: &str = "orders";
    pub const WATCHLIST: &str = "watchlist";
    pub const UPI_SETTINGS: &str = "settings/upi";

    /// Paths holding data that belongs to the logged-in user.
    pub const IDENTITY_SCOPED: [&str; 4] = [AUTH_ME, CART, ORDERS, WATCHLIST];

    #[must_use]
    pub fn order(id: OrderId) -> QueryKey {
        QueryKey::new(format!("{ORDERS}/{id}"))
    }
}

// =============================================================================
// Keys and policy
// =============================================================================

/// Logical address of a cached resource: an API path below `/api` plus
/// query parameters. Parameters are ordered so keys compare structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey {
    path: String,
    params: BTreeMap<String, String>,
}

impl QueryKey {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Request path for this key, e.g. `/api/products?category=kurtas`.
    #[must_use]
    pub fn endpoint(&self) -> String {
        let mut endpoint = format!("/api/{}", self.path);
        if !self.params.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.params)
                .finish();
            endpoint.push('?');
            endpoint.push_str(&query);
        }
        endpoint
    }

    /// Whether this key lives under `prefix`, matching whole path segments:
    /// `orders` covers `orders` and `orders/12` but not `orders-archive`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim_end_matches('/');
        self.path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Freshness rules for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    /// How long a stored value is returned without refetching.
    pub stale_time: Duration,
    /// Whether [`QueryClient::revalidate_on_focus`] drops the entry.
    pub revalidate_on_focus: bool,
}

impl KeyPolicy {
    #[must_use]
    pub const fn stale_after(stale_time: Duration) -> Self {
        Self {
            stale_time,
            revalidate_on_focus: false,
        }
    }
}

/// Per-path freshness rules with a default for everything else.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    default: KeyPolicy,
    overrides: HashMap<String, KeyPolicy>,
    max_entries: u64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(Duration::ZERO, IDENTITY_STALE_TIME)
    }
}

impl CachePolicy {
    /// `auth/me` gets `identity_stale_time` and is revalidated on focus;
    /// every other path uses `default_stale_time`.
    #[must_use]
    pub fn new(default_stale_time: Duration, identity_stale_time: Duration) -> Self {
        let identity = KeyPolicy {
            stale_time: identity_stale_time,
            revalidate_on_focus: true,
        };

        Self {
            default: KeyPolicy::stale_after(default_stale_time),
            overrides: HashMap::from([(keys::AUTH_ME.to_owned(), identity)]),
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    #[must_use]
    pub fn with_override(mut self, path: impl Into<String>, policy: KeyPolicy) -> Self {
        self.overrides.insert(path.into(), policy);
        self
    }

    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub fn for_key(&self, key: &QueryKey) -> KeyPolicy {
        self.overrides.get(key.path()).copied().unwrap_or(self.default)
    }
}

// =============================================================================
// QueryClient
// =============================================================================

#[derive(Debug, Clone)]
struct CachedEntry {
    value: Arc<Value>,
    fetched_at: Instant,
}

impl CachedEntry {
    fn now(value: Arc<Value>) -> Self {
        Self {
            value,
            fetched_at: Instant::now(),
        }
    }
}

struct Flight {
    id: u64,
    future: SharedFetch,
}

type Flights = Arc<Mutex<HashMap<QueryKey, Flight>>>;

/// Request cache with deduplicated fetches.
///
/// Owned by the application root and shared by `Arc`; there is no global
/// instance.
pub struct QueryClient {
    entries: Cache<QueryKey, CachedEntry>,
    flights: Flights,
    next_flight: AtomicU64,
    policy: CachePolicy,
}

impl std::fmt::Debug for QueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClient")
            .field("entries", &self.entries.entry_count())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

impl QueryClient {
    #[must_use]
    pub fn new(policy: CachePolicy) -> Self {
        let entries = Cache::builder().max_capacity(policy.max_entries).build();

        Self {
            entries,
            flights: Arc::new(Mutex::new(HashMap::new())),
            next_flight: AtomicU64::new(0),
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Read `key`, fetching it if there is no fresh value.
    ///
    /// `fetch` is only called when no request for `key` is already running;
    /// otherwise the caller joins that request and gets its result.
    ///
    /// # Errors
    ///
    /// Returns the fetch error. Errors are not cached.
    pub async fn read<F, Fut>(&self, key: &QueryKey, fetch: F) -> QueryResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        if let Some(value) = self.fresh(key).await {
            return Ok(value);
        }

        let flight = {
            let mut flights = self.flights.lock().await;
            if let Some(flight) = flights.get(key) {
                flight.future.clone()
            } else {
                let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                let future = self.start_flight(key.clone(), id, fetch());
                flights.insert(
                    key.clone(),
                    Flight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        flight.await
    }

    /// [`read`](Self::read) and decode the value.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`ClientError::Decode`] if the value does
    /// not match `R`.
    pub async fn read_as<R, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<R, ClientError>
    where
        R: DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let value = self.read(key, fetch).await?;
        decode(&value)
    }

    /// The stored value for `key`, fresh or not. Never fetches.
    pub async fn peek(&self, key: &QueryKey) -> Option<Arc<Value>> {
        self.entries.get(key).await.map(|entry| entry.value)
    }

    async fn fresh(&self, key: &QueryKey) -> Option<Arc<Value>> {
        let entry = self.entries.get(key).await?;
        let stale_time = self.policy.for_key(key).stale_time;
        (entry.fetched_at.elapsed() < stale_time).then_some(entry.value)
    }

    fn start_flight<Fut>(&self, key: QueryKey, id: u64, fetch: Fut) -> SharedFetch
    where
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let entries = self.entries.clone();
        let flights = Arc::clone(&self.flights);

        async move {
            let result = fetch.await.map(Arc::new);

            let mut flights = flights.lock().await;
            if flights.get(&key).is_some_and(|flight| flight.id == id) {
                flights.remove(&key);
                if let Ok(value) = &result {
                    entries
                        .insert(key, CachedEntry::now(Arc::clone(value)))
                        .await;
                }
            } else {
                tracing::debug!(path = key.path(), "Discarding result of detached fetch");
            }

            result
        }
        .boxed()
        .shared()
    }

    /// Drop the entry for `key` and detach any fetch in flight for it.
    pub async fn invalidate(&self, key: &QueryKey) {
        let mut flights = self.flights.lock().await;
        flights.remove(key);
        self.entries.invalidate(key).await;
    }

    /// [`invalidate`](Self::invalidate) every key under `prefix`.
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let mut flights = self.flights.lock().await;
        flights.retain(|key, _| !key.has_prefix(prefix));

        let matching: Vec<Arc<QueryKey>> = self
            .entries
            .iter()
            .filter(|(key, _)| key.has_prefix(prefix))
            .map(|(key, _)| key)
            .collect();
        for key in matching {
            self.entries.invalidate(key.as_ref()).await;
        }

        tracing::debug!(prefix, "Invalidated cache prefix");
    }

    /// Store `value` as fresh without asking the server, detaching any fetch
    /// in flight for `key`.
    pub async fn write(&self, key: &QueryKey, value: Value) {
        let mut flights = self.flights.lock().await;
        flights.remove(key);
        self.entries
            .insert(key.clone(), CachedEntry::now(Arc::new(value)))
            .await;
    }

    /// Drop entries whose policy asks for revalidation when the app regains
    /// focus.
    pub async fn revalidate_on_focus(&self) {
        let flagged: Vec<Arc<QueryKey>> = self
            .entries
            .iter()
            .filter(|(key, _)| self.policy.for_key(key).revalidate_on_focus)
            .map(|(key, _)| key)
            .collect();

        for key in flagged {
            self.invalidate(&key).await;
        }
    }

    /// Drop every entry and detach every fetch.
    pub async fn clear(&self) {
        let mut flights = self.flights.lock().await;
        flights.clear();
        self.entries.invalidate_all();
        self.entries.run_pending_tasks().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use serde_json::json;

    use super::*;

    /// Counts calls and resolves after `delay`, so concurrent readers overlap.
    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: Value,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Value, ClientError>> + use<> {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[test]
    fn test_key_endpoint_and_ordering() {
        let a = QueryKey::new("products")
            .with_param("q", "silk saree")
            .with_param("category", "sarees");
        let b = QueryKey::new("products")
            .with_param("category", "sarees")
            .with_param("q", "silk saree");

        assert_eq!(a, b);
        assert_eq!(a.endpoint(), "/api/products?category=sarees&q=silk+saree");
        assert_eq!(QueryKey::new("cart").endpoint(), "/api/cart");
    }

    #[test]
    fn test_prefix_matches_whole_segments() {
        assert!(QueryKey::new("orders").has_prefix("orders"));
        assert!(QueryKey::new("orders/12").has_prefix("orders"));
        assert!(QueryKey::new("orders/12").has_prefix("orders/"));
        assert!(!QueryKey::new("orders-archive").has_prefix("orders"));
        assert!(!QueryKey::new("cart").has_prefix("orders"));
    }

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        let me = policy.for_key(&QueryKey::new(keys::AUTH_ME));
        assert_eq!(me.stale_time, IDENTITY_STALE_TIME);
        assert!(me.revalidate_on_focus);

        let cart = policy.for_key(&QueryKey::new(keys::CART));
        assert_eq!(cart.stale_time, Duration::ZERO);
        assert!(!cart.revalidate_on_focus);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reads_share_one_fetch() {
        let cache = QueryClient::default();
        let key = QueryKey::new(keys::CART);
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.read(&key, counting_fetch(&calls, json!({"n": 1}), Duration::from_millis(50))),
            cache.read(&key, counting_fetch(&calls, json!({"n": 2}), Duration::from_millis(50))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, json!({"n": 1}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_readers_share_errors_and_errors_are_not_cached() {
        let cache = QueryClient::default();
        let key = QueryKey::new(keys::ORDERS);
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: &Arc<AtomicUsize>| {
            let calls = Arc::clone(calls);
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Err::<Value, _>(ClientError::Network("connection reset".to_owned()))
                }
                .boxed()
            }
        };

        let (a, b) = tokio::join!(cache.read(&key, failing(&calls)), cache.read(&key, failing(&calls)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert!(cache.peek(&key).await.is_none());

        let again = cache
            .read(&key, counting_fetch(&calls, json!([]), Duration::ZERO))
            .await;
        assert_eq!(*again.unwrap(), json!([]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_value_is_served_until_stale() {
        let cache = QueryClient::default();
        let key = QueryKey::new(keys::AUTH_ME);
        let calls = Arc::new(AtomicUsize::new(0));

        cache
            .read(&key, counting_fetch(&calls, json!({"id": 1}), Duration::ZERO))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        cache
            .read(&key, counting_fetch(&calls, json!({"id": 1}), Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(IDENTITY_STALE_TIME).await;
        cache
            .read(&key, counting_fetch(&calls, json!({"id": 1}), Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_stale_time_refetches_every_read() {
        let cache = QueryClient::default();
        let key = QueryKey::new(keys::WATCHLIST);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            cache
                .read(&key, counting_fetch(&calls, json!([]), Duration::ZERO))
                .await
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_detaches_in_flight_fetch() {
        let cache = Arc::new(QueryClient::default());
        let key = QueryKey::new(keys::CART);
        let calls = Arc::new(AtomicUsize::new(0));

        let reader = {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let fetch = counting_fetch(&calls, json!({"owner": "previous"}), Duration::from_millis(100));
            tokio::spawn(async move { cache.read(&key, fetch).await })
        };
        tokio::task::yield_now().await;
        cache.invalidate(&key).await;

        // The detached reader still gets its answer...
        let old = reader.await.unwrap().unwrap();
        assert_eq!(*old, json!({"owner": "previous"}));
        // ...but it was never stored.
        assert!(cache.peek(&key).await.is_none());

        let fresh = cache
            .read(&key, counting_fetch(&calls, json!({"owner": "next"}), Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*fresh, json!({"owner": "next"}));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_wins_over_in_flight_fetch() {
        let cache = Arc::new(QueryClient::default());
        let key = QueryKey::new(keys::CART);
        let calls = Arc::new(AtomicUsize::new(0));

        let reader = {
            let cache = Arc::clone(&cache);
            let key = key.clone();
            let fetch = counting_fetch(&calls, json!({"items": ["stale"]}), Duration::from_millis(100));
            tokio::spawn(async move { cache.read(&key, fetch).await })
        };
        tokio::task::yield_now().await;
        cache.write(&key, json!({"items": []})).await;
        reader.await.unwrap().unwrap();

        assert_eq!(*cache.peek(&key).await.unwrap(), json!({"items": []}));
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = QueryClient::default();
        cache.write(&QueryKey::new("orders"), json!([])).await;
        cache.write(&QueryKey::new("orders/7"), json!({"id": 7})).await;
        cache.write(&QueryKey::new("cart"), json!({})).await;

        cache.invalidate_prefix(keys::ORDERS).await;

        assert!(cache.peek(&QueryKey::new("orders")).await.is_none());
        assert!(cache.peek(&QueryKey::new("orders/7")).await.is_none());
        assert!(cache.peek(&QueryKey::new("cart")).await.is_some());
    }

    #[tokio::test]
    async fn test_revalidate_on_focus_only_drops_flagged_paths() {
        let cache = QueryClient::default();
        cache.write(&QueryKey::new(keys::AUTH_ME), json!({"id": 1})).await;
        cache.write(&QueryKey::new(keys::CART), json!({})).await;

        cache.revalidate_on_focus().await;

        assert!(cache.peek(&QueryKey::new(keys::AUTH_ME)).await.is_none());
        assert!(cache.peek(&QueryKey::new(keys::CART)).await.is_some());
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = QueryClient::default();
        cache.write(&QueryKey::new(keys::CART), json!({})).await;
        cache.write(&keys::order(loomline_core::OrderId::new(3)), json!({})).await;

        cache.clear().await;

        assert!(cache.peek(&QueryKey::new(keys::CART)).await.is_none());
        assert_eq!(cache.entries.entry_count(), 0);
    }
}
