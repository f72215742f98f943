//! Fetch strategies: how a routed request combines cache and network.
//!
//! Cache problems never fail a request. A lookup error reads as a miss and a
//! write error is logged; the caller still gets the network response.

use std::fmt::Display;
use std::future::Future;

use lessonlink_settings::FetchStrategy;
use tracing::{debug, warn};

use crate::entry::CachedResponse;
use crate::router::Router;
use crate::tiered::OfflineCache;

/// Where a response came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// Served from a partition.
    Cache,
    /// Fetched from the network.
    Network,
}

/// A response together with its source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fetched {
    /// The response.
    pub response: CachedResponse,
    /// Where it came from.
    pub source: Source,
}

impl Fetched {
    fn cache(response: CachedResponse) -> Self {
        Self {
            response,
            source: Source::Cache,
        }
    }

    fn network(response: CachedResponse) -> Self {
        Self {
            response,
            source: Source::Network,
        }
    }
}

/// Serve `path` according to its route, calling `fetch` for network access.
///
/// - cache-first: a hit is returned without touching the network; a miss is
///   fetched and stored.
/// - network-first: fetch and store; on a network error fall back to the
///   cached copy, or return the error when there is none.
/// - network-only: fetch, never read or write the cache.
///
/// Only 2xx responses are stored.
pub async fn fetch_through<F, Fut, E>(
    cache: &OfflineCache,
    router: &Router,
    path: &str,
    fetch: F,
) -> Result<Fetched, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<CachedResponse, E>>,
    E: Display,
{
    let route = router.resolve(path);
    let partition = match (route.strategy, route.partition) {
        (FetchStrategy::NetworkOnly, _) | (_, None) => {
            return fetch().await.map(Fetched::network);
        }
        (_, Some(partition)) => partition,
    };

    if route.strategy == FetchStrategy::CacheFirst {
        if let Some(hit) = lookup(cache, partition, path) {
            debug!(partition, path, "cache hit");
            return Ok(Fetched::cache(hit));
        }
        let response = fetch().await?;
        store(cache, partition, path, &response);
        return Ok(Fetched::network(response));
    }

    match fetch().await {
        Ok(response) => {
            store(cache, partition, path, &response);
            Ok(Fetched::network(response))
        }
        Err(e) => match lookup(cache, partition, path) {
            Some(hit) => {
                warn!(partition, path, error = %e, "network failed, serving cached copy");
                Ok(Fetched::cache(hit))
            }
            None => Err(e),
        },
    }
}

fn lookup(cache: &OfflineCache, partition: &str, path: &str) -> Option<CachedResponse> {
    match cache.get(partition, path) {
        Ok(entry) => entry.map(|entry| entry.response),
        Err(e) => {
            warn!(partition, path, error = %e, "cache lookup failed");
            None
        }
    }
}

fn store(cache: &OfflineCache, partition: &str, path: &str, response: &CachedResponse) {
    if !response.is_success() {
        return;
    }
    if let Err(e) = cache.put(partition, path, response.clone()) {
        warn!(partition, path, error = %e, "cache write failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lessonlink_core::constants::{DYNAMIC_PARTITION, LESSON_PARTITION, STATIC_PARTITION};
    use lessonlink_core::logging::capture_logs;
    use lessonlink_settings::{CacheSettings, PartitionSettings, RouteSettings};
    use std::cell::Cell;

    fn setup() -> (OfflineCache, Router) {
        let settings = CacheSettings::default();
        (
            OfflineCache::from_settings(&settings),
            Router::from_settings(&settings.routes),
        )
    }

    async fn ok(body: &'static str) -> Result<CachedResponse, String> {
        Ok(CachedResponse::new(200, body))
    }

    async fn offline() -> Result<CachedResponse, String> {
        Err("offline".to_owned())
    }

    #[tokio::test]
    async fn cache_first_fills_then_hits() {
        let (cache, router) = setup();
        let calls = Cell::new(0);

        let first = fetch_through(&cache, &router, "/api/lessons/1", || {
            calls.set(calls.get() + 1);
            ok("lesson one")
        })
        .await
        .unwrap();
        assert_eq!(first.source, Source::Network);

        let second = fetch_through(&cache, &router, "/api/lessons/1", || {
            calls.set(calls.get() + 1);
            ok("changed")
        })
        .await
        .unwrap();
        assert_eq!(second.source, Source::Cache);
        assert_eq!(second.response.body, "lesson one");
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(LESSON_PARTITION).unwrap(), 1);
    }

    #[tokio::test]
    async fn network_first_prefers_fresh_and_falls_back() {
        let (cache, router) = setup();

        let fresh = fetch_through(&cache, &router, "/api/progress", || ok("v1"))
            .await
            .unwrap();
        assert_eq!(fresh.source, Source::Network);

        let newer = fetch_through(&cache, &router, "/api/progress", || ok("v2"))
            .await
            .unwrap();
        assert_eq!(newer.response.body, "v2");

        let fallback = fetch_through(&cache, &router, "/api/progress", offline)
            .await
            .unwrap();
        assert_eq!(fallback.source, Source::Cache);
        assert_eq!(fallback.response.body, "v2");
    }

    #[tokio::test]
    async fn network_first_miss_returns_error() {
        let (cache, router) = setup();
        let result = fetch_through(&cache, &router, "/api/progress", offline).await;
        assert_eq!(result.unwrap_err(), "offline");
        assert_eq!(cache.len(DYNAMIC_PARTITION).unwrap(), 0);
    }

    #[tokio::test]
    async fn network_only_never_touches_cache() {
        let (cache, router) = setup();
        let fetched = fetch_through(&cache, &router, "/auth/session", || ok("token"))
            .await
            .unwrap();
        assert_eq!(fetched.source, Source::Network);
        assert!(cache.stats().iter().all(|s| s.entries == 0));
    }

    #[tokio::test]
    async fn error_responses_are_not_stored() {
        let (cache, router) = setup();
        let fetched = fetch_through(&cache, &router, "/static/missing.png", || async {
            Ok::<_, String>(CachedResponse::new(404, "not found"))
        })
        .await
        .unwrap();
        assert_eq!(fetched.response.status, 404);
        assert_eq!(cache.len(STATIC_PARTITION).unwrap(), 0);
    }

    #[tokio::test]
    async fn cache_write_failure_still_returns_response() {
        let (logs, _guard) = capture_logs();
        let cache = OfflineCache::new();
        cache.add_partition(
            "tiny",
            &PartitionSettings {
                max_entries: 5,
                max_bytes: Some(2),
            },
        );
        let router = Router::from_settings(&[RouteSettings {
            pattern: "/".into(),
            partition: Some("tiny".into()),
            strategy: FetchStrategy::CacheFirst,
        }]);

        let fetched = fetch_through(&cache, &router, "/big", || ok("way too large"))
            .await
            .unwrap();
        assert_eq!(fetched.response.body, "way too large");
        assert!(logs.has_message("cache write failed"));
    }

    #[tokio::test]
    async fn unknown_partition_reads_as_miss() {
        let cache = OfflineCache::new();
        let router = Router::from_settings(&[RouteSettings {
            pattern: "/".into(),
            partition: Some("missing".into()),
            strategy: FetchStrategy::NetworkFirst,
        }]);
        let fetched = fetch_through(&cache, &router, "/x", || ok("x")).await.unwrap();
        assert_eq!(fetched.source, Source::Network);
    }
}
