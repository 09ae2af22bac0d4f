//! The three caching disciplines.
//!
//! Every strategy reads and writes only the generation handle it was built
//! with, and attempts the network at most once per call. A failed write
//! after a successful fetch is logged; it never fails the response.

use std::sync::Arc;

use serde::Serialize;
use shellcache_core::{CacheRequest, Error, Generation, ResponseSnapshot};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::fetch::{FetchOptions, Fetcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CacheFirst => "cache-first",
            Self::NetworkFirst => "network-first",
            Self::StaleWhileRevalidate => "stale-while-revalidate",
        };
        f.write_str(name)
    }
}

/// Strategy implementations bound to one generation and one fetcher.
pub struct StrategyEngine {
    generation: Generation,
    fetcher: Arc<dyn Fetcher>,
    refreshes: Mutex<JoinSet<()>>,
}

impl StrategyEngine {
    pub fn new(generation: Generation, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { generation, fetcher, refreshes: Mutex::new(JoinSet::new()) }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    pub async fn execute(&self, strategy: Strategy, request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Serve from cache when present; otherwise fetch and store.
    ///
    /// Cached entries never expire.
    pub async fn cache_first(&self, request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        if let Some(cached) = self.generation.get(request).await? {
            tracing::debug!("cache hit for {request}");
            return Ok(cached);
        }

        tracing::debug!("cache miss for {request}");
        let response = self.fetcher.fetch(request, FetchOptions::default()).await?;
        store(&self.generation, request, &response).await;
        Ok(response)
    }

    /// Fetch past any transport cache; fall back to the stored entry only
    /// when the network fails. Other fetch errors are returned as is.
    pub async fn network_first(&self, request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        match self.fetcher.fetch(request, FetchOptions::bypass_cache()).await {
            Ok(response) => {
                store(&self.generation, request, &response).await;
                Ok(response)
            }
            Err(err) if !err.is_network() => Err(err),
            Err(network_err) => {
                tracing::debug!("network failed for {request}, trying cache: {network_err}");
                match self.generation.get(request).await {
                    Ok(Some(cached)) => Ok(cached),
                    Ok(None) => Err(network_err),
                    Err(store_err) => {
                        tracing::warn!("cache fallback lookup failed for {request}: {store_err}");
                        Err(network_err)
                    }
                }
            }
        }
    }

    /// Return the cached entry immediately and refresh it in the background;
    /// with nothing cached, wait for the network.
    pub async fn stale_while_revalidate(&self, request: &CacheRequest) -> Result<ResponseSnapshot, Error> {
        let Some(cached) = self.generation.get(request).await? else {
            tracing::debug!("cache miss for {request}, fetching");
            let response = self.fetcher.fetch(request, FetchOptions::default()).await?;
            store(&self.generation, request, &response).await;
            return Ok(response);
        };

        tracing::debug!("serving cached {request}, revalidating in background");
        let generation = self.generation.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let request = request.clone();

        let mut refreshes = self.refreshes.lock().await;
        while refreshes.try_join_next().is_some() {}
        refreshes.spawn(async move {
            match fetcher.fetch(&request, FetchOptions::default()).await {
                Ok(fresh) => store(&generation, &request, &fresh).await,
                Err(e) => tracing::debug!("background refresh of {request} failed: {e}"),
            }
        });

        Ok(cached)
    }

    /// Wait for every background refresh started so far.
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.refreshes.lock().await);
        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!("background refresh task failed: {e}");
            }
        }
    }
}

async fn store(generation: &Generation, request: &CacheRequest, response: &ResponseSnapshot) {
    if response.is_partial() {
        tracing::debug!("not caching partial response for {request}");
        return;
    }
    if let Err(e) = generation.put(request, response).await {
        tracing::warn!("failed to cache {request} in {}: {e}", generation.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubFetcher, empty_generation};

    const URL: &str = "https://cdn.jsdelivr.net/npm/chart.js";

    async fn engine(fetcher: &Arc<StubFetcher>) -> StrategyEngine {
        let fetcher: Arc<dyn Fetcher> = fetcher.clone();
        StrategyEngine::new(empty_generation("spot-app-v1.0.0").await, fetcher)
    }

    fn req() -> CacheRequest {
        CacheRequest::get(URL).unwrap()
    }

    #[tokio::test]
    async fn test_cache_first_fetches_once() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(URL, "v1");
        let engine = engine(&fetcher).await;

        let first = engine.cache_first(&req()).await.unwrap();
        fetcher.respond(URL, "v2");
        let second = engine.cache_first(&req()).await.unwrap();

        assert_eq!(first.body, b"v1");
        assert_eq!(second.body, b"v1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_first_propagates_network_failure() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail(URL);
        let engine = engine(&fetcher).await;

        let result = engine.cache_first(&req()).await;

        assert!(matches!(result, Err(Error::Network(_))));
        assert!(engine.generation().get(&req()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_first_does_not_use_bypass() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(URL, "v1");
        let engine = engine(&fetcher).await;

        engine.cache_first(&req()).await.unwrap();

        assert_eq!(fetcher.options(), vec![FetchOptions::default()]);
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_cache() {
        let fetcher = Arc::new(StubFetcher::new());
        let engine = engine(&fetcher).await;
        engine.generation().put(&req(), &ResponseSnapshot::new(200, "cached")).await.unwrap();
        fetcher.fail(URL);

        let response = engine.network_first(&req()).await.unwrap();

        assert_eq!(response.body, b"cached");
    }

    #[tokio::test]
    async fn test_network_first_empty_cache_propagates() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail(URL);
        let engine = engine(&fetcher).await;

        let result = engine.network_first(&req()).await;

        assert!(matches!(result, Err(Error::Network(_))));
    }

    struct RejectingFetcher;

    #[async_trait::async_trait]
    impl Fetcher for RejectingFetcher {
        async fn fetch(&self, request: &CacheRequest, _options: FetchOptions) -> Result<ResponseSnapshot, Error> {
            Err(Error::InvalidInput(format!("cannot send {request}")))
        }
    }

    #[tokio::test]
    async fn test_network_first_only_falls_back_on_network_errors() {
        let engine = StrategyEngine::new(empty_generation("spot-app-v1.0.0").await, Arc::new(RejectingFetcher));
        engine.generation().put(&req(), &ResponseSnapshot::new(200, "cached")).await.unwrap();

        let result = engine.network_first(&req()).await;

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_network_first_overwrites_cache() {
        let fetcher = Arc::new(StubFetcher::new());
        let engine = engine(&fetcher).await;
        engine.generation().put(&req(), &ResponseSnapshot::new(200, "stale")).await.unwrap();
        fetcher.respond(URL, "fresh");

        let response = engine.network_first(&req()).await.unwrap();

        assert_eq!(response.body, b"fresh");
        let stored = engine.generation().get(&req()).await.unwrap().unwrap();
        assert_eq!(stored.body, b"fresh");
        assert_eq!(fetcher.options(), vec![FetchOptions::bypass_cache()]);
    }

    #[tokio::test]
    async fn test_swr_returns_stale_before_refresh_completes() {
        let fetcher = Arc::new(StubFetcher::new());
        let engine = engine(&fetcher).await;
        engine.generation().put(&req(), &ResponseSnapshot::new(200, "old")).await.unwrap();
        fetcher.respond(URL, "new");
        let gate = fetcher.hold();

        let response = engine.stale_while_revalidate(&req()).await.unwrap();
        assert_eq!(response.body, b"old");

        gate.notify_one();
        engine.settle().await;

        let response = engine.stale_while_revalidate(&req()).await.unwrap();
        assert_eq!(response.body, b"new");
    }

    #[tokio::test]
    async fn test_swr_empty_cache_fetches_and_stores() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(URL, "fetched");
        let engine = engine(&fetcher).await;

        let response = engine.stale_while_revalidate(&req()).await.unwrap();

        assert_eq!(response.body, b"fetched");
        let stored = engine.generation().get(&req()).await.unwrap().unwrap();
        assert_eq!(stored.body, b"fetched");
    }

    #[tokio::test]
    async fn test_swr_empty_cache_propagates_failure() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.fail(URL);
        let engine = engine(&fetcher).await;

        assert!(engine.stale_while_revalidate(&req()).await.is_err());
    }

    #[tokio::test]
    async fn test_swr_failed_refresh_keeps_entry() {
        let fetcher = Arc::new(StubFetcher::new());
        let engine = engine(&fetcher).await;
        engine.generation().put(&req(), &ResponseSnapshot::new(200, "old")).await.unwrap();
        fetcher.fail(URL);

        let response = engine.stale_while_revalidate(&req()).await.unwrap();
        engine.settle().await;

        assert_eq!(response.body, b"old");
        let stored = engine.generation().get(&req()).await.unwrap().unwrap();
        assert_eq!(stored.body, b"old");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_response_not_stored() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond_with(URL, ResponseSnapshot::new(206, "part"));
        let engine = engine(&fetcher).await;

        let response = engine.cache_first(&req()).await.unwrap();

        assert_eq!(response.status, 206);
        assert!(engine.generation().get(&req()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_execute_dispatches() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.respond(URL, "v1");
        let engine = engine(&fetcher).await;

        engine.execute(Strategy::NetworkFirst, &req()).await.unwrap();
        engine.execute(Strategy::CacheFirst, &req()).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::StaleWhileRevalidate.to_string(), "stale-while-revalidate");
    }
}
