//! Per-request entry point tying router, strategies and lifecycle together.
//!
//! The service holds two slots: the generation produced by the last
//! successful install, and the strategy engine serving requests. Activation
//! promotes the former into the latter. Until then every request passes
//! through to the network.

use std::sync::Arc;

use shellcache_core::{AppConfig, CacheRequest, CacheStore, Error, Generation, ResponseSnapshot};
use tokio::sync::RwLock;

use crate::fetch::Fetcher;
use crate::lifecycle::{ActivationReport, Lifecycle, ShellConfig};
use crate::router::{RouteClass, Router};
use crate::signals::HostSignals;
use crate::strategy::{Strategy, StrategyEngine};

/// What the host should do with an intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Respond with this response.
    Respond { route: RouteClass, strategy: Strategy, response: ResponseSnapshot },
    /// The engine declined; the host sends the request to the network itself.
    PassThrough,
}

pub struct ShellService {
    lifecycle: Lifecycle,
    fetcher: Arc<dyn Fetcher>,
    router: Router,
    installed: RwLock<Option<Generation>>,
    active: RwLock<Option<Arc<StrategyEngine>>>,
}

impl ShellService {
    pub fn new(lifecycle: Lifecycle, fetcher: Arc<dyn Fetcher>, router: Router) -> Self {
        Self { lifecycle, fetcher, router, installed: RwLock::new(None), active: RwLock::new(None) }
    }

    /// Wire a service from loaded configuration.
    pub fn from_config(
        config: &AppConfig, store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, signals: Arc<dyn HostSignals>,
    ) -> Result<Self, Error> {
        let shell = ShellConfig::from_config(config)?;
        let lifecycle = Lifecycle::new(store, Arc::clone(&fetcher), shell, signals);
        Ok(Self::new(lifecycle, fetcher, Router::from_config(config)))
    }

    pub fn fetcher(&self) -> &Arc<dyn Fetcher> {
        &self.fetcher
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Name of the generation this build installs.
    pub fn current_generation(&self) -> &str {
        self.lifecycle.generation_name()
    }

    /// Install the current generation. Safe to retry after a failure.
    pub async fn install(&self) -> Result<String, Error> {
        let generation = self.lifecycle.install().await?;
        let name = generation.name().to_string();
        *self.installed.write().await = Some(generation);
        Ok(name)
    }

    /// Activate the installed generation and start serving from it.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotInstalled` if no install has succeeded yet.
    pub async fn activate(&self) -> Result<ActivationReport, Error> {
        let generation = self.installed.read().await.clone().ok_or(Error::NotInstalled)?;

        let report = self.lifecycle.activate().await;

        let engine = Arc::new(StrategyEngine::new(generation, Arc::clone(&self.fetcher)));
        let previous = self.active.write().await.replace(engine);
        if let Some(previous) = previous {
            previous.settle().await;
        }

        Ok(report)
    }

    /// Name of the generation requests are served from, if any.
    pub async fn active_generation(&self) -> Option<String> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|engine| engine.generation().name().to_string())
    }

    /// All generation names present in the store.
    pub async fn generations(&self) -> Result<Vec<String>, Error> {
        self.lifecycle.store().list_generations().await
    }

    /// Handle one intercepted request.
    pub async fn handle(&self, request: &CacheRequest) -> Result<Outcome, Error> {
        let Some(route) = self.router.classify(request) else {
            tracing::debug!("passing through {request}");
            return Ok(Outcome::PassThrough);
        };

        let engine = self.active.read().await.clone();
        let Some(engine) = engine else {
            tracing::debug!("no active generation, passing through {request}");
            return Ok(Outcome::PassThrough);
        };

        let strategy = route.strategy();
        let response = engine.execute(strategy, request).await?;
        Ok(Outcome::Respond { route, strategy, response })
    }

    /// Read the active generation's entry for `request` without touching the network.
    pub async fn lookup(&self, request: &CacheRequest) -> Result<Option<ResponseSnapshot>, Error> {
        let engine = self.active.read().await.clone().ok_or(Error::NotActive)?;
        engine.generation().get(request).await
    }

    /// Wait for outstanding background refreshes.
    pub async fn settle(&self) {
        let engine = self.active.read().await.clone();
        if let Some(engine) = engine {
            engine.settle().await;
        }
    }
}
