//! Generation lifecycle: install and activate.
//!
//! ### Install
//! - Fetch every shell manifest path, each exactly once.
//! - Any transport failure, non-2xx or partial (206) status fails the whole
//!   install with `Error::ManifestFetch` naming the path.
//! - Only when every fetch succeeded is the current generation opened and
//!   seeded, in one store transaction.
//! - Emits [`HostSignal::SkipWaiting`].
//!
//! ### Activate
//! - Delete every generation except the current one. Each deletion is
//!   independent; failures are logged and reported, never fatal.
//! - Emits [`HostSignal::ClaimClients`].

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use shellcache_core::request::resolve;
use shellcache_core::{AppConfig, CacheEntry, CacheRequest, CacheStore, Error, Generation};
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{FetchOptions, Fetcher};
use crate::signals::{HostSignal, HostSignals};

/// Static description of the shell: generation name, origin and manifest.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub generation_name: String,
    pub origin: Url,
    pub manifest: Vec<String>,
}

impl ShellConfig {
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = shellcache_core::request::canonicalize(&config.origin)
            .map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        Ok(Self { generation_name: config.generation_name(), origin, manifest: config.shell_manifest.clone() })
    }

    /// Manifest paths paired with the requests they are stored under.
    pub fn requests(&self) -> Result<Vec<(String, CacheRequest)>, Error> {
        self.manifest
            .iter()
            .map(|path| {
                let url = resolve(&self.origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
                Ok((path.clone(), CacheRequest::from_url(url)))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub name: String,
    pub reason: String,
}

/// Outcome of [`Lifecycle::activate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub current: String,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

pub struct Lifecycle {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    shell: ShellConfig,
    signals: Arc<dyn HostSignals>,
}

impl Lifecycle {
    pub fn new(
        store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, shell: ShellConfig, signals: Arc<dyn HostSignals>,
    ) -> Self {
        Self { store, fetcher, shell, signals }
    }

    pub fn generation_name(&self) -> &str {
        &self.shell.generation_name
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Create and seed the current generation.
    ///
    /// # Errors
    ///
    /// Returns `Error::ManifestFetch` naming the first manifest path that
    /// failed; nothing is written in that case.
    pub async fn install(&self) -> Result<Generation, Error> {
        let requests = self.shell.requests()?;
        let total = requests.len();

        let mut fetches = JoinSet::new();
        let mut paths = HashMap::with_capacity(total);
        for (index, (path, request)) in requests.into_iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let task_path = path.clone();
            let handle = fetches.spawn(async move {
                let result = fetcher.fetch(&request, FetchOptions::default()).await;
                (index, task_path, request, result)
            });
            paths.insert(handle.id(), path);
        }

        let mut entries: Vec<Option<CacheEntry>> = vec![None; total];
        while let Some(joined) = fetches.join_next().await {
            let (index, path, request, result) = joined.map_err(|e| Error::ManifestFetch {
                path: paths.remove(&e.id()).unwrap_or_default(),
                source: Box::new(Error::Network(format!("fetch task failed: {e}"))),
            })?;

            let response = result.map_err(|e| Error::ManifestFetch { path: path.clone(), source: Box::new(e) })?;
            if !response.is_success() || response.is_partial() {
                return Err(Error::ManifestFetch {
                    path,
                    source: Box::new(Error::Network(format!("HTTP status {}", response.status))),
                });
            }
            entries[index] = Some(CacheEntry::new(&request, response)?);
        }
        let entries: Vec<CacheEntry> = entries.into_iter().flatten().collect();

        let name = &self.shell.generation_name;
        self.store.put_entries(name, &entries).await?;
        tracing::info!(generation = %name, entries = entries.len(), "installed shell generation");

        self.signals.signal(HostSignal::SkipWaiting);
        Ok(Generation::attach(Arc::clone(&self.store), name.clone()))
    }

    /// Retire every generation except the current one and claim clients.
    pub async fn activate(&self) -> ActivationReport {
        let current = self.shell.generation_name.clone();
        let mut report = ActivationReport { current: current.clone(), deleted: Vec::new(), failed: Vec::new() };

        match self.store.list_generations().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| *n != current) {
                    match self.store.delete_generation(&name).await {
                        Ok(_) => {
                            tracing::info!(generation = %name, "deleted stale generation");
                            report.deleted.push(name);
                        }
                        Err(e) => {
                            let err = Error::GenerationDelete { name: name.clone(), reason: e.to_string() };
                            tracing::warn!("{err}");
                            report.failed.push(FailedDeletion { name, reason: e.to_string() });
                        }
                    }
                }
            }
            Err(e) => tracing::warn!("could not list cache generations, skipping cleanup: {e}"),
        }

        self.signals.signal(HostSignal::ClaimClients);
        tracing::info!(generation = %current, deleted = report.deleted.len(), "activated");
        report
    }
}
