//! Test doubles shared by the client crate's unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use shellcache_core::{CacheDb, CacheEntry, CacheRequest, CacheStore, Error, Generation, ResponseSnapshot};
use tokio::sync::Notify;

use crate::fetch::{FetchOptions, Fetcher};

/// Scripted [`Fetcher`]: answers by URL, counts calls, and can be held
/// behind a gate to control when a response arrives.
#[derive(Default)]
pub(crate) struct StubFetcher {
    responses: Mutex<HashMap<String, Result<ResponseSnapshot, String>>>,
    options: Mutex<Vec<FetchOptions>>,
    calls: AtomicUsize,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        CacheRequest::get(url).unwrap().url().to_string()
    }

    pub(crate) fn respond(&self, url: &str, body: &str) {
        self.respond_with(url, ResponseSnapshot::new(200, body));
    }

    pub(crate) fn respond_with(&self, url: &str, response: ResponseSnapshot) {
        self.responses.lock().unwrap().insert(Self::key(url), Ok(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(Self::key(url), Err(format!("{url}: connection refused")));
    }

    /// Make every subsequent fetch wait for one `notify_one` on the gate.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn options(&self) -> Vec<FetchOptions> {
        self.options.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &CacheRequest, options: FetchOptions) -> Result<ResponseSnapshot, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.options.lock().unwrap().push(options);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let scripted = self.responses.lock().unwrap().get(request.url().as_str()).cloned();
        match scripted {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(Error::Network(reason)),
            None => Err(Error::Network(format!("{}: no route", request.url()))),
        }
    }
}

pub(crate) async fn empty_generation(name: &str) -> Generation {
    let db = CacheDb::open_in_memory().await.unwrap();
    Generation::open(Arc::new(db), name).await.unwrap()
}

/// [`CacheStore`] wrapper whose deletion of one generation always fails.
pub(crate) struct FlakyStore {
    inner: CacheDb,
    undeletable: String,
}

impl FlakyStore {
    pub(crate) fn new(inner: CacheDb, undeletable: &str) -> Self {
        Self { inner, undeletable: undeletable.to_string() }
    }
}

#[async_trait::async_trait]
impl CacheStore for FlakyStore {
    async fn open_generation(&self, name: &str) -> Result<(), Error> {
        self.inner.open_generation(name).await
    }

    async fn get_entry(&self, generation: &str, key_hash: &str) -> Result<Option<ResponseSnapshot>, Error> {
        self.inner.get_entry(generation, key_hash).await
    }

    async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        self.inner.put_entry(generation, entry).await
    }

    async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        self.inner.put_entries(generation, entries).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.inner.list_generations().await
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        if name == self.undeletable {
            return Err(Error::InvalidInput(format!("{name} is locked by another reader")));
        }
        self.inner.delete_generation(name).await
    }
}
