//! Store abstraction and the current-generation handle.
//!
//! The engine never talks to [`CacheDb`] directly: it holds a
//! [`Generation`], which pairs a shared [`CacheStore`] with the one
//! generation name it is allowed to read and write.

use std::sync::Arc;

use super::connection::CacheDb;
use super::entries::{CacheEntry, ResponseSnapshot};
use crate::{CacheRequest, Error};

/// Generation-scoped key-value store of request identity → response.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Create the named generation if it doesn't exist.
    async fn open_generation(&self, name: &str) -> Result<(), Error>;

    async fn get_entry(&self, generation: &str, key_hash: &str) -> Result<Option<ResponseSnapshot>, Error>;

    async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error>;

    /// Open the generation and store every entry atomically.
    async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error>;

    async fn list_generations(&self) -> Result<Vec<String>, Error>;

    /// Delete a generation with all its entries.
    async fn delete_generation(&self, name: &str) -> Result<bool, Error>;
}

#[async_trait::async_trait]
impl CacheStore for CacheDb {
    async fn open_generation(&self, name: &str) -> Result<(), Error> {
        CacheDb::open_generation(self, name).await
    }

    async fn get_entry(&self, generation: &str, key_hash: &str) -> Result<Option<ResponseSnapshot>, Error> {
        CacheDb::get_entry(self, generation, key_hash).await
    }

    async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        CacheDb::put_entry(self, generation, entry).await
    }

    async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        CacheDb::put_entries(self, generation, entries).await
    }

    async fn list_generations(&self) -> Result<Vec<String>, Error> {
        CacheDb::list_generations(self).await
    }

    async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        CacheDb::delete_generation(self, name).await
    }
}

/// Handle to one opened cache generation.
#[derive(Clone)]
pub struct Generation {
    name: String,
    store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generation").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Generation {
    /// Open (creating if needed) the named generation.
    pub async fn open(store: Arc<dyn CacheStore>, name: impl Into<String>) -> Result<Self, Error> {
        let name = name.into();
        store.open_generation(&name).await?;
        Ok(Self { name, store })
    }

    /// Wrap a generation that is already known to exist.
    pub fn attach(store: Arc<dyn CacheStore>, name: impl Into<String>) -> Self {
        Self { name: name.into(), store }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Look up the stored response for `request`. Non-GET never matches.
    pub async fn get(&self, request: &CacheRequest) -> Result<Option<ResponseSnapshot>, Error> {
        if !request.is_get() {
            return Ok(None);
        }
        self.store.get_entry(&self.name, &request.identity()).await
    }

    /// Store `response` under `request`'s identity, replacing any previous entry.
    pub async fn put(&self, request: &CacheRequest, response: &ResponseSnapshot) -> Result<(), Error> {
        let entry = CacheEntry::new(request, response.clone())?;
        self.store.put_entry(&self.name, &entry).await
    }
}
