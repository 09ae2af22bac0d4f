//! SQLite-backed, generation-scoped response cache.
//!
//! This module provides a persistent (or in-memory) cache using SQLite
//! with async access via tokio-rusqlite. It supports:
//!
//! - Named generations, each an isolated set of entries
//! - Content-addressed entries keyed by SHA-256 of method + URL
//! - Atomic multi-entry writes for manifest seeding
//! - Cascade deletion of a generation with all its entries
//! - Automatic schema migrations and WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod generations;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::{CacheEntry, ResponseSnapshot};
pub use store::{CacheStore, Generation};
