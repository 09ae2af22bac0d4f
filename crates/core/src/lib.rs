//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Generation-scoped response cache with SQLite backend
//! - Request identity and response snapshot types
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod request;

pub use cache::{CacheDb, CacheEntry, CacheStore, Generation, ResponseSnapshot};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::CacheRequest;
