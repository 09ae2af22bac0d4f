//! Request-interception engine for shellcache.
//!
//! This crate provides the upstream fetcher, the route table, the three
//! caching strategies and the install/activate lifecycle, shared by the
//! server binary.

pub mod fetch;
pub mod lifecycle;
pub mod router;
pub mod service;
pub mod signals;
pub mod strategy;

#[cfg(test)]
pub(crate) mod testing;

pub use fetch::{FetchConfig, FetchOptions, Fetcher, HttpFetcher};
pub use lifecycle::{ActivationReport, FailedDeletion, Lifecycle, ShellConfig};
pub use router::{HostMatcher, RouteClass, Router};
pub use service::{Outcome, ShellService};
pub use signals::{HostSignal, HostSignals, LogSignals};
pub use strategy::{Strategy, StrategyEngine};
