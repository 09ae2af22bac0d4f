//! Request classification.
//!
//! The router is an ordered predicate table of (host matcher, route class)
//! pairs. The first matching row wins and [`RouteClass::Shell`] is the
//! fallback, so classification is total for GET requests. Non-GET requests
//! are never classified: the engine leaves them to the network.

use std::collections::HashSet;

use serde::Serialize;
use shellcache_core::{AppConfig, CacheRequest};

use crate::strategy::Strategy;

/// Category a request falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Api,
    Cdn,
    Shell,
}

impl RouteClass {
    /// The strategy a request of this class is served with.
    pub fn strategy(self) -> Strategy {
        match self {
            Self::Api => Strategy::NetworkFirst,
            Self::Cdn => Strategy::StaleWhileRevalidate,
            Self::Shell => Strategy::CacheFirst,
        }
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Api => "api",
            Self::Cdn => "cdn",
            Self::Shell => "shell",
        };
        f.write_str(name)
    }
}

/// Host predicate for one row of the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMatcher {
    Exact(String),
    AnyOf(HashSet<String>),
}

impl HostMatcher {
    pub fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == host,
            Self::AnyOf(hosts) => hosts.contains(host),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<(HostMatcher, RouteClass)>,
}

impl Router {
    /// Build the table: API host first, then the CDN host set.
    pub fn new(api_host: &str, cdn_hosts: &[String]) -> Self {
        let cdn = cdn_hosts.iter().map(|h| h.trim().to_ascii_lowercase()).collect();
        Self {
            routes: vec![
                (HostMatcher::Exact(api_host.trim().to_ascii_lowercase()), RouteClass::Api),
                (HostMatcher::AnyOf(cdn), RouteClass::Cdn),
            ],
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.api_host, &config.cdn_hosts)
    }

    /// Classify a request. `None` means pass-through (non-GET).
    pub fn classify(&self, request: &CacheRequest) -> Option<RouteClass> {
        if !request.is_get() {
            return None;
        }
        let host = request.host().unwrap_or_default();
        let class = self
            .routes
            .iter()
            .find(|(matcher, _)| matcher.matches(host))
            .map(|(_, class)| *class)
            .unwrap_or(RouteClass::Shell);
        Some(class)
    }
}
