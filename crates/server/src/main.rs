//! shellcache server entry point.
//!
//! Boots the caching engine, installs and activates the shell, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{FetchConfig, Fetcher, HttpFetcher, LogSignals, ShellService};
use shellcache_core::{AppConfig, CacheDb, CacheStore};
use tracing_subscriber::EnvFilter;

mod handler;
#[cfg(test)]
mod testing;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        generation = %config.generation_name(),
        db_path = %config.db_path.display(),
        "Starting shellcache server on stdio transport"
    );

    let store: Arc<dyn CacheStore> = if config.is_in_memory() {
        Arc::new(CacheDb::open_in_memory().await?)
    } else {
        Arc::new(CacheDb::open(&config.db_path).await?)
    };
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(FetchConfig::from(&config))?);
    let service = Arc::new(ShellService::from_config(&config, store, fetcher, Arc::new(LogSignals))?);

    match service.install().await {
        Ok(_) => match service.activate().await {
            Ok(report) => tracing::info!(
                generation = %report.current,
                deleted = report.deleted.len(),
                failed = report.failed.len(),
                "Shell activated"
            ),
            Err(e) => tracing::error!(error = %e, "Activation failed"),
        },
        Err(e) => tracing::error!(error = %e, "Install failed; requests pass through until shell_install succeeds"),
    }

    let handler = handler::ShellCacheServer::new(Arc::clone(&service));
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;
    service.settle().await;

    Ok(())
}
