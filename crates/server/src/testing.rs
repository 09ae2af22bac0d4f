//! Fixtures for tool tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rmcp::model::CallToolResult;
use serde::de::DeserializeOwned;
use shellcache_client::{FetchOptions, Fetcher, LogSignals, ShellService};
use shellcache_core::{AppConfig, CacheDb, CacheRequest, Error, ResponseSnapshot};

/// Fetcher answering from a URL → body map, regardless of method.
#[derive(Default)]
pub(crate) struct MapFetcher {
    bodies: Mutex<HashMap<String, String>>,
}

impl MapFetcher {
    pub(crate) fn respond(&self, url: &str, body: &str) {
        let url = CacheRequest::get(url).unwrap().url().to_string();
        self.bodies.lock().unwrap().insert(url, body.to_string());
    }
}

#[async_trait::async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(&self, request: &CacheRequest, _options: FetchOptions) -> Result<ResponseSnapshot, Error> {
        let body = self.bodies.lock().unwrap().get(request.url().as_str()).cloned();
        body.map(|b| ResponseSnapshot::new(200, b).with_header("content-type", "text/html"))
            .ok_or_else(|| Error::Network(format!("{}: connection refused", request.url())))
    }
}

pub(crate) fn service(fetcher: &Arc<MapFetcher>, db: CacheDb) -> ShellService {
    let config = AppConfig { shell_manifest: vec!["./".into(), "./index.html".into()], ..Default::default() };
    let fetcher: Arc<dyn Fetcher> = fetcher.clone();
    ShellService::from_config(&config, Arc::new(db), fetcher, Arc::new(LogSignals)).unwrap()
}

/// A service whose shell has been installed and activated.
pub(crate) async fn active_service() -> (ShellService, Arc<MapFetcher>) {
    let fetcher = Arc::new(MapFetcher::default());
    fetcher.respond("http://localhost:8080/", "root");
    fetcher.respond("http://localhost:8080/index.html", "<html>shell</html>");
    let service = service(&fetcher, CacheDb::open_in_memory().await.unwrap());
    service.install().await.unwrap();
    service.activate().await.unwrap();
    (service, fetcher)
}

/// Parse the JSON text content of a tool result.
pub(crate) fn output_json<T: DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}
