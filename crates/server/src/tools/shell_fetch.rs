//! shell_fetch tool implementation.
//!
//! Delivers one request to the engine, acting as the host: when the engine
//! declines (non-GET, or nothing active yet) the request goes straight to
//! the network.

use rmcp::{ErrorData as McpError, model::*};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{FetchOptions, Outcome, ShellService};
use shellcache_core::{CacheRequest, Error};

/// Input parameters for shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchParams {
    /// The URL to request.
    pub url: String,

    /// HTTP method (default: GET). Only GET is ever cached.
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchOutput {
    /// Canonical URL that was requested.
    pub url: String,
    /// Whether the engine answered (false = passed through to the network).
    pub handled: bool,
    /// Route class: "api", "cdn" or "shell".
    pub route: Option<String>,
    /// Strategy applied, e.g. "cache-first".
    pub strategy: Option<String>,
    /// HTTP status of the response.
    pub status: u16,
    /// Content-Type header.
    pub content_type: Option<String>,
    /// Response body, decoded lossily as UTF-8.
    pub body: String,
    /// Body length in bytes.
    pub body_bytes: usize,
}

/// Implementation of the shell_fetch tool.
pub async fn fetch_impl(service: &ShellService, params: ShellFetchParams) -> Result<CallToolResult, McpError> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()).into());
    }

    let request = CacheRequest::new(&params.method, &params.url)?;

    let (route, strategy, response) = match service.handle(&request).await? {
        Outcome::Respond { route, strategy, response } => (Some(route.to_string()), Some(strategy.to_string()), response),
        Outcome::PassThrough => {
            let response = service.fetcher().fetch(&request, FetchOptions::default()).await?;
            (None, None, response)
        }
    };

    let output = ShellFetchOutput {
        url: request.url().to_string(),
        handled: route.is_some(),
        route,
        strategy,
        status: response.status,
        content_type: response.content_type().map(str::to_string),
        body: String::from_utf8_lossy(&response.body).to_string(),
        body_bytes: response.body.len(),
    };

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{active_service, output_json};

    #[tokio::test]
    async fn test_fetch_empty_url() {
        let (service, _fetcher) = active_service().await;
        let params = ShellFetchParams { url: " ".into(), method: "GET".into() };
        assert!(fetch_impl(&service, params).await.is_err());
    }

    #[tokio::test]
    async fn test_fetch_shell_from_cache() {
        let (service, _fetcher) = active_service().await;
        let params = ShellFetchParams { url: "http://localhost:8080/index.html".into(), method: "GET".into() };

        let result = fetch_impl(&service, params).await.unwrap();
        let output: ShellFetchOutput = output_json(&result);

        assert!(output.handled);
        assert_eq!(output.route.as_deref(), Some("shell"));
        assert_eq!(output.strategy.as_deref(), Some("cache-first"));
        assert_eq!(output.body, "<html>shell</html>");
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let (service, fetcher) = active_service().await;
        fetcher.respond("https://api.awattar.at/v1/orders", "accepted");
        let params = ShellFetchParams { url: "https://api.awattar.at/v1/orders".into(), method: "post".into() };

        let result = fetch_impl(&service, params).await.unwrap();
        let output: ShellFetchOutput = output_json(&result);

        assert!(!output.handled);
        assert!(output.route.is_none());
        assert_eq!(output.body, "accepted");
    }
}
