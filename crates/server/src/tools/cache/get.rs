//! cache_get tool implementation.
//!
//! Reads an entry from the active generation without touching the network.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ShellService;
use shellcache_core::{CacheRequest, Error};

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// URL of the cached GET request.
    pub url: String,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub url: String,
    /// Generation the entry was read from.
    pub generation: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Stored body, decoded lossily as UTF-8.
    pub body: String,
}

/// Implementation of the cache_get tool.
pub async fn get_impl(service: &ShellService, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let request = CacheRequest::get(&params.url)?;
    let generation = service.active_generation().await.ok_or(Error::NotActive)?;

    let response = service
        .lookup(&request)
        .await?
        .ok_or_else(|| Error::CacheMiss(request.url().to_string()))?;

    let output = CacheGetOutput {
        url: request.url().to_string(),
        generation,
        status: response.status,
        body: String::from_utf8_lossy(&response.body).to_string(),
        headers: response.headers,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize entry: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
