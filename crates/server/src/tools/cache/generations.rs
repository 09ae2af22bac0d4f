//! cache_generations tool implementation.
//!
//! Lists the generations present in the store.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ShellService;
use shellcache_core::Error;

/// Output from the cache_generations tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGenerationsOutput {
    /// Generation this build installs.
    pub current: String,
    /// Generation requests are currently served from, if activated.
    pub active: Option<String>,
    /// Every generation in the store, oldest first.
    pub generations: Vec<String>,
}

/// Implementation of the cache_generations tool.
pub async fn generations_impl(service: &ShellService) -> Result<CallToolResult, McpError> {
    let output = CacheGenerationsOutput {
        current: service.current_generation().to_string(),
        active: service.active_generation().await,
        generations: service.generations().await?,
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
