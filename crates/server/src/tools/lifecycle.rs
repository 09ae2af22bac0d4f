//! shell_install and shell_activate tool implementations.
//!
//! Lets the host retry a failed install or re-run activation on demand.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::ShellService;
use shellcache_core::Error;

/// Output from the shell_install tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellInstallOutput {
    /// Generation that was installed.
    pub generation: String,
}

/// Implementation of the shell_install tool.
pub async fn install_impl(service: &ShellService) -> Result<CallToolResult, McpError> {
    let generation = service.install().await?;
    let json = serde_json::to_string_pretty(&ShellInstallOutput { generation })
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Implementation of the shell_activate tool.
pub async fn activate_impl(service: &ShellService) -> Result<CallToolResult, McpError> {
    let report = service.activate().await?;
    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| Error::InvalidInput(format!("Failed to serialize report: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
