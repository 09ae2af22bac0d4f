//! Cache-related MCP tools.
//!
//! This module provides read-only tools for inspecting the generation store.

pub mod generations;
pub mod get;
