//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the activities and tools domains.
//!
//! ## Tool Architecture
//!
//! Tools are defined in `domains/tools/definitions/` with one file per tool.
//! Each tool defines:
//! - Parameters struct (for rmcp)
//! - `execute()` method (core logic)
//! - `http_handler()` method (called via ToolRegistry for the SSE transport)
//!
//! The ToolRouter is built in `domains/tools/router.rs`.

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use std::sync::Arc;

use super::config::Config;
use crate::domains::{activities::ActivityQuery, tools::build_tool_router};

#[cfg(feature = "sse")]
use crate::domains::tools::{ToolError, ToolRegistry};

/// Instructions advertised to clients on initialization.
pub const INSTRUCTIONS: &str = "Provides the `fetch_activities` tool, which reads the public \
     Chengdu youth activity listing and returns its entries as structured records.";

/// The main MCP server handler.
///
/// Cheap to clone; every clone shares the same configuration and query.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Activity query shared by all tool calls.
    query: Arc<ActivityQuery>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server fetching from the configured source.
    pub fn new(config: Config) -> super::error::Result<Self> {
        let query = ActivityQuery::from_config(&config.source)?;
        Ok(Self::with_query(config, query))
    }

    /// Create a server over an explicit activity query.
    pub fn with_query(config: Config, query: ActivityQuery) -> Self {
        let query = Arc::new(query);
        Self {
            tool_router: build_tool_router::<Self>(query.clone()),
            config: Arc::new(config),
            query,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Get the activity query shared by every transport.
    pub fn query(&self) -> &Arc<ActivityQuery> {
        &self.query
    }

    // ========================================================================
    // SSE Transport Support Methods
    // ========================================================================

    /// List all available tools (for the SSE transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "title": t.title,
                    "description": t.description,
                    "inputSchema": t.input_schema,
                    "outputSchema": t.output_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for the SSE transport).
    #[cfg(feature = "sse")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        let registry = ToolRegistry::new(self.query().clone());
        registry.call_tool(name, arguments).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}
