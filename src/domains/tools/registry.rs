//! Tool Registry - central registration and dispatch for all tools.
//!
//! This module provides:
//! - A registry of all available tools
//! - Name-based dispatch for the SSE transport's JSON-RPC handler
//! - Tool metadata for listing

use std::sync::Arc;
#[cfg(feature = "sse")]
use tracing::warn;

use rmcp::model::Tool;

use crate::domains::activities::ActivityQuery;
#[cfg(feature = "sse")]
use crate::domains::tools::ToolError;

use super::definitions::FetchActivitiesTool;

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    query: Arc<ActivityQuery>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(query: Arc<ActivityQuery>) -> Self {
        Self { query }
    }

    /// The query tools run against.
    pub fn query(&self) -> &Arc<ActivityQuery> {
        &self.query
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![FetchActivitiesTool::NAME]
    }

    /// Get all tools as Tool models (metadata).
    pub fn get_all_tools() -> Vec<Tool> {
        vec![FetchActivitiesTool::to_tool()]
    }

    /// Dispatch a tool call by name.
    ///
    /// Argument validation errors come back as `Err`; failures of the tool's
    /// own work come back as a call result with `isError` set.
    #[cfg(feature = "sse")]
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, ToolError> {
        match name {
            FetchActivitiesTool::NAME => {
                FetchActivitiesTool::http_handler(arguments, self.query().clone()).await
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::activities::testing::fixture_query;

    #[test]
    fn test_registry_tool_names() {
        let registry = ToolRegistry::new(Arc::new(fixture_query().0));
        assert_eq!(registry.tool_names(), vec!["fetch_activities"]);
        assert_eq!(ToolRegistry::get_all_tools().len(), 1);
    }

    #[cfg(feature = "sse")]
    #[tokio::test]
    async fn test_registry_call_fetch_activities() {
        let registry = ToolRegistry::new(Arc::new(fixture_query().0));
        let result = registry
            .call_tool("fetch_activities", serde_json::json!({ "limit": 2 }))
            .await
            .unwrap();
        assert_eq!(result["structuredContent"]["count"], 2);
    }

    #[cfg(feature = "sse")]
    #[tokio::test]
    async fn test_registry_call_unknown() {
        let (query, page) = fixture_query();
        let registry = ToolRegistry::new(Arc::new(query));
        let result = registry.call_tool("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
        assert_eq!(page.calls(), 0);
    }
}
