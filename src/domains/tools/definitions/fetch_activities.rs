//! Fetch activities tool definition.
//!
//! Reads the public activity listing and returns its entries as structured
//! records.

use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Content, Tool},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::domains::activities::{Activity, ActivityQuery};
use crate::domains::tools::ToolError;

/// Smallest accepted `limit`.
pub const MIN_LIMIT: u32 = 1;
/// Largest accepted `limit`.
pub const MAX_LIMIT: u32 = 100;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the fetch activities tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct FetchActivitiesParams {
    /// Maximum number of activities to return, counted from the top of the listing.
    #[serde(default)]
    #[schemars(description = "Maximum number of activities to return (1-100). Omit for all.")]
    #[schemars(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl FetchActivitiesParams {
    /// Check the parameters against the declared schema bounds.
    pub fn validate(&self) -> Result<(), ToolError> {
        match self.limit {
            Some(limit) if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) => {
                Err(ToolError::invalid_arguments(format!(
                    "limit must be an integer between {MIN_LIMIT} and {MAX_LIMIT}, got {limit}"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Rewrite a whole-valued float `limit` such as `3.0` as an integer.
///
/// JSON Schema counts `3.0` as an integer; serde's `u32` does not.
fn integral_limit(mut arguments: serde_json::Value) -> serde_json::Value {
    if let Some(limit) = arguments.get_mut("limit") {
        let whole = limit
            .as_f64()
            .filter(|v| limit.is_f64() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64);
        if let Some(value) = whole {
            *limit = serde_json::Value::from(value as i64);
        }
    }
    arguments
}

// ============================================================================
// Structured Output
// ============================================================================

/// Structured output of the fetch activities tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FetchActivitiesOutput {
    /// Activities in listing order.
    pub activities: Vec<Activity>,
    /// Number of activities returned.
    pub count: usize,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Fetch activities tool - reads the activity listing page.
pub struct FetchActivitiesTool;

impl FetchActivitiesTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fetch_activities";

    /// Human-readable title.
    pub const TITLE: &'static str = "获取成都青年之家最新活动";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Fetch the latest public activities from the Chengdu youth activity listing (https://cdyouth.cdcyl.org.cn/jgc/). Returns activities in page order with title, tags, area, venue, date/time text, status, hit count, detail URL and cover image. Use `limit` (1-100) to keep only the first entries.";

    /// Decode and validate raw call arguments.
    ///
    /// Runs before any network activity, so out-of-range input never
    /// reaches the listing page.
    pub fn parse_arguments(arguments: serde_json::Value) -> Result<FetchActivitiesParams, ToolError> {
        let params: FetchActivitiesParams = match arguments {
            serde_json::Value::Null => FetchActivitiesParams::default(),
            other => serde_json::from_value(integral_limit(other))
                .map_err(|e| ToolError::invalid_arguments(e.to_string()))?,
        };
        params.validate()?;
        Ok(params)
    }

    /// Execute the tool logic.
    #[instrument(skip_all, fields(limit = ?params.limit))]
    pub async fn execute(params: &FetchActivitiesParams, query: &ActivityQuery) -> CallToolResult {
        info!("Fetch activities tool called");

        let activities = match query.get_activities(params.limit.map(|l| l as usize)).await {
            Ok(activities) => activities,
            Err(e) => {
                error!("Fetching activities failed: {}", e);
                return CallToolResult::error(vec![Content::text(format!(
                    "Failed to fetch activities: {e}"
                ))]);
            }
        };

        let output = FetchActivitiesOutput {
            count: activities.len(),
            activities,
        };
        let summary = match output.count {
            1 => "Fetched 1 activity".to_string(),
            n => format!("Fetched {n} activities"),
        };

        match serde_json::to_value(&output) {
            Ok(structured) => CallToolResult {
                content: vec![Content::text(summary)],
                structured_content: Some(structured),
                is_error: Some(false),
                meta: None,
            },
            Err(e) => {
                warn!("Failed to serialize activities: {}", e);
                CallToolResult::error(vec![Content::text(format!(
                    "Failed to serialize activities: {e}"
                ))])
            }
        }
    }

    /// Handler used by the SSE transport's JSON-RPC dispatcher.
    #[cfg(feature = "sse")]
    pub async fn http_handler(
        arguments: serde_json::Value,
        query: Arc<ActivityQuery>,
    ) -> Result<serde_json::Value, ToolError> {
        let params = Self::parse_arguments(arguments)?;
        let result = Self::execute(&params, &query).await;
        serde_json::to_value(&result).map_err(|e| ToolError::internal(e.to_string()))
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<FetchActivitiesParams>(),
            annotations: None,
            output_schema: Some(cached_schema_for_type::<FetchActivitiesOutput>()),
            icons: None,
            meta: None,
            title: Some(Self::TITLE.into()),
        }
    }

    /// Create a ToolRoute for the rmcp-driven transports.
    pub fn create_route<S>(query: Arc<ActivityQuery>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let query = query.clone();
            async move {
                let params = Self::parse_arguments(serde_json::Value::Object(args))
                    .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
                Ok(Self::execute(&params, &query).await)
            }
            .boxed()
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::activities::testing::{FailingPage, fixture_query};
    use crate::domains::activities::Extractor;
    use serde_json::json;

    #[test]
    fn test_parse_arguments_accepts_missing_limit() {
        assert_eq!(FetchActivitiesTool::parse_arguments(json!({})).unwrap().limit, None);
        assert_eq!(FetchActivitiesTool::parse_arguments(serde_json::Value::Null).unwrap().limit, None);
        assert_eq!(
            FetchActivitiesTool::parse_arguments(json!({ "limit": 3 })).unwrap().limit,
            Some(3)
        );
        assert_eq!(
            FetchActivitiesTool::parse_arguments(json!({ "limit": 100 })).unwrap().limit,
            Some(100)
        );
    }

    #[test]
    fn test_parse_arguments_rejects_out_of_range() {
        for bad in [json!({ "limit": 0 }), json!({ "limit": 101 }), json!({ "limit": -1 })] {
            let err = FetchActivitiesTool::parse_arguments(bad.clone()).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{bad}");
        }
    }

    #[test]
    fn test_parse_arguments_accepts_whole_floats() {
        assert_eq!(
            FetchActivitiesTool::parse_arguments(json!({ "limit": 3.0 })).unwrap().limit,
            Some(3)
        );
        assert_eq!(
            FetchActivitiesTool::parse_arguments(json!({ "limit": 100.0 })).unwrap().limit,
            Some(100)
        );
        for bad in [json!({ "limit": 0.0 }), json!({ "limit": 101.0 }), json!({ "limit": -2.0 })] {
            let err = FetchActivitiesTool::parse_arguments(bad.clone()).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{bad}");
        }
    }

    #[test]
    fn test_parse_arguments_rejects_non_integers() {
        for bad in [json!({ "limit": 2.5 }), json!({ "limit": "3" }), json!({ "limit": true })] {
            let err = FetchActivitiesTool::parse_arguments(bad.clone()).unwrap_err();
            assert!(matches!(err, ToolError::InvalidArguments(_)), "{bad}");
        }
    }

    #[test]
    fn test_to_tool_schemas() {
        let tool = FetchActivitiesTool::to_tool();
        assert_eq!(tool.name, "fetch_activities");
        let input = serde_json::Value::Object((*tool.input_schema).clone());
        assert!(input["properties"]["limit"].is_object());
        assert!(input["required"].as_array().is_none_or(|r| r.is_empty()));
        assert!(tool.output_schema.is_some());
    }

    #[tokio::test]
    async fn test_execute_returns_structured_activities() {
        let (query, _) = fixture_query();
        let params = FetchActivitiesParams { limit: Some(3) };

        let result = FetchActivitiesTool::execute(&params, &query).await;
        assert_eq!(result.is_error, Some(false));

        let output: FetchActivitiesOutput =
            serde_json::from_value(result.structured_content.unwrap()).unwrap();
        assert_eq!(output.count, 3);
        assert_eq!(output.activities[0].title, "周末 读书会");
        assert_eq!(output.activities[2].title, "亲子 手工课");
    }

    #[tokio::test]
    async fn test_execute_reports_fetch_failure_as_tool_error() {
        let extractor = Extractor::with_base("https://cdyouth.cdcyl.org.cn").unwrap();
        let query = ActivityQuery::new(Arc::new(FailingPage::status(500)), extractor);

        let result = FetchActivitiesTool::execute(&FetchActivitiesParams::default(), &query).await;
        assert_eq!(result.is_error, Some(true));
        let text = match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        };
        assert!(text.contains("HTTP 500"));
    }

    #[cfg(feature = "sse")]
    #[tokio::test]
    async fn test_http_handler_rejects_before_fetching() {
        let (query, page) = fixture_query();
        let result = FetchActivitiesTool::http_handler(json!({ "limit": 0 }), Arc::new(query)).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
        assert_eq!(page.calls(), 0);
    }

    #[cfg(feature = "sse")]
    #[tokio::test]
    async fn test_http_handler_serializes_call_result() {
        let (query, _) = fixture_query();
        let value = FetchActivitiesTool::http_handler(json!({}), Arc::new(query))
            .await
            .unwrap();
        assert_eq!(value["isError"], false);
        assert_eq!(value["structuredContent"]["count"], 10);
        assert_eq!(
            value["structuredContent"]["activities"][0]["dateTimeText"],
            "2025-06-01 09:00 - 11:00"
        );
    }
}
