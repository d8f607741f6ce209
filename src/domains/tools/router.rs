//! Tool Router - builds the rmcp ToolRouter.
//!
//! Used by the rmcp-driven STDIO transport. Each tool knows how to create
//! its own route.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::domains::activities::ActivityQuery;

use super::definitions::FetchActivitiesTool;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(query: Arc<ActivityQuery>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new().with_route(FetchActivitiesTool::create_route(query))
}

#[cfg(test)]
mod tests {
    use super::super::registry::ToolRegistry;
    use super::*;
    use crate::domains::activities::testing::fixture_query;

    struct TestServer {}

    fn test_query() -> Arc<ActivityQuery> {
        Arc::new(fixture_query().0)
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_query());
        let tools = router.list_all();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "fetch_activities");
    }

    #[test]
    fn test_registry_matches_router() {
        let query = test_query();
        let registry = ToolRegistry::new(query.clone());
        let registry_names = registry.tool_names();

        let router: ToolRouter<TestServer> = build_tool_router(query);
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(registry_names.len(), router_names.len());
        for name in registry_names {
            assert!(router_names.contains(&name));
        }
    }
}
