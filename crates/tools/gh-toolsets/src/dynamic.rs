//! The `dynamic` toolset: runtime toolset discovery and enablement.
//!
//! These tools operate on the registry itself, reached through the
//! [`RegistryHandle`] the dispatcher attaches to every request context.
//! They never talk to GitHub.

use crate::util::tool;
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::search;
use gh_tools_core::{
    Registry, RegistryHandle, ServerTool, ToolError, ToolHandler, ToolRequest, ToolResult, Toolset,
};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize, JsonSchema)]
struct ListAvailableToolsetsArgs {}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetToolsetToolsArgs {
    /// Toolset identifier
    toolset: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct EnableToolsetArgs {
    /// Toolset identifier to enable
    toolset: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchToolsArgs {
    /// Free-text query over tool names, descriptions and parameters
    query: String,
    /// Maximum results to return (default 3)
    max_results: Option<usize>,
}

pub fn tools(toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<ListAvailableToolsetsArgs>(
            "list_available_toolsets",
            "List every toolset this server defines and whether it is enabled.",
            ToolAnnotations::read_only(),
            toolset,
            registry_handler(list_available_toolsets),
        ),
        tool::<GetToolsetToolsArgs>(
            "get_toolset_tools",
            "List the tools one toolset contains.",
            ToolAnnotations::read_only(),
            toolset,
            registry_handler(get_toolset_tools),
        ),
        tool::<EnableToolsetArgs>(
            "enable_toolset",
            "Enable a toolset for the rest of this session.",
            ToolAnnotations::write(),
            toolset,
            registry_handler(enable_toolset),
        ),
        tool::<SearchToolsArgs>(
            "search_tools",
            "Fuzzy-search the tool catalog by name, description and parameters.",
            ToolAnnotations::read_only(),
            toolset,
            registry_handler(search_tools),
        ),
    ]
}

/// Wrap a handler that needs the live registry from the request context.
fn registry_handler<F>(run: F) -> ToolHandler
where
    F: Fn(Registry, ToolRequest) -> Result<ToolResult, ToolError> + Send + Sync + 'static,
{
    Arc::new(move |req| {
        let registry = req.ctx.get::<RegistryHandle>().map(|handle| handle.0);
        let outcome = match registry {
            Some(registry) => run(registry, req),
            None => Err(ToolError::internal("registry handle not attached to request")),
        };
        Box::pin(async move { outcome })
    })
}

fn list_available_toolsets(registry: Registry, _req: ToolRequest) -> Result<ToolResult, ToolError> {
    let states: std::collections::HashMap<String, bool> =
        registry.toolset_states().into_iter().collect();
    let toolsets: Vec<serde_json::Value> = registry
        .toolsets()
        .iter()
        .map(|ts| {
            json!({
                "id": ts.id,
                "description": ts.description,
                "default": ts.default,
                "enabled": states.get(&ts.id).copied().unwrap_or(false),
            })
        })
        .collect();
    Ok(ToolResult::json(json!({ "toolsets": toolsets })))
}

fn get_toolset_tools(registry: Registry, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: GetToolsetToolsArgs = req.parse_args()?;
    if !registry.has_toolset(&args.toolset) {
        return Err(ToolError::not_found(format!(
            "toolset does not exist: {}",
            args.toolset
        )));
    }
    let tools: Vec<serde_json::Value> = registry
        .tools()
        .iter()
        .filter(|tool| tool.toolset.id == args.toolset)
        .map(|tool| {
            json!({
                "name": tool.spec.name,
                "description": tool.spec.description,
                "read_only": tool.is_read_only(),
            })
        })
        .collect();
    Ok(ToolResult::json(json!({
        "toolset": args.toolset,
        "tools": tools,
    })))
}

fn enable_toolset(registry: Registry, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: EnableToolsetArgs = req.parse_args()?;
    registry.enable_toolset(&args.toolset)?;
    info!(toolset = %args.toolset, "toolset enabled dynamically");
    Ok(ToolResult::text(format!(
        "toolset {} is now enabled; its tools appear in the next tools/list",
        args.toolset
    )))
}

fn search_tools(registry: Registry, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: SearchToolsArgs = req.parse_args()?;
    let hits = search::search_tools(
        registry.tools(),
        &args.query,
        args.max_results.unwrap_or(search::DEFAULT_MAX_RESULTS),
    );
    let results: Vec<serde_json::Value> = hits
        .iter()
        .map(|hit| {
            json!({
                "name": hit.tool.spec.name,
                "description": hit.tool.spec.description,
                "toolset": hit.tool.toolset.id,
                "score": hit.score,
                "matched_signals": hit.matched_signals,
            })
        })
        .collect();
    Ok(ToolResult::json(json!({
        "query": args.query,
        "results": results,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_tools_core::RequestContext;
    use gh_tools_core::catalog::JsonObject;

    fn registry_with_dynamic() -> Registry {
        let dynamic = Toolset::new("dynamic", "dynamic tools").default_enabled().into_arc();
        let actions = Toolset::new("actions", "actions tools").into_arc();
        let mut all = tools(&dynamic);
        all.push(tool::<ListAvailableToolsetsArgs>(
            "list_workflows",
            "List workflows configured in a repository.",
            ToolAnnotations::read_only(),
            &actions,
            registry_handler(|_reg, _req| Ok(ToolResult::text("unused"))),
        ));
        Registry::builder().tools(all).toolsets(None).build()
    }

    fn call(
        registry: &Registry,
        name: &str,
        arguments: JsonObject,
    ) -> Result<ToolResult, ToolError> {
        let ctx = RequestContext::new();
        ctx.insert(RegistryHandle(registry.clone()));
        let tool = registry
            .tools()
            .iter()
            .find(|t| t.name() == name)
            .expect("tool exists")
            .clone();
        let req = ToolRequest {
            ctx,
            name: name.to_string(),
            arguments,
        };
        futures_executor(tool, req)
    }

    fn futures_executor(tool: ServerTool, req: ToolRequest) -> Result<ToolResult, ToolError> {
        // The dynamic handlers are synchronous inside; poll once.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        runtime.block_on((tool.handler)(req))
    }

    #[test]
    fn enable_toolset_flips_registry_state() {
        let registry = registry_with_dynamic();
        assert!(!registry.toolset_enabled("actions"));

        let mut args = JsonObject::new();
        args.insert("toolset".to_string(), json!("actions"));
        let result = call(&registry, "enable_toolset", args).expect("enable succeeds");
        assert!(!result.is_error);
        assert!(registry.toolset_enabled("actions"));
    }

    #[test]
    fn enable_unknown_toolset_fails() {
        let registry = registry_with_dynamic();
        let mut args = JsonObject::new();
        args.insert("toolset".to_string(), json!("ghost"));
        assert!(matches!(
            call(&registry, "enable_toolset", args),
            Err(ToolError::NotFound(_))
        ));
    }

    #[test]
    fn list_available_toolsets_reports_state() {
        let registry = registry_with_dynamic();
        let result =
            call(&registry, "list_available_toolsets", JsonObject::new()).expect("list succeeds");
        let Some(structured) = &result.structured else {
            panic!("expected structured output");
        };
        let toolsets = structured["toolsets"].as_array().expect("array");
        assert_eq!(toolsets.len(), 2);
        let actions = toolsets
            .iter()
            .find(|t| t["id"] == "actions")
            .expect("actions listed");
        assert_eq!(actions["enabled"], json!(false));
    }

    #[test]
    fn search_tools_returns_ranked_results() {
        let registry = registry_with_dynamic();
        let mut args = JsonObject::new();
        args.insert("query".to_string(), json!("workflows"));
        let result = call(&registry, "search_tools", args).expect("search succeeds");
        let Some(structured) = &result.structured else {
            panic!("expected structured output");
        };
        let results = structured["results"].as_array().expect("array");
        assert!(!results.is_empty());
        assert_eq!(results[0]["name"], json!("list_workflows"));
    }

    #[test]
    fn missing_registry_handle_is_internal_error() {
        let registry = registry_with_dynamic();
        let tool = registry
            .tools()
            .iter()
            .find(|t| t.name() == "search_tools")
            .expect("tool exists")
            .clone();
        let req = ToolRequest {
            ctx: RequestContext::new(),
            name: "search_tools".to_string(),
            arguments: JsonObject::new(),
        };
        let err = futures_executor(tool, req).expect_err("no handle attached");
        assert!(matches!(err, ToolError::Internal(_)));
    }
}
