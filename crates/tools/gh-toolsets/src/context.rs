//! The `context` toolset: who is the caller.

use crate::util::{handler, tool};
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::{ServerTool, ToolError, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use gh_tools_github::error::RestError;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct GetMeArgs {}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![tool::<GetMeArgs>(
        "get_me",
        "Get the authenticated GitHub user profile. Use this to resolve \"my\" in requests.",
        ToolAnnotations::read_only(),
        toolset,
        handler(deps, get_me),
    )]
}

async fn get_me(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let user = deps
        .rest
        .current()
        .user()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", "/user", &e)))?;
    let value = serde_json::to_value(&user).map_err(|e| ToolError::internal(e.to_string()))?;
    Ok(ToolResult::json(value))
}
