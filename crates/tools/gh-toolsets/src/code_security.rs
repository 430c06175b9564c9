//! The `code_security` toolset.

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
struct ListCodeScanningAlertsArgs {
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Alert state filter: open, closed, dismissed or fixed
    state: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetCodeScanningAlertArgs {
    owner: String,
    repo: String,
    /// Alert number
    alert_number: u64,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<ListCodeScanningAlertsArgs>(
            "list_code_scanning_alerts",
            "List code scanning alerts for a repository.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_code_scanning_alerts),
        )
        .with_required_scopes(&["security_events"]),
        tool::<GetCodeScanningAlertArgs>(
            "get_code_scanning_alert",
            "Get one code scanning alert by number.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, get_code_scanning_alert),
        )
        .with_required_scopes(&["security_events"]),
    ]
}

async fn list_code_scanning_alerts(
    deps: Arc<Deps>,
    req: ToolRequest,
) -> Result<ToolResult, ToolError> {
    let args: ListCodeScanningAlertsArgs = req.parse_args()?;
    let mut resource = format!("/repos/{}/{}/code-scanning/alerts", args.owner, args.repo);
    if let Some(state) = &args.state {
        resource.push_str(&format!("?state={state}"));
    }

    let value: serde_json::Value = deps
        .rest
        .get(&resource, None::<&()>)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;
    Ok(ToolResult::json(value))
}

async fn get_code_scanning_alert(
    deps: Arc<Deps>,
    req: ToolRequest,
) -> Result<ToolResult, ToolError> {
    let args: GetCodeScanningAlertArgs = req.parse_args()?;
    let resource = format!(
        "/repos/{}/{}/code-scanning/alerts/{}",
        args.owner, args.repo, args.alert_number
    );

    let value: serde_json::Value = deps
        .rest
        .get(&resource, None::<&()>)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;
    Ok(ToolResult::json(value))
}
