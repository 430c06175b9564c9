//! The `actions` toolset.

use crate::util::{handler, tool};
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::{ServerTool, ToolError, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use gh_tools_github::error::{RawHttpError, RestError};
use gh_tools_github::logtail;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Default tail length for job logs.
const DEFAULT_TAIL_LINES: usize = 100;

#[derive(Debug, Deserialize, JsonSchema)]
struct ListWorkflowsArgs {
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListWorkflowRunsArgs {
    owner: String,
    repo: String,
    /// Results per page, max 100 (default 30)
    per_page: Option<u8>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct GetJobLogsArgs {
    owner: String,
    repo: String,
    /// Workflow job id
    job_id: u64,
    /// How many trailing lines to return (default 100, max 100000)
    tail_lines: Option<usize>,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<ListWorkflowsArgs>(
            "list_workflows",
            "List workflows configured in a repository.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_workflows),
        ),
        tool::<ListWorkflowRunsArgs>(
            "list_workflow_runs",
            "List recent workflow runs in a repository.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_workflow_runs),
        ),
        tool::<GetJobLogsArgs>(
            "get_job_logs",
            "Download the log of a workflow job and return its tail.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, get_job_logs),
        )
        .with_required_scopes(&["repo"]),
    ]
}

async fn list_workflows(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListWorkflowsArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/actions/workflows", args.owner, args.repo);

    let value: serde_json::Value = deps
        .rest
        .get(&resource, None::<&()>)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;
    Ok(ToolResult::json(value))
}

async fn list_workflow_runs(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListWorkflowRunsArgs = req.parse_args()?;
    let resource = format!(
        "/repos/{}/{}/actions/runs?per_page={}",
        args.owner,
        args.repo,
        args.per_page.unwrap_or(30).min(100)
    );

    let value: serde_json::Value = deps
        .rest
        .get(&resource, None::<&()>)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;
    Ok(ToolResult::json(value))
}

/// Job logs are served as a raw text body behind a redirect, so this goes
/// through the plain HTTP client and the ring-buffer tail instead of the
/// REST client.
async fn get_job_logs(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: GetJobLogsArgs = req.parse_args()?;
    let url = format!(
        "{}/repos/{}/{}/actions/jobs/{}/logs",
        deps.host.trim_end_matches('/'),
        args.owner,
        args.repo,
        args.job_id
    );

    let mut request = deps
        .http
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json");
    if let Some(token) = &deps.token {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .await
        .map_err(|e| bag::record_raw(&req.ctx, RawHttpError::from_reqwest(&url, &e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(bag::record_raw(
            &req.ctx,
            RawHttpError::new(&url, Some(status.as_u16()), "log download failed"),
        ));
    }

    let tail = logtail::tail_response(response, args.tail_lines.unwrap_or(DEFAULT_TAIL_LINES))
        .await
        .map_err(|e| bag::record_raw(&req.ctx, e))?;

    Ok(ToolResult::json(json!({
        "job_id": args.job_id,
        "total_lines": tail.total_lines,
        "tail": tail.text,
    })))
}
