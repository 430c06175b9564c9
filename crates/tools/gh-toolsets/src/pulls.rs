//! The `pull_requests` toolset.

use crate::issues::issue_state;
use crate::util::{guard_author_content, handler, tool};
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::{ServerTool, ToolError, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use gh_tools_github::error::RestError;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct GetPullRequestArgs {
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Pull request number
    pull_number: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListPullRequestsArgs {
    owner: String,
    repo: String,
    /// Pull request state: open, closed or all (default open)
    state: Option<String>,
    /// Results per page, max 100 (default 30)
    per_page: Option<u8>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreatePullRequestArgs {
    owner: String,
    repo: String,
    /// Pull request title
    title: String,
    /// Branch with the changes
    head: String,
    /// Branch to merge into
    base: String,
    /// Pull request body in markdown
    body: Option<String>,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<GetPullRequestArgs>(
            "get_pull_request",
            "Get the details of a pull request, including its body, author and branches.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, get_pull_request),
        ),
        tool::<ListPullRequestsArgs>(
            "list_pull_requests",
            "List pull requests in a repository, filtered by state.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_pull_requests),
        ),
        tool::<CreatePullRequestArgs>(
            "create_pull_request",
            "Open a new pull request from one branch into another.",
            ToolAnnotations::write(),
            toolset,
            handler(deps, create_pull_request),
        )
        .with_required_scopes(&["repo"]),
    ]
}

async fn get_pull_request(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: GetPullRequestArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/pulls/{}", args.owner, args.repo, args.pull_number);

    let pr = deps
        .rest
        .pulls(&args.owner, &args.repo)
        .get(args.pull_number)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let author = pr.user.as_ref().map(|u| u.login.clone()).unwrap_or_default();
    let mut value = json!({
        "number": pr.number,
        "title": pr.title,
        "body": pr.body,
        "author": author,
        "head": pr.head.ref_field,
        "base": pr.base.ref_field,
        "draft": pr.draft,
        "html_url": pr.html_url,
    });
    if !author.is_empty() {
        guard_author_content(
            &deps, &req.ctx, &author, &args.owner, &args.repo, &mut value, "body",
        )
        .await?;
    }
    Ok(ToolResult::json(value))
}

async fn list_pull_requests(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListPullRequestsArgs = req.parse_args()?;
    let state = issue_state(args.state.as_deref())?;
    let resource = format!("/repos/{}/{}/pulls", args.owner, args.repo);

    let page = deps
        .rest
        .pulls(&args.owner, &args.repo)
        .list()
        .state(state)
        .per_page(args.per_page.unwrap_or(30).min(100))
        .send()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let items: Vec<serde_json::Value> = page
        .items
        .into_iter()
        .map(|pr| {
            json!({
                "number": pr.number,
                "title": pr.title.unwrap_or_default(),
                "author": pr.user.map(|u| u.login).unwrap_or_default(),
                "state": if pr.state == Some(octocrab::models::IssueState::Open) {
                    "open"
                } else {
                    "closed"
                },
                "created_at": pr.created_at.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
                "updated_at": pr.updated_at.map(|dt| dt.to_rfc3339()).unwrap_or_default(),
            })
        })
        .collect();
    Ok(ToolResult::json(json!({ "pull_requests": items })))
}

async fn create_pull_request(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: CreatePullRequestArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/pulls", args.owner, args.repo);

    let pulls = deps.rest.pulls(&args.owner, &args.repo);
    let mut builder = pulls.create(&args.title, &args.head, &args.base);
    if let Some(body) = &args.body {
        builder = builder.body(body);
    }
    let pr = builder
        .send()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("POST", &resource, &e)))?;

    Ok(ToolResult::json(json!({
        "number": pr.number,
        "title": pr.title.unwrap_or_default(),
        "html_url": pr.html_url,
    })))
}
