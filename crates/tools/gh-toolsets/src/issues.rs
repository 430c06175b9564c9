//! The `issues` toolset.

use crate::util::{guard_author_content, handler, tool};
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::{ServerTool, ToolError, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use gh_tools_github::error::RestError;
use octocrab::params;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct GetIssueArgs {
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Issue number
    issue_number: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListIssuesArgs {
    owner: String,
    repo: String,
    /// Issue state: open, closed or all (default open)
    state: Option<String>,
    /// Results per page, max 100 (default 30)
    per_page: Option<u8>,
    /// Page number (default 1)
    page: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct CreateIssueArgs {
    owner: String,
    repo: String,
    /// Issue title
    title: String,
    /// Issue body in markdown
    body: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AddIssueCommentArgs {
    owner: String,
    repo: String,
    issue_number: u64,
    /// Comment body in markdown
    body: String,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<GetIssueArgs>(
            "get_issue",
            "Get the details of an issue, including its body and author.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, get_issue),
        ),
        tool::<ListIssuesArgs>(
            "list_issues",
            "List issues in a repository, filtered by state.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_issues),
        ),
        tool::<CreateIssueArgs>(
            "create_issue",
            "Open a new issue in a repository.",
            ToolAnnotations::write(),
            toolset,
            handler(deps, create_issue),
        )
        .with_required_scopes(&["repo"]),
        tool::<AddIssueCommentArgs>(
            "add_issue_comment",
            "Add a comment to an existing issue.",
            ToolAnnotations::write(),
            toolset,
            handler(deps, add_issue_comment),
        )
        .with_required_scopes(&["repo"]),
    ]
}

pub(crate) fn issue_state(state: Option<&str>) -> Result<params::State, ToolError> {
    match state {
        Some("open") | None => Ok(params::State::Open),
        Some("closed") => Ok(params::State::Closed),
        Some("all") => Ok(params::State::All),
        Some(other) => Err(ToolError::invalid_input(format!(
            "invalid state: {other}. Use 'open', 'closed', or 'all'"
        ))),
    }
}

async fn get_issue(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: GetIssueArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/issues/{}", args.owner, args.repo, args.issue_number);
    let issue = deps
        .rest
        .issues(&args.owner, &args.repo)
        .get(args.issue_number)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let author = issue.user.login.clone();
    let mut value = serde_json::to_value(&issue).map_err(|e| ToolError::internal(e.to_string()))?;
    guard_author_content(
        &deps, &req.ctx, &author, &args.owner, &args.repo, &mut value, "body",
    )
    .await?;
    Ok(ToolResult::json(value))
}

async fn list_issues(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListIssuesArgs = req.parse_args()?;
    let state = issue_state(args.state.as_deref())?;
    let resource = format!("/repos/{}/{}/issues", args.owner, args.repo);

    let page = deps
        .rest
        .issues(&args.owner, &args.repo)
        .list()
        .state(state)
        .per_page(args.per_page.unwrap_or(30).min(100))
        .page(args.page.unwrap_or(1))
        .send()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let items: Vec<serde_json::Value> = page
        .items
        .iter()
        .map(|issue| {
            json!({
                "number": issue.number,
                "title": issue.title,
                "state": issue.state,
                "author": issue.user.login,
                "comments": issue.comments,
                "html_url": issue.html_url,
            })
        })
        .collect();
    Ok(ToolResult::json(json!({ "issues": items })))
}

async fn create_issue(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: CreateIssueArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/issues", args.owner, args.repo);

    let issues = deps.rest.issues(&args.owner, &args.repo);
    let mut builder = issues.create(&args.title);
    if let Some(body) = &args.body {
        builder = builder.body(body);
    }
    let issue = builder
        .send()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("POST", &resource, &e)))?;

    Ok(ToolResult::json(json!({
        "number": issue.number,
        "title": issue.title,
        "html_url": issue.html_url,
    })))
}

async fn add_issue_comment(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: AddIssueCommentArgs = req.parse_args()?;
    let resource = format!(
        "/repos/{}/{}/issues/{}/comments",
        args.owner, args.repo, args.issue_number
    );

    let comment = deps
        .rest
        .issues(&args.owner, &args.repo)
        .create_comment(args.issue_number, &args.body)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("POST", &resource, &e)))?;

    Ok(ToolResult::json(json!({
        "id": comment.id,
        "html_url": comment.html_url,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parsing_accepts_known_values() {
        assert!(matches!(issue_state(None), Ok(params::State::Open)));
        assert!(matches!(issue_state(Some("open")), Ok(params::State::Open)));
        assert!(matches!(issue_state(Some("closed")), Ok(params::State::Closed)));
        assert!(matches!(issue_state(Some("all")), Ok(params::State::All)));
        assert!(issue_state(Some("merged")).is_err());
    }
}
