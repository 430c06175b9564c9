//! The `repos` toolset.

use crate::util::{handler, tool};
use gh_tools_core::catalog::ToolAnnotations;
use gh_tools_core::{RequestContext, ServerTool, ToolError, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use gh_tools_github::error::RestError;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize, JsonSchema)]
struct GetFileContentsArgs {
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Path to the file
    path: String,
    /// Branch, tag or commit SHA (default branch when omitted)
    r#ref: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListBranchesArgs {
    owner: String,
    repo: String,
    /// Results per page, max 100 (default 30)
    per_page: Option<u8>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct SearchRepositoriesArgs {
    /// Search query using GitHub repository search syntax
    query: String,
    /// Results per page, max 100 (default 30)
    per_page: Option<u8>,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<GetFileContentsArgs>(
            "get_file_contents",
            "Read a file from a repository at an optional ref.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, get_file_contents),
        ),
        tool::<ListBranchesArgs>(
            "list_branches",
            "List branches in a repository.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_branches),
        ),
        tool::<SearchRepositoriesArgs>(
            "search_repositories",
            "Search repositories with the GitHub search syntax.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, search_repositories),
        ),
    ]
}

/// Fetch one file's decoded text. Shared with the repository-content
/// resource templates.
pub(crate) async fn fetch_file_text(
    deps: &Arc<Deps>,
    ctx: &RequestContext,
    owner: &str,
    repo: &str,
    path: &str,
    reference: Option<&str>,
) -> Result<String, ToolError> {
    let resource = format!("/repos/{owner}/{repo}/contents/{path}");

    let repos = deps.rest.repos(owner, repo);
    let mut builder = repos.get_content().path(path);
    if let Some(reference) = reference {
        builder = builder.r#ref(reference);
    }
    let contents = builder
        .send()
        .await
        .map_err(|e| bag::record_rest(ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let item = contents
        .items
        .into_iter()
        .next()
        .ok_or_else(|| ToolError::not_found(format!("no content at {path}")))?;
    item.decoded_content()
        .ok_or_else(|| ToolError::invalid_input(format!("{path} is not a text file")))
}

async fn get_file_contents(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: GetFileContentsArgs = req.parse_args()?;
    let text = fetch_file_text(
        &deps,
        &req.ctx,
        &args.owner,
        &args.repo,
        &args.path,
        args.r#ref.as_deref(),
    )
    .await?;
    Ok(ToolResult::text(text))
}

async fn list_branches(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListBranchesArgs = req.parse_args()?;
    let resource = format!("/repos/{}/{}/branches", args.owner, args.repo);

    let page = deps
        .rest
        .repos(&args.owner, &args.repo)
        .list_branches()
        .per_page(args.per_page.unwrap_or(30).min(100))
        .send()
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let branches: Vec<serde_json::Value> = page
        .items
        .iter()
        .map(|branch| json!({ "name": branch.name, "protected": branch.protected }))
        .collect();
    Ok(ToolResult::json(json!({ "branches": branches })))
}

async fn search_repositories(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: SearchRepositoriesArgs = req.parse_args()?;

    let page = deps
        .rest
        .search()
        .repositories(&args.query)
        .per_page(args.per_page.unwrap_or(30).min(100))
        .send()
        .await
        .map_err(|e| {
            bag::record_rest(&req.ctx, RestError::from_octocrab("GET", "/search/repositories", &e))
        })?;

    let repos: Vec<serde_json::Value> = page
        .items
        .iter()
        .map(|repo| {
            json!({
                "full_name": repo.full_name,
                "description": repo.description,
                "stargazers_count": repo.stargazers_count,
                "html_url": repo.html_url,
            })
        })
        .collect();
    Ok(ToolResult::json(json!({ "repositories": repos })))
}
