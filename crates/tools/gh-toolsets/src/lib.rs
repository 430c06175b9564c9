//! Default GitHub catalog for gh-mcp.
//!
//! Each module contributes the tools of one toolset; this crate assembles
//! them into the lists the registry builder consumes, together with the
//! deprecated-alias map. Handlers capture their [`Deps`] at build time and
//! read request-scoped state (error bag, registry handle) from the context.

pub mod actions;
pub mod code_security;
pub mod context;
pub mod dynamic;
pub mod issues;
pub mod notifications;
pub mod prompts;
pub mod pulls;
pub mod repos;
pub mod resources;
mod util;

use gh_tools_core::{ServerPrompt, ServerResourceTemplate, ServerTool, Toolset};
use gh_tools_github::Deps;
use std::collections::HashMap;
use std::sync::Arc;

/// Stable toolset identifiers.
pub mod toolset_ids {
    pub const CONTEXT: &str = "context";
    pub const ISSUES: &str = "issues";
    pub const PULL_REQUESTS: &str = "pull_requests";
    pub const REPOS: &str = "repos";
    pub const ACTIONS: &str = "actions";
    pub const CODE_SECURITY: &str = "code_security";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const DYNAMIC: &str = "dynamic";
}

/// The assembled default catalog.
pub struct Catalog {
    pub tools: Vec<ServerTool>,
    pub resource_templates: Vec<ServerResourceTemplate>,
    pub prompts: Vec<ServerPrompt>,
}

/// Deprecated tool names still accepted from older clients.
pub fn deprecated_aliases() -> HashMap<String, String> {
    [
        ("get_issue_details", "get_issue"),
        ("list_pull_request_files", "get_pull_request"),
        ("run_job_logs", "get_job_logs"),
    ]
    .into_iter()
    .map(|(old, new)| (old.to_string(), new.to_string()))
    .collect()
}

/// Build the full catalog against one set of dependencies.
pub fn default_catalog(deps: &Arc<Deps>) -> Catalog {
    let context_ts = Toolset::new(toolset_ids::CONTEXT, "Tools about the authenticated user")
        .default_enabled()
        .with_icon("person")
        .with_instructions(|| {
            "Call get_me first when a request says \"my\" or \"mine\"; it resolves the \
             authenticated user without guessing."
                .to_string()
        })
        .into_arc();
    let issues_ts = Toolset::new(toolset_ids::ISSUES, "GitHub issue reading and writing")
        .default_enabled()
        .with_icon("issue-opened")
        .into_arc();
    let pulls_ts = Toolset::new(toolset_ids::PULL_REQUESTS, "Pull request reading and writing")
        .default_enabled()
        .with_icon("git-pull-request")
        .into_arc();
    let repos_ts = Toolset::new(toolset_ids::REPOS, "Repository content and metadata")
        .default_enabled()
        .with_icon("repo")
        .into_arc();
    let actions_ts = Toolset::new(toolset_ids::ACTIONS, "GitHub Actions workflows and logs")
        .with_icon("play")
        .into_arc();
    let code_security_ts =
        Toolset::new(toolset_ids::CODE_SECURITY, "Code scanning alerts")
            .with_icon("shield")
            .into_arc();
    let notifications_ts =
        Toolset::new(toolset_ids::NOTIFICATIONS, "Notification inbox management")
            .with_icon("bell")
            .into_arc();
    let dynamic_ts = Toolset::new(
        toolset_ids::DYNAMIC,
        "Discover and enable further toolsets at runtime",
    )
    .with_icon("tools")
    .with_instructions(|| {
        "Extra toolsets exist beyond the enabled ones; use list_available_toolsets and \
         enable_toolset when a task needs capabilities you cannot see."
            .to_string()
    })
    .into_arc();

    let mut tools = Vec::new();
    tools.extend(context::tools(deps, &context_ts));
    tools.extend(issues::tools(deps, &issues_ts));
    tools.extend(pulls::tools(deps, &pulls_ts));
    tools.extend(repos::tools(deps, &repos_ts));
    tools.extend(actions::tools(deps, &actions_ts));
    tools.extend(code_security::tools(deps, &code_security_ts));
    tools.extend(notifications::tools(deps, &notifications_ts));
    tools.extend(dynamic::tools(&dynamic_ts));

    Catalog {
        tools,
        resource_templates: resources::templates(deps, &repos_ts),
        prompts: prompts::prompts(&issues_ts),
    }
}
