//! Repository-content resource templates.

use crate::repos::fetch_file_text;
use gh_tools_core::catalog::{
    ResourceContent, ResourceHandler, ResourceRequest, ResourceResult, ResourceTemplateSpec,
};
use gh_tools_core::{ServerResourceTemplate, ToolError, Toolset};
use gh_tools_github::Deps;
use std::sync::Arc;

pub const CONTENTS_TEMPLATE: &str = "repo://{owner}/{repo}/contents{/path*}";
pub const REF_CONTENTS_TEMPLATE: &str = "repo://{owner}/{repo}/refs/{ref}/contents{/path*}";

pub fn templates(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerResourceTemplate> {
    vec![
        ServerResourceTemplate::new(
            ResourceTemplateSpec {
                uri_template: CONTENTS_TEMPLATE.to_string(),
                name: "repository_content".to_string(),
                title: None,
                description: Some("File contents from the default branch".to_string()),
                mime_type: Some("text/plain".to_string()),
            },
            Arc::clone(toolset),
            contents_handler(deps),
        ),
        ServerResourceTemplate::new(
            ResourceTemplateSpec {
                uri_template: REF_CONTENTS_TEMPLATE.to_string(),
                name: "repository_content_at_ref".to_string(),
                title: None,
                description: Some("File contents at a branch, tag or commit".to_string()),
                mime_type: Some("text/plain".to_string()),
            },
            Arc::clone(toolset),
            contents_handler(deps),
        ),
    ]
}

fn contents_handler(deps: &Arc<Deps>) -> ResourceHandler {
    let deps = Arc::clone(deps);
    Arc::new(move |req: ResourceRequest| {
        let deps = Arc::clone(&deps);
        Box::pin(async move {
            let target = parse_content_uri(&req.uri)?;
            let text = fetch_file_text(
                &deps,
                &req.ctx,
                &target.owner,
                &target.repo,
                &target.path,
                target.reference.as_deref(),
            )
            .await?;
            Ok(ResourceResult {
                contents: vec![ResourceContent {
                    uri: req.uri,
                    mime_type: Some("text/plain".to_string()),
                    text,
                }],
            })
        })
    })
}

struct ContentTarget {
    owner: String,
    repo: String,
    reference: Option<String>,
    path: String,
}

/// Parse `repo://owner/repo/contents/<path>` or
/// `repo://owner/repo/refs/<ref>/contents/<path>`.
fn parse_content_uri(uri: &str) -> Result<ContentTarget, ToolError> {
    let rest = uri
        .strip_prefix("repo://")
        .ok_or_else(|| ToolError::invalid_input(format!("unsupported resource uri: {uri}")))?;
    if rest.contains('{') {
        return Err(ToolError::invalid_input(
            "resource uri contains unexpanded template placeholders",
        ));
    }

    let segments: Vec<&str> = rest.split('/').collect();
    match segments.as_slice() {
        [owner, repo, "contents", path @ ..] if !path.is_empty() => Ok(ContentTarget {
            owner: (*owner).to_string(),
            repo: (*repo).to_string(),
            reference: None,
            path: path.join("/"),
        }),
        [owner, repo, "refs", reference, "contents", path @ ..] if !path.is_empty() => {
            Ok(ContentTarget {
                owner: (*owner).to_string(),
                repo: (*repo).to_string(),
                reference: Some((*reference).to_string()),
                path: path.join("/"),
            })
        }
        _ => Err(ToolError::invalid_input(format!(
            "unsupported resource uri: {uri}"
        ))),
    }
}
