//! Shared helpers for catalog construction and handler plumbing.

use gh_tools_core::catalog::{ToolAnnotations, ToolSpec};
use gh_tools_core::schema::input_schema_value;
use gh_tools_core::{RequestContext, ServerTool, ToolError, ToolHandler, ToolRequest, ToolResult, Toolset};
use gh_tools_github::Deps;
use gh_tools_github::bag;
use schemars::JsonSchema;
use std::future::Future;
use std::sync::Arc;

pub(crate) const REDACTED_NOTICE: &str =
    "[content redacted: author does not have push access to this repository]";

/// Wrap an async handler function into an erased [`ToolHandler`], capturing
/// the dependencies once.
pub(crate) fn handler<F, Fut>(deps: &Arc<Deps>, run: F) -> ToolHandler
where
    F: Fn(Arc<Deps>, ToolRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ToolResult, ToolError>> + Send + 'static,
{
    let deps = Arc::clone(deps);
    Arc::new(move |req| {
        let deps = Arc::clone(&deps);
        Box::pin(run(deps, req))
    })
}

/// Build a tool record with the schema derived from its input type.
pub(crate) fn tool<In: JsonSchema + 'static>(
    name: &str,
    description: &str,
    annotations: ToolAnnotations,
    toolset: &Arc<Toolset>,
    handler: ToolHandler,
) -> ServerTool {
    ServerTool::new(
        ToolSpec {
            name: name.to_string(),
            title: None,
            description: description.to_string(),
            input_schema: input_schema_value::<In>(),
            annotations,
        },
        Arc::clone(toolset),
        handler,
    )
}

/// Redact an author-controlled field unless lockdown clears the author.
///
/// No-op when lockdown is disabled. A lockdown query failure is recorded
/// and propagated; the caller must not return the content.
pub(crate) async fn guard_author_content(
    deps: &Arc<Deps>,
    ctx: &RequestContext,
    author: &str,
    owner: &str,
    repo: &str,
    value: &mut serde_json::Value,
    field: &str,
) -> Result<(), ToolError> {
    let Some(cache) = &deps.lockdown else {
        return Ok(());
    };
    let safe = cache
        .is_safe_content(ctx, deps.as_ref(), author, owner, repo)
        .await
        .map_err(|e| bag::record_graphql(ctx, e))?;
    if !safe
        && let Some(slot) = value.get_mut(field)
    {
        *slot = serde_json::Value::String(REDACTED_NOTICE.to_string());
    }
    Ok(())
}
