//! The `notifications` toolset.

use crate::util::{handler, tool};
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
struct ListNotificationsArgs {
    /// Include notifications already marked as read (default false)
    all: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DismissNotificationArgs {
    /// Notification thread id
    thread_id: u64,
}

pub fn tools(deps: &Arc<Deps>, toolset: &Arc<Toolset>) -> Vec<ServerTool> {
    vec![
        tool::<ListNotificationsArgs>(
            "list_notifications",
            "List notifications for the authenticated user.",
            ToolAnnotations::read_only(),
            toolset,
            handler(deps, list_notifications),
        ),
        tool::<DismissNotificationArgs>(
            "dismiss_notification",
            "Mark a notification thread as read.",
            ToolAnnotations::write(),
            toolset,
            handler(deps, dismiss_notification),
        )
        .with_required_scopes(&["notifications"]),
    ]
}

async fn list_notifications(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: ListNotificationsArgs = req.parse_args()?;
    let resource = format!("/notifications?all={}", args.all.unwrap_or(false));

    // The subject shape varies per notification kind; keep the payload as
    // untyped JSON and project the stable fields.
    let value: serde_json::Value = deps
        .rest
        .get(&resource, None::<&()>)
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("GET", &resource, &e)))?;

    let items: Vec<serde_json::Value> = value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry["id"],
                        "reason": entry["reason"],
                        "unread": entry["unread"],
                        "subject": entry["subject"]["title"],
                        "type": entry["subject"]["type"],
                        "repository": entry["repository"]["full_name"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Ok(ToolResult::json(json!({ "notifications": items })))
}

async fn dismiss_notification(deps: Arc<Deps>, req: ToolRequest) -> Result<ToolResult, ToolError> {
    let args: DismissNotificationArgs = req.parse_args()?;
    let resource = format!("/notifications/threads/{}", args.thread_id);

    deps.rest
        .activity()
        .notifications()
        .mark_as_read(octocrab::models::NotificationId(args.thread_id))
        .await
        .map_err(|e| bag::record_rest(&req.ctx, RestError::from_octocrab("PATCH", &resource, &e)))?;

    Ok(ToolResult::text(format!(
        "notification thread {} marked as read",
        args.thread_id
    )))
}
