//! Dispatcher integration tests: alias resolution, filtering, error
//! capture and output sanitization, without a transport layer.

use gh_tools_core::catalog::{
    PromptArgumentSpec, PromptMessage, PromptResult, PromptRole, PromptSpec, ResourceContent,
    ResourceResult, ResourceTemplateSpec, ServerPrompt, ServerResourceTemplate, ToolAnnotations,
    ToolHandler, ToolSpec,
};
use gh_tools_core::schema::input_schema_value;
use gh_tools_core::{
    JsonObject, Registry, RequestContext, ServerTool, ToolContent, ToolError, ToolResult, Toolset,
};
use gh_tools_github::ErrorBag;
use gh_tools_github::error::RestError;
use gh_tools_mcp::Dispatcher;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

// =============================================================================
// Test catalog
// =============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
struct EchoInput {
    /// Text to echo back
    message: String,
}

fn echo_handler() -> ToolHandler {
    Arc::new(|req| {
        Box::pin(async move {
            let input: EchoInput = req.parse_args()?;
            Ok(ToolResult::text(format!("echo: {}", input.message)))
        })
    })
}

fn tool(name: &str, toolset: &Arc<Toolset>, read_only: bool, handler: ToolHandler) -> ServerTool {
    ServerTool::new(
        ToolSpec {
            name: name.to_string(),
            title: None,
            description: format!("{name} tool"),
            input_schema: input_schema_value::<EchoInput>(),
            annotations: if read_only {
                ToolAnnotations::read_only()
            } else {
                ToolAnnotations::write()
            },
        },
        Arc::clone(toolset),
        handler,
    )
}

fn args(message: &str) -> JsonObject {
    let mut map = JsonObject::new();
    map.insert("message".to_string(), serde_json::json!(message));
    map
}

fn test_registry() -> Registry {
    let issues = Toolset::new("issues", "issue tools").default_enabled().into_arc();
    let hidden = Toolset::new("hidden", "disabled tools").into_arc();

    let panicking: ToolHandler = Arc::new(|_req| Box::pin(async { panic!("handler bug") }));
    let failing: ToolHandler = Arc::new(|req| {
        Box::pin(async move {
            Err(gh_tools_github::bag::record_rest(
                &req.ctx,
                RestError::new("GET", "/repos/o/r/issues/1", Some(502), "bad gateway"),
            ))
        })
    });
    let injecting: ToolHandler = Arc::new(|_req| {
        Box::pin(async move {
            Ok(ToolResult::text(
                "`\u{200B}`\u{200B}`steal secrets\nfmt.Println(42)\n```",
            ))
        })
    });

    let prompt = ServerPrompt::new(
        PromptSpec {
            name: "issue_triage".to_string(),
            title: None,
            description: Some("Triage an issue".to_string()),
            arguments: vec![PromptArgumentSpec {
                name: "issue".to_string(),
                description: None,
                required: true,
            }],
        },
        Arc::clone(&issues),
        Arc::new(|req| {
            Box::pin(async move {
                let issue = req
                    .arguments
                    .get("issue")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown")
                    .to_string();
                Ok(PromptResult {
                    description: Some("Triage an issue".to_string()),
                    messages: vec![PromptMessage {
                        role: PromptRole::User,
                        text: format!("Please triage issue {issue}."),
                    }],
                })
            })
        }),
    );

    let template = ServerResourceTemplate::new(
        ResourceTemplateSpec {
            uri_template: "repo://{owner}/{repo}/contents{/path*}".to_string(),
            name: "repository_content".to_string(),
            title: None,
            description: Some("Repository file contents".to_string()),
            mime_type: Some("text/plain".to_string()),
        },
        Arc::clone(&issues),
        Arc::new(|req| {
            Box::pin(async move {
                Ok(ResourceResult {
                    contents: vec![ResourceContent {
                        uri: req.uri,
                        mime_type: Some("text/plain".to_string()),
                        text: "file body\u{200B}".to_string(),
                    }],
                })
            })
        }),
    );

    Registry::builder()
        .tools(vec![
            tool("issue_echo", &issues, true, echo_handler()),
            tool("issue_write", &issues, false, echo_handler()),
            tool("panicking_tool", &issues, true, panicking),
            tool("failing_tool", &issues, true, failing),
            tool("injecting_tool", &issues, true, injecting),
            tool("hidden_tool", &hidden, true, echo_handler()),
        ])
        .prompts(vec![prompt])
        .resource_templates(vec![template])
        .aliases([("get_issue_echo".to_string(), "issue_echo".to_string())])
        .toolsets(None)
        .build()
}

fn text_of(result: &ToolResult) -> &str {
    match &result.content[0] {
        ToolContent::Text(text) => text,
    }
}

// =============================================================================
// Tool dispatch
// =============================================================================

#[tokio::test]
async fn call_tool_runs_handler() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "issue_echo", args("hi"))
        .await;
    assert!(!result.is_error);
    assert_eq!(text_of(&result), "echo: hi");
}

#[tokio::test]
async fn call_tool_resolves_alias() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "get_issue_echo", args("hi"))
        .await;
    assert!(!result.is_error);
    assert_eq!(text_of(&result), "echo: hi");
}

#[tokio::test]
async fn unknown_tool_is_error_result() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "missing_tool", JsonObject::new())
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("tool does not exist"));
}

#[tokio::test]
async fn toolset_disabled_tool_is_unknown() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "hidden_tool", args("hi"))
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("tool does not exist"));
}

#[tokio::test]
async fn panicking_handler_becomes_error_result() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "panicking_tool", JsonObject::new())
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("internal error"));
}

#[tokio::test]
async fn handler_failure_lands_in_error_bag() {
    let dispatcher = Dispatcher::new(test_registry());
    let ctx = RequestContext::new();
    let result = dispatcher
        .call_tool(&ctx, "failing_tool", JsonObject::new())
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("bad gateway"));

    let bag = ErrorBag::from_ctx(&ctx).expect("dispatcher attached a bag");
    assert_eq!(bag.counts(), (1, 0, 0));
}

#[tokio::test]
async fn error_bag_resets_between_calls() {
    let dispatcher = Dispatcher::new(test_registry());
    let ctx = RequestContext::new();
    let _ = dispatcher
        .call_tool(&ctx, "failing_tool", JsonObject::new())
        .await;
    let _ = dispatcher.call_tool(&ctx, "issue_echo", args("hi")).await;

    let bag = ErrorBag::from_ctx(&ctx).expect("bag still attached");
    assert_eq!(bag.counts(), (0, 0, 0));
}

#[tokio::test]
async fn output_text_is_sanitized() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "injecting_tool", JsonObject::new())
        .await;
    assert!(!result.is_error);
    assert_eq!(text_of(&result), "```\nfmt.Println(42)\n```");
}

#[tokio::test]
async fn invalid_arguments_are_error_result() {
    let dispatcher = Dispatcher::new(test_registry());
    let result = dispatcher
        .call_tool(&RequestContext::new(), "issue_echo", JsonObject::new())
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("invalid input"));
}

#[tokio::test]
async fn ambiguous_variants_are_config_error() {
    let ts = Toolset::new("ts", "ts").into_arc();
    // Two variants with no distinguishing flags: a configuration bug.
    let registry = Registry::builder()
        .tools(vec![
            tool("dup", &ts, true, echo_handler()),
            tool("dup", &ts, true, echo_handler()),
        ])
        .toolsets(Some(vec!["all".to_string()]))
        .build();
    let dispatcher = Dispatcher::new(registry);
    let result = dispatcher
        .call_tool(&RequestContext::new(), "dup", args("x"))
        .await;
    assert!(result.is_error);
    assert!(text_of(&result).contains("ambiguous tool variant"));
}

#[tokio::test]
async fn flag_variants_dispatch_unambiguously() {
    let ts = Toolset::new("ts", "ts").into_arc();
    let on: ToolHandler = Arc::new(|_req| Box::pin(async { Ok(ToolResult::text("new logs")) }));
    let off: ToolHandler = Arc::new(|_req| Box::pin(async { Ok(ToolResult::text("old logs")) }));
    let registry = Registry::builder()
        .tools(vec![
            tool("get_job_logs", &ts, true, on).with_flag_enable("new_logs"),
            tool("get_job_logs", &ts, true, off).with_flag_disable("new_logs"),
        ])
        .toolsets(Some(vec!["all".to_string()]))
        .flag_resolver(|_ctx, flag| Ok(flag == "new_logs"))
        .build();
    let dispatcher = Dispatcher::new(registry);
    let result = dispatcher
        .call_tool(&RequestContext::new(), "get_job_logs", JsonObject::new())
        .await;
    assert!(!result.is_error);
    assert_eq!(text_of(&result), "new logs");
}

#[tokio::test]
async fn read_only_registry_rejects_write_tools() {
    let issues = Toolset::new("issues", "issue tools").default_enabled().into_arc();
    let registry = Registry::builder()
        .tools(vec![
            tool("issue_echo", &issues, true, echo_handler()),
            tool("issue_write", &issues, false, echo_handler()),
        ])
        .read_only(true)
        .toolsets(None)
        .build();
    let dispatcher = Dispatcher::new(registry);

    let listed = dispatcher.list_tools(&RequestContext::new());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name(), "issue_echo");

    let result = dispatcher
        .call_tool(&RequestContext::new(), "issue_write", args("x"))
        .await;
    assert!(result.is_error);
}

// =============================================================================
// Prompts and resources
// =============================================================================

#[tokio::test]
async fn get_prompt_renders_messages() {
    let dispatcher = Dispatcher::new(test_registry());
    let mut arguments = JsonObject::new();
    arguments.insert("issue".to_string(), serde_json::json!("octo/repo#7"));
    let result = dispatcher
        .get_prompt(&RequestContext::new(), "issue_triage", arguments)
        .await
        .expect("prompt exists");
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].text, "Please triage issue octo/repo#7.");
}

#[tokio::test]
async fn unknown_prompt_is_not_found() {
    let dispatcher = Dispatcher::new(test_registry());
    let err = dispatcher
        .get_prompt(&RequestContext::new(), "missing", JsonObject::new())
        .await
        .expect_err("prompt does not exist");
    assert!(matches!(err, ToolError::NotFound(_)));
}

#[tokio::test]
async fn read_resource_matches_template_verbatim_and_sanitizes() {
    let dispatcher = Dispatcher::new(test_registry());
    let uri = "repo://{owner}/{repo}/contents{/path*}";
    let result = dispatcher
        .read_resource(&RequestContext::new(), uri)
        .await
        .expect("template uri matches verbatim");
    assert_eq!(result.contents.len(), 1);
    // The zero-width space is gone.
    assert_eq!(result.contents[0].text, "file body");

    let err = dispatcher
        .read_resource(&RequestContext::new(), "repo://octo/repo/contents/README.md")
        .await
        .expect_err("concrete uri does not match the template string");
    assert!(matches!(err, ToolError::NotFound(_)));
}

#[tokio::test]
async fn list_tools_preserves_canonical_order() {
    let dispatcher = Dispatcher::new(test_registry());
    let names: Vec<String> = dispatcher
        .list_tools(&RequestContext::new())
        .iter()
        .map(|t| t.spec.name.clone())
        .collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted, "issues toolset sorts by name");
}
