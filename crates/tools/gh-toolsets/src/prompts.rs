//! Prompt templates.

use gh_tools_core::catalog::{
    PromptArgumentSpec, PromptHandler, PromptMessage, PromptRequest, PromptResult, PromptRole,
    PromptSpec,
};
use gh_tools_core::{ServerPrompt, Toolset};
use std::sync::Arc;

pub fn prompts(toolset: &Arc<Toolset>) -> Vec<ServerPrompt> {
    vec![ServerPrompt::new(
        PromptSpec {
            name: "issue_triage".to_string(),
            title: Some("Triage an issue".to_string()),
            description: Some(
                "Walk through triaging one GitHub issue: reproduce, label, route.".to_string(),
            ),
            arguments: vec![
                PromptArgumentSpec {
                    name: "owner".to_string(),
                    description: Some("Repository owner".to_string()),
                    required: true,
                },
                PromptArgumentSpec {
                    name: "repo".to_string(),
                    description: Some("Repository name".to_string()),
                    required: true,
                },
                PromptArgumentSpec {
                    name: "issue_number".to_string(),
                    description: Some("Issue to triage".to_string()),
                    required: true,
                },
            ],
        },
        Arc::clone(toolset),
        triage_handler(),
    )]
}

fn triage_handler() -> PromptHandler {
    Arc::new(|req: PromptRequest| {
        Box::pin(async move {
            let get = |key: &str| {
                req.arguments
                    .get(key)
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .unwrap_or_else(|| format!("<missing {key}>"))
            };
            let (owner, repo, number) = (get("owner"), get("repo"), get("issue_number"));

            let text = format!(
                "Triage issue #{number} in {owner}/{repo}.\n\
                 1. Fetch it with get_issue and read the report carefully.\n\
                 2. Check list_issues for duplicates before anything else.\n\
                 3. Decide: bug, feature request, question, or invalid.\n\
                 4. Summarize the reproduction steps if it is a bug, and note \
                 what information is missing.\n\
                 5. Suggest labels and, if appropriate, a comment asking for \
                 the missing details."
            );

            Ok(PromptResult {
                description: Some(format!("Triage {owner}/{repo}#{number}")),
                messages: vec![PromptMessage {
                    role: PromptRole::User,
                    text,
                }],
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gh_tools_core::RequestContext;
    use gh_tools_core::catalog::JsonObject;

    #[tokio::test]
    async fn triage_prompt_fills_arguments() {
        let ts = Toolset::new("issues", "issues").into_arc();
        let prompt = prompts(&ts).remove(0);

        let mut arguments = JsonObject::new();
        arguments.insert("owner".to_string(), serde_json::json!("octo"));
        arguments.insert("repo".to_string(), serde_json::json!("demo"));
        arguments.insert("issue_number".to_string(), serde_json::json!(7));

        let result = (prompt.handler)(PromptRequest {
            ctx: RequestContext::new(),
            name: "issue_triage".to_string(),
            arguments,
        })
        .await
        .expect("prompt renders");

        assert_eq!(result.description.as_deref(), Some("Triage octo/demo#7"));
        assert!(result.messages[0].text.contains("Triage issue #7 in octo/demo"));
    }

    #[tokio::test]
    async fn missing_arguments_are_marked() {
        let ts = Toolset::new("issues", "issues").into_arc();
        let prompt = prompts(&ts).remove(0);

        let result = (prompt.handler)(PromptRequest {
            ctx: RequestContext::new(),
            name: "issue_triage".to_string(),
            arguments: JsonObject::new(),
        })
        .await
        .expect("prompt renders");
        assert!(result.messages[0].text.contains("<missing issue_number>"));
    }
}
