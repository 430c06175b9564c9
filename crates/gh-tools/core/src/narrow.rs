//! Per-request catalog narrowing.
//!
//! `for_mcp_request` returns a shallow clone of the registry whose catalog
//! lists are trimmed so that point lookups (`tools/call`, `resources/read`,
//! `prompts/get`) scan at most one item. Filter settings and the
//! enabled-toolset map are shared with the source registry; the filter
//! pipeline still runs on top of the narrowed lists, which is how
//! feature-flag variants are disambiguated at call time.

use crate::catalog::{ServerPrompt, ServerResourceTemplate, ServerTool};
use crate::registry::Registry;
use std::sync::Arc;

/// The eight MCP method names the registry recognizes. Any other method
/// yields an empty view.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
    pub const RESOURCES_LIST: &str = "resources/list";
    pub const RESOURCES_TEMPLATES_LIST: &str = "resources/templates/list";
    pub const RESOURCES_READ: &str = "resources/read";
    pub const PROMPTS_LIST: &str = "prompts/list";
    pub const PROMPTS_GET: &str = "prompts/get";
}

impl Registry {
    /// Narrow the registry to the items relevant for one MCP request.
    ///
    /// `item` is the tool name for `tools/call`, the concrete URI for
    /// `resources/read` and the prompt name for `prompts/get`; it is ignored
    /// for list methods.
    ///
    /// Note: `resources/read` compares `item` against each template's URI
    /// template string verbatim, not by template expansion. This preserves
    /// the behavior of the system this registry models; switching to real
    /// template matching would be a semantic change.
    pub fn for_mcp_request(&self, method: &str, item: Option<&str>) -> Registry {
        let empty_tools: Arc<Vec<ServerTool>> = Arc::new(vec![]);
        let empty_templates: Arc<Vec<ServerResourceTemplate>> = Arc::new(vec![]);
        let empty_prompts: Arc<Vec<ServerPrompt>> = Arc::new(vec![]);
        let mut view = self.clone();

        // Full lists share the source's backing array by reference; point
        // lookups build a one-item (or per-variant) list.
        let (tools, templates, prompts) = match method {
            methods::TOOLS_LIST => (Arc::clone(&self.tools), empty_templates, empty_prompts),
            methods::TOOLS_CALL => (
                Arc::new(
                    item.map(|name| self.filter_tools_by_name(name)).unwrap_or_default(),
                ),
                empty_templates,
                empty_prompts,
            ),
            methods::RESOURCES_LIST | methods::RESOURCES_TEMPLATES_LIST => (
                empty_tools,
                Arc::clone(&self.resource_templates),
                empty_prompts,
            ),
            methods::RESOURCES_READ => (
                empty_tools,
                Arc::new(
                    item.map(|uri| {
                        self.resource_templates
                            .iter()
                            .filter(|t| t.spec.uri_template == uri)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default(),
                ),
                empty_prompts,
            ),
            methods::PROMPTS_LIST => (empty_tools, empty_templates, Arc::clone(&self.prompts)),
            methods::PROMPTS_GET => (
                empty_tools,
                empty_templates,
                Arc::new(
                    item.map(|name| {
                        self.prompts
                            .iter()
                            .filter(|p| p.spec.name == name)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default(),
                ),
            ),
            // `initialize` and anything unrecognized see an empty catalog.
            _ => (empty_tools, empty_templates, empty_prompts),
        };

        view.tools = tools;
        view.resource_templates = templates;
        view.prompts = prompts;
        view
    }

    /// All tool records carrying the given visible name. Exact matches win;
    /// the alias map is consulted only when nothing matches directly. Every
    /// feature-flag variant is returned; the filter pipeline picks the
    /// survivor.
    pub fn filter_tools_by_name(&self, name: &str) -> Vec<ServerTool> {
        let exact: Vec<ServerTool> = self
            .tools
            .iter()
            .filter(|t| t.spec.name == name)
            .cloned()
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        match self.alias_target(name) {
            Some(canonical) => self
                .tools
                .iter()
                .filter(|t| t.spec.name == canonical)
                .cloned()
                .collect(),
            None => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        PromptResult, PromptSpec, ResourceResult, ResourceTemplateSpec, ServerPrompt,
        ServerResourceTemplate, ToolAnnotations, ToolHandler, ToolResult, ToolSpec,
    };
    use crate::context::RequestContext;
    use crate::toolset::Toolset;
    use std::sync::Arc;

    fn noop() -> ToolHandler {
        Arc::new(|_req| Box::pin(async { Ok(ToolResult::text("ok")) }))
    }

    fn tool(name: &str, toolset: &Arc<Toolset>) -> ServerTool {
        ServerTool::new(
            ToolSpec {
                name: name.to_string(),
                title: None,
                description: format!("{name} description"),
                input_schema: serde_json::json!({"type": "object"}),
                annotations: ToolAnnotations::read_only(),
            },
            Arc::clone(toolset),
            noop(),
        )
    }

    fn sample_registry() -> Registry {
        let issues = Toolset::new("issues", "issues").default_enabled().into_arc();
        let prompt = ServerPrompt::new(
            PromptSpec {
                name: "triage".to_string(),
                title: None,
                description: None,
                arguments: vec![],
            },
            Arc::clone(&issues),
            Arc::new(|_req| Box::pin(async { Ok(PromptResult::default()) })),
        );
        let template = ServerResourceTemplate::new(
            ResourceTemplateSpec {
                uri_template: "repo://{owner}/{repo}/contents{/path*}".to_string(),
                name: "contents".to_string(),
                title: None,
                description: None,
                mime_type: Some("text/plain".to_string()),
            },
            Arc::clone(&issues),
            Arc::new(|_req| Box::pin(async { Ok(ResourceResult::default()) })),
        );
        Registry::builder()
            .tools(vec![tool("issue_read", &issues), tool("issue_write", &issues)])
            .prompts(vec![prompt])
            .resource_templates(vec![template])
            .aliases([("get_issue".to_string(), "issue_read".to_string())])
            .build()
    }

    #[test]
    fn initialize_sees_empty_catalog() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(methods::INITIALIZE, None);
        assert!(view.tools().is_empty());
        assert!(view.resource_templates().is_empty());
        assert!(view.prompts().is_empty());
    }

    #[test]
    fn unknown_method_sees_empty_catalog() {
        let reg = sample_registry();
        let view = reg.for_mcp_request("tools/delete", Some("issue_read"));
        assert!(view.tools().is_empty());
    }

    #[test]
    fn tools_list_keeps_only_tools() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(methods::TOOLS_LIST, None);
        assert_eq!(view.tools().len(), 2);
        assert!(view.prompts().is_empty());
        assert!(view.resource_templates().is_empty());
    }

    #[test]
    fn tools_call_narrows_to_named_tool() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(methods::TOOLS_CALL, Some("issue_write"));
        assert_eq!(view.tools().len(), 1);
        assert_eq!(view.tools()[0].name(), "issue_write");
    }

    #[test]
    fn tools_call_resolves_alias_when_no_exact_match() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(methods::TOOLS_CALL, Some("get_issue"));
        assert_eq!(view.tools().len(), 1);
        assert_eq!(view.tools()[0].name(), "issue_read");
    }

    #[test]
    fn exact_name_wins_over_alias() {
        let issues = Toolset::new("issues", "issues").into_arc();
        let reg = Registry::builder()
            .tools(vec![tool("get_issue", &issues), tool("issue_read", &issues)])
            .aliases([("get_issue".to_string(), "issue_read".to_string())])
            .build();
        let matched = reg.filter_tools_by_name("get_issue");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name(), "get_issue");
    }

    #[test]
    fn resources_read_matches_template_verbatim() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(
            methods::RESOURCES_READ,
            Some("repo://{owner}/{repo}/contents{/path*}"),
        );
        assert_eq!(view.resource_templates().len(), 1);

        // A concrete URI does not match the template string.
        let view = reg.for_mcp_request(methods::RESOURCES_READ, Some("repo://octo/repo/contents"));
        assert!(view.resource_templates().is_empty());
    }

    #[test]
    fn prompts_get_narrows_by_name() {
        let reg = sample_registry();
        let view = reg.for_mcp_request(methods::PROMPTS_GET, Some("triage"));
        assert_eq!(view.prompts().len(), 1);
        let view = reg.for_mcp_request(methods::PROMPTS_GET, Some("missing"));
        assert!(view.prompts().is_empty());
    }

    #[test]
    fn narrowing_is_idempotent() {
        let reg = sample_registry();
        let once = reg.for_mcp_request(methods::TOOLS_CALL, Some("issue_read"));
        let twice = once.for_mcp_request(methods::TOOLS_CALL, Some("issue_read"));
        let names = |r: &Registry| {
            r.tools().iter().map(|t| t.spec.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn narrowing_leaves_source_untouched() {
        let reg = sample_registry();
        let _ = reg.for_mcp_request(methods::TOOLS_CALL, Some("issue_read"));
        assert_eq!(reg.tools().len(), 2);
        assert_eq!(reg.prompts().len(), 1);
    }

    #[test]
    fn filter_pipeline_applies_on_top_of_narrowed_view() {
        let issues = Toolset::new("issues", "issues").into_arc();
        let reg = Registry::builder()
            .tools(vec![
                tool("logs", &issues).with_flag_enable("new"),
                tool("logs", &issues).with_flag_disable("new"),
            ])
            .toolsets(Some(vec!["all".to_string()]))
            .flag_resolver(|_ctx, _flag| Ok(true))
            .build();

        let view = reg.for_mcp_request(methods::TOOLS_CALL, Some("logs"));
        // Narrower keeps both variants.
        assert_eq!(view.tools().len(), 2);
        // Filtering picks the enabled one.
        let available = view.available_tools(&RequestContext::new());
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].feature_flag_enable.as_deref(), Some("new"));
    }
}
