//! Immutable catalog entities: tools, resource templates and prompts.
//!
//! Every item carries its MCP-visible descriptor, the owning toolset, its
//! filter gates and an erased handler. Items are cheap to clone: handlers
//! and toolsets live behind `Arc`s, so narrowed registry views can copy
//! records without duplicating behavior.

use crate::context::RequestContext;
use crate::error::ToolError;
use crate::scopes;
use crate::toolset::Toolset;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// JSON object used for tool and prompt arguments.
pub type JsonObject = Map<String, Value>;

/// The subset of MCP tool annotations the registry relies on.
///
/// `read_only_hint` is load-bearing: the read-only filter consults this flag
/// and nothing else.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolAnnotations {
    pub title: Option<String>,
    pub read_only_hint: Option<bool>,
    pub destructive_hint: Option<bool>,
    pub idempotent_hint: Option<bool>,
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    /// Annotations for a tool that only reads GitHub state.
    pub fn read_only() -> Self {
        Self {
            read_only_hint: Some(true),
            ..Self::default()
        }
    }

    /// Annotations for a tool that mutates GitHub state.
    pub fn write() -> Self {
        Self {
            read_only_hint: Some(false),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// MCP-visible tool descriptor.
#[derive(Clone, Debug)]
pub struct ToolSpec {
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    /// JSON Schema object for the tool input.
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

/// One content block of a tool result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToolContent {
    Text(String),
}

/// Structured result returned by tool handlers.
#[derive(Clone, Debug, Default)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    pub structured: Option<Value>,
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(text.into())],
            structured: None,
            is_error: false,
        }
    }

    /// A result carrying both a pretty-printed text block and the structured
    /// value.
    pub fn json(value: Value) -> Self {
        let text = serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| "null".to_string());
        Self {
            content: vec![ToolContent::Text(text)],
            structured: Some(value),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text(message.into())],
            structured: None,
            is_error: true,
        }
    }
}

/// Request handed to a tool handler.
#[derive(Clone, Debug)]
pub struct ToolRequest {
    pub ctx: RequestContext,
    /// Canonical tool name (aliases already resolved).
    pub name: String,
    pub arguments: JsonObject,
}

impl ToolRequest {
    /// Deserialize the call arguments into a typed input struct.
    pub fn parse_args<T: DeserializeOwned>(&self) -> Result<T, ToolError> {
        serde_json::from_value(Value::Object(self.arguments.clone()))
            .map_err(|e| ToolError::invalid_input(e.to_string()))
    }
}

/// Erased tool handler. Dependencies are captured by the closure when the
/// catalog is built; request-scoped values travel in the context.
pub type ToolHandler =
    Arc<dyn Fn(ToolRequest) -> BoxFuture<'static, Result<ToolResult, ToolError>> + Send + Sync>;

/// Optional per-item availability predicate with access to the request
/// context. Errors count as "not enabled".
pub type EnabledPredicate =
    Arc<dyn Fn(&RequestContext) -> Result<bool, ToolError> + Send + Sync>;

/// A tool record in the catalog.
#[derive(Clone)]
pub struct ServerTool {
    pub spec: ToolSpec,
    pub toolset: Arc<Toolset>,
    /// Minimum scopes a caller must own to invoke the tool.
    pub required_scopes: Vec<String>,
    /// `required_scopes` plus every ancestor that transitively grants them.
    pub accepted_scopes: Vec<String>,
    pub feature_flag_enable: Option<String>,
    pub feature_flag_disable: Option<String>,
    pub enabled: Option<EnabledPredicate>,
    pub handler: ToolHandler,
}

impl ServerTool {
    pub fn new(spec: ToolSpec, toolset: Arc<Toolset>, handler: ToolHandler) -> Self {
        Self {
            spec,
            toolset,
            required_scopes: Vec::new(),
            accepted_scopes: Vec::new(),
            feature_flag_enable: None,
            feature_flag_disable: None,
            enabled: None,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// A tool is read-only iff its annotations say so.
    pub fn is_read_only(&self) -> bool {
        self.spec.annotations.read_only_hint == Some(true)
    }

    /// Set the required scopes; the accepted set is derived immediately.
    pub fn with_required_scopes<S: AsRef<str>>(mut self, required: &[S]) -> Self {
        self.required_scopes = required.iter().map(|s| s.as_ref().to_string()).collect();
        self.accepted_scopes = scopes::expand_scopes(&self.required_scopes);
        self
    }

    /// Show the tool only when this feature flag resolves true.
    pub fn with_flag_enable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_enable = Some(flag.into());
        self
    }

    /// Hide the tool when this feature flag resolves true.
    pub fn with_flag_disable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_disable = Some(flag.into());
        self
    }

    /// Attach a per-item availability predicate.
    pub fn with_enabled<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<bool, ToolError> + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(predicate));
        self
    }
}

impl fmt::Debug for ServerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTool")
            .field("name", &self.spec.name)
            .field("toolset", &self.toolset.id)
            .field("read_only", &self.is_read_only())
            .field("required_scopes", &self.required_scopes)
            .field("feature_flag_enable", &self.feature_flag_enable)
            .field("feature_flag_disable", &self.feature_flag_disable)
            .finish()
    }
}

/// MCP-visible resource template descriptor.
#[derive(Clone, Debug)]
pub struct ResourceTemplateSpec {
    pub uri_template: String,
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub mime_type: Option<String>,
}

/// One resolved resource content block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: Option<String>,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct ResourceResult {
    pub contents: Vec<ResourceContent>,
}

#[derive(Clone, Debug)]
pub struct ResourceRequest {
    pub ctx: RequestContext,
    pub uri: String,
}

pub type ResourceHandler = Arc<
    dyn Fn(ResourceRequest) -> BoxFuture<'static, Result<ResourceResult, ToolError>>
        + Send
        + Sync,
>;

/// A resource template record in the catalog.
///
/// Resources have no read-only notion and no per-item predicate; only the
/// feature-flag gates and the toolset gate apply.
#[derive(Clone)]
pub struct ServerResourceTemplate {
    pub spec: ResourceTemplateSpec,
    pub toolset: Arc<Toolset>,
    pub feature_flag_enable: Option<String>,
    pub feature_flag_disable: Option<String>,
    pub handler: ResourceHandler,
}

impl ServerResourceTemplate {
    pub fn new(spec: ResourceTemplateSpec, toolset: Arc<Toolset>, handler: ResourceHandler) -> Self {
        Self {
            spec,
            toolset,
            feature_flag_enable: None,
            feature_flag_disable: None,
            handler,
        }
    }

    pub fn uri_template(&self) -> &str {
        &self.spec.uri_template
    }

    pub fn with_flag_enable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_enable = Some(flag.into());
        self
    }

    pub fn with_flag_disable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_disable = Some(flag.into());
        self
    }
}

impl fmt::Debug for ServerResourceTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerResourceTemplate")
            .field("uri_template", &self.spec.uri_template)
            .field("toolset", &self.toolset.id)
            .finish()
    }
}

/// Argument descriptor for a prompt.
#[derive(Clone, Debug)]
pub struct PromptArgumentSpec {
    pub name: String,
    pub description: Option<String>,
    pub required: bool,
}

/// MCP-visible prompt descriptor.
#[derive(Clone, Debug)]
pub struct PromptSpec {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub arguments: Vec<PromptArgumentSpec>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptRole {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub text: String,
}

#[derive(Clone, Debug, Default)]
pub struct PromptResult {
    pub description: Option<String>,
    pub messages: Vec<PromptMessage>,
}

#[derive(Clone, Debug)]
pub struct PromptRequest {
    pub ctx: RequestContext,
    pub name: String,
    pub arguments: JsonObject,
}

pub type PromptHandler = Arc<
    dyn Fn(PromptRequest) -> BoxFuture<'static, Result<PromptResult, ToolError>> + Send + Sync,
>;

/// A prompt record in the catalog. Gated like resources: feature flags and
/// toolset membership only.
#[derive(Clone)]
pub struct ServerPrompt {
    pub spec: PromptSpec,
    pub toolset: Arc<Toolset>,
    pub feature_flag_enable: Option<String>,
    pub feature_flag_disable: Option<String>,
    pub handler: PromptHandler,
}

impl ServerPrompt {
    pub fn new(spec: PromptSpec, toolset: Arc<Toolset>, handler: PromptHandler) -> Self {
        Self {
            spec,
            toolset,
            feature_flag_enable: None,
            feature_flag_disable: None,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn with_flag_enable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_enable = Some(flag.into());
        self
    }

    pub fn with_flag_disable(mut self, flag: impl Into<String>) -> Self {
        self.feature_flag_disable = Some(flag.into());
        self
    }
}

impl fmt::Debug for ServerPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerPrompt")
            .field("name", &self.spec.name)
            .field("toolset", &self.toolset.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_handler() -> ToolHandler {
        Arc::new(|_req| Box::pin(async { Ok(ToolResult::text("ok")) }))
    }

    fn spec(name: &str) -> ToolSpec {
        ToolSpec {
            name: name.to_string(),
            title: None,
            description: "test tool".to_string(),
            input_schema: serde_json::json!({"type": "object"}),
            annotations: ToolAnnotations::read_only(),
        }
    }

    #[test]
    fn accepted_scopes_derived_from_required() {
        let ts = Toolset::new("ts", "test").into_arc();
        let tool = ServerTool::new(spec("t"), ts, noop_handler())
            .with_required_scopes(&["public_repo"]);
        assert_eq!(tool.required_scopes, vec!["public_repo"]);
        assert_eq!(tool.accepted_scopes, vec!["public_repo", "repo"]);
    }

    #[test]
    fn read_only_follows_annotations_only() {
        let ts = Toolset::new("ts", "test").into_arc();
        let ro = ServerTool::new(spec("ro"), Arc::clone(&ts), noop_handler());
        assert!(ro.is_read_only());

        let mut wr_spec = spec("wr");
        wr_spec.annotations = ToolAnnotations::write();
        let wr = ServerTool::new(wr_spec, Arc::clone(&ts), noop_handler());
        assert!(!wr.is_read_only());

        let mut none_spec = spec("none");
        none_spec.annotations = ToolAnnotations::default();
        let none = ServerTool::new(none_spec, ts, noop_handler());
        assert!(!none.is_read_only());
    }

    #[test]
    fn parse_args_reports_bad_input() {
        #[derive(serde::Deserialize)]
        struct Input {
            #[expect(dead_code)]
            count: u32,
        }

        let mut args = JsonObject::new();
        args.insert("count".to_string(), serde_json::json!("not a number"));
        let req = ToolRequest {
            ctx: RequestContext::new(),
            name: "t".to_string(),
            arguments: args,
        };
        assert!(matches!(
            req.parse_args::<Input>(),
            Err(ToolError::InvalidInput(_))
        ));
    }

    #[test]
    fn json_result_carries_text_and_structured() {
        let res = ToolResult::json(serde_json::json!({"a": 1}));
        assert!(!res.is_error);
        assert!(res.structured.is_some());
        match &res.content[0] {
            ToolContent::Text(t) => assert!(t.contains("\"a\": 1")),
        }
    }
}
