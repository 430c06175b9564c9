//! Request dispatch over narrowed registry views.
//!
//! The dispatcher is the recovery boundary: handler failures (including
//! panics) become error-results, never transport errors. Every text block
//! leaving a handler passes through the content sanitizer.

use futures::FutureExt;
use gh_tools_core::{
    JsonObject, PromptRequest, PromptResult, Registry, RegistryHandle, RequestContext,
    ResourceRequest, ResourceResult, ServerPrompt, ServerResourceTemplate, ServerTool,
    ToolContent, ToolError, ToolRequest, ToolResult, methods,
};
use gh_tools_github::ErrorBag;
use gh_tools_sanitize::sanitize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error};

pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Tools visible to this caller, canonical order.
    pub fn list_tools(&self, ctx: &RequestContext) -> Vec<ServerTool> {
        self.registry
            .for_mcp_request(methods::TOOLS_LIST, None)
            .available_tools(ctx)
    }

    pub fn list_resource_templates(&self, ctx: &RequestContext) -> Vec<ServerResourceTemplate> {
        self.registry
            .for_mcp_request(methods::RESOURCES_TEMPLATES_LIST, None)
            .available_resource_templates(ctx)
    }

    pub fn list_prompts(&self, ctx: &RequestContext) -> Vec<ServerPrompt> {
        self.registry
            .for_mcp_request(methods::PROMPTS_LIST, None)
            .available_prompts(ctx)
    }

    /// Resolve, narrow, filter and run one tool call.
    pub async fn call_tool(
        &self,
        ctx: &RequestContext,
        name: &str,
        arguments: JsonObject,
    ) -> ToolResult {
        let canonical = self.registry.resolve_alias(name);
        let view = self
            .registry
            .for_mcp_request(methods::TOOLS_CALL, Some(&canonical));
        let mut candidates = view.available_tools(ctx);

        let tool = match candidates.len() {
            0 => return ToolResult::error(format!("tool does not exist: {name}")),
            1 => candidates.remove(0),
            n => {
                // More than one flag variant survived filtering; the
                // configuration violated the variant exclusivity contract.
                error!(tool = name, variants = n, "ambiguous tool variant after filtering");
                return ToolResult::error(format!("ambiguous tool variant: {name}"));
            }
        };

        let bag = self.open_request(ctx);
        let request = ToolRequest {
            ctx: ctx.clone(),
            name: canonical,
            arguments,
        };
        let outcome = AssertUnwindSafe((tool.handler)(request)).catch_unwind().await;

        let result = match outcome {
            Err(_) => {
                error!(tool = %tool.spec.name, "tool handler panicked");
                ToolResult::error(format!("internal error running tool: {}", tool.spec.name))
            }
            Ok(Err(err)) => ToolResult::error(err.to_string()),
            Ok(Ok(result)) => result,
        };

        let (rest, graphql, raw) = bag.counts();
        if rest + graphql + raw > 0 {
            debug!(tool = %tool.spec.name, rest, graphql, raw, "github errors recorded during call");
        }

        sanitize_tool_result(result)
    }

    /// Resolve one resource read. Unknown URIs and handler failures map to
    /// protocol errors at the server boundary.
    pub async fn read_resource(
        &self,
        ctx: &RequestContext,
        uri: &str,
    ) -> Result<ResourceResult, ToolError> {
        let view = self.registry.for_mcp_request(methods::RESOURCES_READ, Some(uri));
        let mut matches = view.available_resource_templates(ctx);
        if matches.is_empty() {
            return Err(ToolError::not_found(format!("resource does not exist: {uri}")));
        }
        let template = matches.remove(0);

        self.open_request(ctx);
        let request = ResourceRequest {
            ctx: ctx.clone(),
            uri: uri.to_string(),
        };
        let mut result = (template.handler)(request).await?;
        for content in &mut result.contents {
            content.text = sanitize(&content.text);
        }
        Ok(result)
    }

    pub async fn get_prompt(
        &self,
        ctx: &RequestContext,
        name: &str,
        arguments: JsonObject,
    ) -> Result<PromptResult, ToolError> {
        let view = self.registry.for_mcp_request(methods::PROMPTS_GET, Some(name));
        let mut matches = view.available_prompts(ctx);
        if matches.is_empty() {
            return Err(ToolError::not_found(format!("prompt does not exist: {name}")));
        }
        let prompt = matches.remove(0);

        self.open_request(ctx);
        let request = PromptRequest {
            ctx: ctx.clone(),
            name: name.to_string(),
            arguments,
        };
        let mut result = (prompt.handler)(request).await?;
        for message in &mut result.messages {
            message.text = sanitize(&message.text);
        }
        Ok(result)
    }

    /// Attach the per-request state: a fresh error bag and a handle to the
    /// live registry for the dynamic toolset.
    fn open_request(&self, ctx: &RequestContext) -> Arc<ErrorBag> {
        ctx.insert(RegistryHandle(self.registry.clone()));
        ErrorBag::attach(ctx)
    }
}

fn sanitize_tool_result(mut result: ToolResult) -> ToolResult {
    for block in &mut result.content {
        match block {
            ToolContent::Text(text) => *text = sanitize(text),
        }
    }
    result
}
