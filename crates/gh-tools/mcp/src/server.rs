//! rmcp server handler backed by the registry dispatcher.

use crate::dispatch::Dispatcher;
use crate::wire;
use gh_tools_core::{Registry, RequestContext};
use rmcp::model as m;
use rmcp::service::RequestContext as McpContext;
use rmcp::{RoleServer, ServerHandler};

/// Env var suppressing the instructions-producing hooks (baseline mode).
const DISABLE_INSTRUCTIONS_ENV: &str = "DISABLE_INSTRUCTIONS";

/// MCP server handler exposing the GitHub catalog.
pub struct GitHubMcpServer {
    dispatcher: Dispatcher,
    name: String,
    version: String,
}

impl GitHubMcpServer {
    pub fn new(registry: Registry) -> Self {
        Self {
            dispatcher: Dispatcher::new(registry),
            name: "gh-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Set the server name and version.
    pub fn with_info(mut self, name: &str, version: &str) -> Self {
        self.name = name.to_string();
        self.version = version.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn instructions(&self) -> Option<String> {
        if std::env::var(DISABLE_INSTRUCTIONS_ENV).is_ok_and(|v| v == "true") {
            return None;
        }
        self.dispatcher.registry().instructions()
    }
}

// Allow manual_async_fn because the trait signature uses `impl Future` return types
#[allow(clippy::manual_async_fn)]
impl ServerHandler for GitHubMcpServer {
    fn initialize(
        &self,
        _params: m::InitializeRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::InitializeResult, m::ErrorData>> + Send + '_
    {
        async move {
            Ok(m::InitializeResult {
                server_info: m::Implementation {
                    name: self.name.clone(),
                    title: self.name.clone().into(),
                    version: self.version.clone(),
                    website_url: None,
                    icons: None,
                },
                capabilities: m::ServerCapabilities::builder()
                    .enable_tools()
                    .enable_prompts()
                    .enable_resources()
                    .build(),
                instructions: self.instructions(),
                ..Default::default()
            })
        }
    }

    fn list_tools(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListToolsResult, m::ErrorData>> + Send + '_
    {
        async move {
            let ctx = RequestContext::new();
            let tools = self
                .dispatcher
                .list_tools(&ctx)
                .iter()
                .map(|tool| wire::tool_to_wire(&tool.spec))
                .collect();
            Ok(m::ListToolsResult {
                tools,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn call_tool(
        &self,
        req: m::CallToolRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CallToolResult, m::ErrorData>> + Send + '_
    {
        async move {
            let ctx = RequestContext::new();
            let arguments = req.arguments.unwrap_or_default();
            let result = self.dispatcher.call_tool(&ctx, &req.name, arguments).await;
            Ok(wire::tool_result_to_wire(result))
        }
    }

    fn list_prompts(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListPromptsResult, m::ErrorData>> + Send + '_
    {
        async move {
            let ctx = RequestContext::new();
            let prompts = self
                .dispatcher
                .list_prompts(&ctx)
                .iter()
                .map(|prompt| wire::prompt_to_wire(&prompt.spec))
                .collect();
            Ok(m::ListPromptsResult {
                prompts,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn get_prompt(
        &self,
        req: m::GetPromptRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::GetPromptResult, m::ErrorData>> + Send + '_
    {
        async move {
            let ctx = RequestContext::new();
            let arguments = req
                .arguments
                .map(|map| map.into_iter().collect())
                .unwrap_or_default();
            match self.dispatcher.get_prompt(&ctx, &req.name, arguments).await {
                Ok(result) => Ok(wire::prompt_result_to_wire(result)),
                Err(err) => Err(m::ErrorData::invalid_request(err.to_string(), None)),
            }
        }
    }

    fn list_resources(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListResourcesResult, m::ErrorData>> + Send + '_
    {
        async move {
            // The catalog defines templates only; concrete resources are
            // addressed through them.
            Ok(m::ListResourcesResult {
                resources: vec![],
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn list_resource_templates(
        &self,
        _req: Option<m::PaginatedRequestParam>,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ListResourceTemplatesResult, m::ErrorData>>
    + Send
    + '_ {
        async move {
            let ctx = RequestContext::new();
            let resource_templates = self
                .dispatcher
                .list_resource_templates(&ctx)
                .iter()
                .map(|template| wire::resource_template_to_wire(&template.spec))
                .collect();
            Ok(m::ListResourceTemplatesResult {
                resource_templates,
                next_cursor: None,
                meta: None,
            })
        }
    }

    fn read_resource(
        &self,
        req: m::ReadResourceRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::ReadResourceResult, m::ErrorData>> + Send + '_
    {
        async move {
            let ctx = RequestContext::new();
            match self.dispatcher.read_resource(&ctx, &req.uri).await {
                Ok(result) => Ok(wire::resource_result_to_wire(result)),
                Err(err) => Err(m::ErrorData::invalid_request(err.to_string(), None)),
            }
        }
    }

    fn ping(
        &self,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async { Ok(()) }
    }

    fn complete(
        &self,
        _req: m::CompleteRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<m::CompleteResult, m::ErrorData>> + Send + '_
    {
        async {
            Err(m::ErrorData::invalid_request(
                "Method not implemented",
                None,
            ))
        }
    }

    fn set_level(
        &self,
        _req: m::SetLevelRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async { Ok(()) }
    }

    fn subscribe(
        &self,
        _req: m::SubscribeRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async {
            Err(m::ErrorData::invalid_request(
                "Method not implemented",
                None,
            ))
        }
    }

    fn unsubscribe(
        &self,
        _req: m::UnsubscribeRequestParam,
        _ctx: McpContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), m::ErrorData>> + Send + '_ {
        async {
            Err(m::ErrorData::invalid_request(
                "Method not implemented",
                None,
            ))
        }
    }
}
