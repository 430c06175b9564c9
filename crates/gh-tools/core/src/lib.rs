//! Core capability registry for the gh-tools family.
//!
//! This crate provides:
//! - [`Toolset`]: identity groups for catalog items, with default flags and
//!   instructions hooks
//! - Catalog entities ([`ServerTool`], [`ServerResourceTemplate`],
//!   [`ServerPrompt`]) with their filter gates and erased handlers
//! - [`Registry`]: the immutable configured catalog, its builder, the
//!   per-item filter pipeline and the per-request narrower
//! - Scope algebra ([`scopes`]) and weighted tool search ([`search`])
//! - [`RequestContext`]: request-scoped extension storage shared between the
//!   filter pipeline, handlers and dispatch

pub mod catalog;
pub mod context;
pub mod error;
pub mod filter;
pub mod narrow;
pub mod registry;
pub mod schema;
pub mod scopes;
pub mod search;
pub mod toolset;

pub use catalog::{
    JsonObject, PromptHandler, PromptMessage, PromptRequest, PromptResult, PromptRole,
    PromptSpec, ResourceContent, ResourceHandler, ResourceRequest, ResourceResult,
    ResourceTemplateSpec, ServerPrompt, ServerResourceTemplate, ServerTool, ToolAnnotations,
    ToolContent, ToolHandler, ToolRequest, ToolResult, ToolSpec,
};
pub use context::RequestContext;
pub use error::ToolError;
pub use narrow::methods;
pub use registry::{Registry, RegistryBuilder, RegistryHandle};
pub use toolset::Toolset;

// Re-export BoxFuture so handler implementations don't need a direct futures dep
pub use futures::future::BoxFuture;
