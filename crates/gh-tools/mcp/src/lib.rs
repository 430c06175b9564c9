//! MCP server integration for the gh-tools family.
//!
//! [`Dispatcher`] drives the registry (alias resolution, narrowing,
//! filtering, error capture, output sanitization); [`GitHubMcpServer`]
//! exposes it over rmcp.

mod dispatch;
mod server;
mod wire;

pub use dispatch::Dispatcher;
pub use server::GitHubMcpServer;

// Re-export rmcp types for convenience
pub use rmcp::transport::stdio;
pub use rmcp::{ServerHandler, service::ServiceExt};
