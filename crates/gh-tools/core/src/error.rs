//! Error type shared by registry operations and tool handlers.

use thiserror::Error;

/// Error returned by catalog handlers and registry operations.
///
/// Handlers that talk to GitHub record the typed upstream error in the
/// request error bag and surface one of these with a redacted message; the
/// dispatcher turns it into an error-result, never a transport failure.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The caller supplied arguments the tool cannot use.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Something went wrong inside the server itself.
    #[error("internal error: {0}")]
    Internal(String),

    /// An upstream service (GitHub REST/GraphQL/raw HTTP) failed.
    #[error("external service error: {0}")]
    External(String),

    /// The caller is not allowed to perform the operation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// The named tool, prompt, resource or toolset does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ToolError {
    pub fn invalid_input<S: ToString>(s: S) -> Self {
        ToolError::InvalidInput(s.to_string())
    }

    pub fn internal<S: ToString>(s: S) -> Self {
        ToolError::Internal(s.to_string())
    }

    pub fn external<S: ToString>(s: S) -> Self {
        ToolError::External(s.to_string())
    }

    pub fn permission<S: ToString>(s: S) -> Self {
        ToolError::Permission(s.to_string())
    }

    pub fn not_found<S: ToString>(s: S) -> Self {
        ToolError::NotFound(s.to_string())
    }
}
