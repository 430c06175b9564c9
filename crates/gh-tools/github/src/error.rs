//! Typed GitHub error taxonomy.
//!
//! Handlers classify upstream failures as REST, GraphQL or raw-HTTP errors,
//! record them in the request error bag, and surface a redacted message to
//! the caller via `ToolError`. Messages must stay safe to show to an agent:
//! no tokens, no internal URLs beyond the API resource path.

use gh_tools_core::ToolError;
use thiserror::Error;

/// A failed REST call.
#[derive(Debug, Clone, Error)]
#[error("GitHub REST {method} {resource} failed: {message}")]
pub struct RestError {
    pub method: String,
    /// API resource path, e.g. `/repos/{owner}/{repo}/issues`.
    pub resource: String,
    pub status: Option<u16>,
    pub message: String,
}

impl RestError {
    pub fn new(
        method: impl Into<String>,
        resource: impl Into<String>,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            method: method.into(),
            resource: resource.into(),
            status,
            message: message.into(),
        }
    }

    /// Summarize an octocrab failure. GitHub's own error body already comes
    /// redacted; transport errors are reduced to their display form.
    pub fn from_octocrab(
        method: impl Into<String>,
        resource: impl Into<String>,
        err: &octocrab::Error,
    ) -> Self {
        Self::new(method, resource, None, err.to_string())
    }
}

/// A failed GraphQL query.
#[derive(Debug, Clone, Error)]
#[error("GitHub GraphQL {query_name} failed: {message}")]
pub struct GraphQlError {
    pub query_name: String,
    pub message: String,
}

impl GraphQlError {
    pub fn new(query_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            message: message.into(),
        }
    }
}

/// A failed raw-HTTP call (log downloads, scope probe).
#[derive(Debug, Clone, Error)]
#[error("GitHub request to {url} failed: {message}")]
pub struct RawHttpError {
    pub url: String,
    pub status: Option<u16>,
    pub message: String,
}

impl RawHttpError {
    pub fn new(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    pub fn from_reqwest(url: impl Into<String>, err: &reqwest::Error) -> Self {
        Self::new(url, err.status().map(|s| s.as_u16()), err.to_string())
    }
}

/// Umbrella over the three taxonomy kinds.
#[derive(Debug, Clone, Error)]
pub enum GitHubError {
    #[error(transparent)]
    Rest(#[from] RestError),
    #[error(transparent)]
    GraphQl(#[from] GraphQlError),
    #[error(transparent)]
    Raw(#[from] RawHttpError),
}

impl From<GitHubError> for ToolError {
    fn from(err: GitHubError) -> Self {
        ToolError::external(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_resource() {
        let err = RestError::new("GET", "/repos/o/r/issues/1", Some(404), "Not Found");
        assert_eq!(
            err.to_string(),
            "GitHub REST GET /repos/o/r/issues/1 failed: Not Found"
        );
    }

    #[test]
    fn umbrella_preserves_inner_display() {
        let err: GitHubError = GraphQlError::new("collaborator_access", "denied").into();
        assert_eq!(
            err.to_string(),
            "GitHub GraphQL collaborator_access failed: denied"
        );
    }

    #[test]
    fn converts_to_external_tool_error() {
        let err: GitHubError = RawHttpError::new("https://api.github.com/", Some(502), "bad gateway").into();
        let tool_err: ToolError = err.into();
        assert!(matches!(tool_err, ToolError::External(_)));
    }
}
