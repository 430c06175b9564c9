//! Shared dependencies captured by tool handlers at catalog build time.

use crate::error::GraphQlError;
use crate::lockdown::{AccessAnswer, LockdownCache, PushAccessSource};
use async_trait::async_trait;
use gh_tools_core::RequestContext;
use octocrab::Octocrab;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_HOST: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum DepsError {
    #[error("failed to create GitHub client: {0}")]
    GitHubClient(String),

    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Everything a handler needs to talk to GitHub.
pub struct Deps {
    /// REST and GraphQL client.
    pub rest: Octocrab,
    /// Raw HTTP client for log downloads and the scope probe.
    pub http: reqwest::Client,
    /// API base, `https://api.github.com` unless overridden.
    pub host: String,
    pub token: Option<String>,
    /// Present when content lockdown is enabled.
    pub lockdown: Option<Arc<LockdownCache>>,
}

impl Deps {
    pub fn new(
        host: impl Into<String>,
        token: Option<String>,
        lockdown: Option<Arc<LockdownCache>>,
    ) -> Result<Self, DepsError> {
        let host = host.into();
        let mut builder = Octocrab::builder()
            .set_connect_timeout(Some(Duration::from_secs(10)))
            .set_read_timeout(Some(Duration::from_secs(30)))
            .set_write_timeout(Some(Duration::from_secs(30)));

        if host != DEFAULT_API_HOST {
            builder = builder
                .base_uri(host.clone())
                .map_err(|e| DepsError::GitHubClient(format!("{e:?}")))?;
        }
        if let Some(token) = token.clone() {
            builder = builder.personal_token(token);
        }
        let rest = builder
            .build()
            .map_err(|e| DepsError::GitHubClient(format!("{e:?}")))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("gh-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            rest,
            http,
            host,
            token,
            lockdown,
        })
    }
}

const COLLABORATOR_ACCESS_QUERY: &str = r"
    query($owner: String!, $name: String!, $user: String!) {
        viewer { login }
        repository(owner: $owner, name: $name) {
            isPrivate
            collaborators(query: $user, first: 1) {
                edges {
                    permission
                    node { login }
                }
            }
        }
    }
";

#[derive(Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlMessage>>,
}

#[derive(Deserialize)]
struct GraphQlMessage {
    message: String,
}

#[derive(Deserialize)]
struct AccessData {
    viewer: Viewer,
    repository: Option<RepoNode>,
}

#[derive(Deserialize)]
struct Viewer {
    login: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoNode {
    is_private: bool,
    collaborators: Option<Collaborators>,
}

#[derive(Deserialize)]
struct Collaborators {
    edges: Option<Vec<CollaboratorEdge>>,
}

#[derive(Deserialize)]
struct CollaboratorEdge {
    permission: Option<String>,
    node: Option<CollaboratorNode>,
}

#[derive(Deserialize)]
struct CollaboratorNode {
    login: String,
}

#[async_trait]
impl PushAccessSource for Deps {
    async fn collaborator_access(
        &self,
        _ctx: &RequestContext,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<AccessAnswer, GraphQlError> {
        let payload = serde_json::json!({
            "query": COLLABORATOR_ACCESS_QUERY,
            "variables": { "owner": owner, "name": repo, "user": user },
        });

        let response: GraphQlEnvelope<AccessData> = self
            .rest
            .graphql(&payload)
            .await
            .map_err(|e| GraphQlError::new("collaborator_access", e.to_string()))?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            let joined = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(GraphQlError::new("collaborator_access", joined));
        }

        let data = response
            .data
            .ok_or_else(|| GraphQlError::new("collaborator_access", "no data in response"))?;
        let repository = data
            .repository
            .ok_or_else(|| GraphQlError::new("collaborator_access", "repository not found"))?;

        // The collaborator search is a prefix query; only an exact login
        // match counts.
        let permission = repository
            .collaborators
            .and_then(|c| c.edges)
            .unwrap_or_default()
            .into_iter()
            .find(|edge| {
                edge.node
                    .as_ref()
                    .is_some_and(|n| n.login.eq_ignore_ascii_case(user))
            })
            .and_then(|edge| edge.permission);

        Ok(AccessAnswer {
            is_private: repository.is_private,
            viewer_login: data.viewer.login,
            permission,
        })
    }
}
