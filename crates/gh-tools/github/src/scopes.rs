//! Discover the OAuth scopes granted to a token.
//!
//! GitHub reports classic-token scopes in the `X-OAuth-Scopes` response
//! header; a HEAD against the API root is enough to read it. Fine-grained
//! tokens omit the header entirely, which parses as an empty scope list.

use std::time::Duration;
use thiserror::Error;

pub const SCOPES_HEADER: &str = "X-OAuth-Scopes";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

/// Intrinsic timeout on the probe, on top of any client-level timeout.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ScopeFetchError {
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// HEAD the API root and parse the scopes header.
pub async fn fetch_token_scopes(
    http: &reqwest::Client,
    host: &str,
    token: &str,
) -> Result<Vec<String>, ScopeFetchError> {
    let url = format!("{}/", host.trim_end_matches('/'));
    let response = http
        .head(&url)
        .timeout(FETCH_TIMEOUT)
        .header(reqwest::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(reqwest::header::ACCEPT, "application/vnd.github+json")
        .header(API_VERSION_HEADER, API_VERSION)
        .send()
        .await?;

    match response.status().as_u16() {
        200 => {}
        401 => return Err(ScopeFetchError::InvalidToken),
        other => return Err(ScopeFetchError::UnexpectedStatus(other)),
    }

    let scopes = response
        .headers()
        .get(SCOPES_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Ok(scopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_comma_separated_scopes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .and(header("Accept", "application/vnd.github+json"))
            .respond_with(
                ResponseTemplate::new(200).insert_header(SCOPES_HEADER, "repo, read:org , gist"),
            )
            .mount(&server)
            .await;

        let scopes = fetch_token_scopes(&reqwest::Client::new(), &server.uri(), "tok")
            .await
            .expect("probe succeeds");
        assert_eq!(scopes, vec!["repo", "read:org", "gist"]);
    }

    #[tokio::test]
    async fn missing_header_means_no_scopes() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let scopes = fetch_token_scopes(&reqwest::Client::new(), &server.uri(), "tok")
            .await
            .expect("probe succeeds");
        assert!(scopes.is_empty());
    }

    #[tokio::test]
    async fn unauthorized_maps_to_invalid_token() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = fetch_token_scopes(&reqwest::Client::new(), &server.uri(), "bad")
            .await
            .expect_err("401 must fail");
        assert!(matches!(err, ScopeFetchError::InvalidToken));
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[tokio::test]
    async fn other_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = fetch_token_scopes(&reqwest::Client::new(), &server.uri(), "tok")
            .await
            .expect_err("503 must fail");
        assert_eq!(err.to_string(), "unexpected status code: 503");
    }

    #[tokio::test]
    async fn sends_bearer_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/"))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(200).insert_header(SCOPES_HEADER, "repo"))
            .mount(&server)
            .await;

        let scopes = fetch_token_scopes(&reqwest::Client::new(), &server.uri(), "secret-token")
            .await
            .expect("probe succeeds");
        assert_eq!(scopes, vec!["repo"]);
    }
}
