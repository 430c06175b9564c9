//! GitHub token resolution.

use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    /// No token in the environment and `gh` produced none.
    #[error("GitHub token not found in env or gh")]
    NotFound,

    /// `gh` exists but exited unsuccessfully.
    #[error("gh command failed: {0}")]
    CommandFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Resolve a GitHub token.
///
/// Resolution order:
/// 1. `GITHUB_TOKEN` environment variable
/// 2. `GH_TOKEN` environment variable
/// 3. `gh auth token` command output
pub fn resolve_github_token() -> Result<String, TokenError> {
    for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
        if let Ok(value) = std::env::var(var)
            && !value.trim().is_empty()
        {
            return Ok(value.trim().to_string());
        }
    }

    let output = Command::new("gh").args(["auth", "token"]).output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(TokenError::CommandFailed(stderr));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        Err(TokenError::NotFound)
    } else {
        Ok(token)
    }
}
