//! GitHub backend plumbing for the gh-tools family.
//!
//! This crate owns everything that touches the GitHub API surface without
//! being a tool itself:
//! - the typed error taxonomy ([`error`]) and the request [`bag`] handlers
//!   record into
//! - the [`lockdown`] cache deciding whether author-controlled content is
//!   safe to return
//! - the OAuth [`scopes`] fetcher (`X-OAuth-Scopes` HEAD probe)
//! - the ring-buffer [`logtail`] for GitHub Actions job logs
//! - [`token`] resolution and the shared handler [`deps`]

pub mod bag;
pub mod deps;
pub mod error;
pub mod lockdown;
pub mod logtail;
pub mod scopes;
pub mod token;

pub use bag::ErrorBag;
pub use deps::Deps;
pub use error::{GitHubError, GraphQlError, RawHttpError, RestError};
pub use lockdown::{AccessAnswer, LockdownCache, LockdownOptions, PushAccessSource};
pub use logtail::{LineTail, TailedLog};
pub use scopes::fetch_token_scopes;
pub use token::resolve_github_token;
