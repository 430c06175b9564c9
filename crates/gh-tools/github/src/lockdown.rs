//! Lockdown: decide whether author-controlled content is safe to return.
//!
//! Content written by a GitHub user is only handed to the agent when the
//! author demonstrably controls the repository (push access), the repo is
//! private, or the author is the authenticated viewer. Answers are cached
//! per `(owner, repo)` with a TTL so one conversation does not hammer the
//! GraphQL API with identical authorization queries.

use crate::error::GraphQlError;
use async_trait::async_trait;
use gh_tools_core::RequestContext;
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// Cache entries live this long by default.
pub const DEFAULT_TTL: Duration = Duration::from_secs(20 * 60);

/// Bot authors whose content is always trusted.
const TRUSTED_BOTS: &[&str] = &["copilot"];

/// Collaborator permissions that count as push access.
const PUSH_PERMISSIONS: &[&str] = &["WRITE", "ADMIN", "MAINTAIN"];

/// Answer from one `(owner, repo, user)` authorization query.
#[derive(Debug, Clone)]
pub struct AccessAnswer {
    pub is_private: bool,
    /// Login of the authenticated viewer.
    pub viewer_login: String,
    /// The queried user's repository permission, if they are a collaborator.
    pub permission: Option<String>,
}

/// Seam for the GraphQL authorization query, mockable in tests.
#[async_trait]
pub trait PushAccessSource: Send + Sync {
    async fn collaborator_access(
        &self,
        ctx: &RequestContext,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<AccessAnswer, GraphQlError>;
}

#[derive(Debug)]
struct Entry {
    is_private: bool,
    viewer_login: String,
    known_users: HashMap<String, bool>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= Instant::now())
    }
}

/// Options accepted at cache construction.
#[derive(Debug, Clone)]
pub struct LockdownOptions {
    /// `None` disables expiry.
    pub ttl: Option<Duration>,
    /// Instance name, for log lines and test isolation.
    pub name: String,
}

impl Default for LockdownOptions {
    fn default() -> Self {
        Self {
            ttl: Some(DEFAULT_TTL),
            name: "default".to_string(),
        }
    }
}

/// Process-wide cache of push-access answers.
///
/// One internal async mutex serializes lookups and fills; lockdown checks
/// are rare next to handler-level API calls, and a fill costs one GraphQL
/// round-trip either way.
pub struct LockdownCache {
    name: String,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<(String, String), Entry>>,
}

impl LockdownCache {
    pub fn new(options: LockdownOptions) -> Self {
        Self {
            name: options.name,
            ttl: options.ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether content authored by `user` in `owner/repo` is safe to show.
    ///
    /// Query failures propagate; the caller must treat the content as
    /// unsafe and redact or fail.
    pub async fn is_safe_content(
        &self,
        ctx: &RequestContext,
        source: &dyn PushAccessSource,
        user: &str,
        owner: &str,
        repo: &str,
    ) -> Result<bool, GraphQlError> {
        let user_key = user.to_lowercase();
        if TRUSTED_BOTS.contains(&user_key.as_str()) {
            return Ok(true);
        }

        let key = (owner.to_lowercase(), repo.to_lowercase());
        let mut entries = self.entries.lock().await;

        let usable = entries.get(&key).is_some_and(|e| !e.expired());
        if !usable {
            let answer = source.collaborator_access(ctx, owner, repo, &user_key).await?;
            debug!(cache = %self.name, owner, repo, user = %user_key, "lockdown cache fill");
            let mut known_users = HashMap::new();
            known_users.insert(user_key.clone(), has_push(answer.permission.as_deref()));
            entries.insert(
                key.clone(),
                Entry {
                    is_private: answer.is_private,
                    viewer_login: answer.viewer_login.to_lowercase(),
                    known_users,
                    expires_at: self.deadline(),
                },
            );
        } else if !entries
            .get(&key)
            .is_some_and(|e| e.known_users.contains_key(&user_key))
        {
            // Same repo, new user: splice the answer into the live entry.
            let answer = source.collaborator_access(ctx, owner, repo, &user_key).await?;
            debug!(cache = %self.name, owner, repo, user = %user_key, "lockdown cache splice");
            if let Some(entry) = entries.get_mut(&key) {
                entry
                    .known_users
                    .insert(user_key.clone(), has_push(answer.permission.as_deref()));
                entry.is_private = answer.is_private;
                entry.viewer_login = answer.viewer_login.to_lowercase();
                entry.expires_at = self.deadline();
            }
        }

        let Some(entry) = entries.get(&key) else {
            return Ok(false);
        };
        Ok(entry.is_private
            || entry.viewer_login == user_key
            || entry.known_users.get(&user_key).copied().unwrap_or(false))
    }

    fn deadline(&self) -> Option<Instant> {
        self.ttl.map(|ttl| Instant::now() + ttl)
    }
}

fn has_push(permission: Option<&str>) -> bool {
    permission.is_some_and(|p| PUSH_PERMISSIONS.contains(&p))
}

/// The process-wide default instance. Tests construct named instances
/// instead.
pub fn default_cache() -> &'static LockdownCache {
    static DEFAULT: OnceLock<LockdownCache> = OnceLock::new();
    DEFAULT.get_or_init(|| LockdownCache::new(LockdownOptions::default()))
}
