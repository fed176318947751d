use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Username given to sessions fabricated in bypass mode when no user
/// record was stored alongside the token.
pub const DEFAULT_DEV_USERNAME: &str = "dev-user";

/// Cached profile of the logged-in user.
///
/// Only `username` is required; whatever else the auth service returns is
/// kept in `extra` so it round-trips through the credential store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl UserRecord {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            extra: BTreeMap::new(),
        }
    }

}

/// The authenticated identity held by the running application.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    token: String,
    user: Option<UserRecord>,
    established_at: DateTime<Utc>,
}

impl Session {
    /// Build a session around `token`, trimmed of surrounding whitespace.
    /// Returns `None` for an empty token: a session never exists without one.
    pub fn new(token: impl AsRef<str>, user: Option<UserRecord>) -> Option<Self> {
        let token = token.as_ref().trim();
        if token.is_empty() {
            return None;
        }
        Some(Self {
            token: token.to_string(),
            user,
            established_at: Utc::now(),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.established_at
    }

    /// Short human-readable session age for status lines.
    pub fn age_display(&self) -> String {
        let minutes = self.age().num_minutes();
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Coarse authentication state as seen by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Everything the session manager publishes to observers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthSnapshot {
    pub session: Option<Session>,
    /// Set once startup rehydration has finished, whatever its outcome.
    pub initialized: bool,
    /// Number of login/register calls currently awaiting the auth service.
    pub pending: usize,
}

impl AuthSnapshot {
    pub fn phase(&self) -> AuthPhase {
        if self.pending > 0 {
            AuthPhase::Authenticating
        } else if self.session.is_some() {
            AuthPhase::Authenticated
        } else {
            AuthPhase::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}
