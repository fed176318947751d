use std::sync::Arc;

use tracing::warn;

use super::error::StoreError;
use super::session::UserRecord;
use super::storage::Storage;

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key for the serialized user record
pub const USER_KEY: &str = "user";

/// Durable mirror of the session: a token and an optional user record.
///
/// Reads never fail. Anything that cannot be read or parsed is reported at
/// warn level and treated as absent so a damaged store cannot block boot.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// The stored token, if any. An empty token counts as missing.
    pub fn read_token(&self) -> Option<String> {
        match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) if token.trim().is_empty() => None,
            Ok(Some(token)) => Some(token),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    /// The cached user record. Malformed JSON is treated as absent.
    pub fn read_user(&self) -> Option<UserRecord> {
        let raw = match self.storage.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user record");
                return None;
            }
        };
        match serde_json::from_str::<UserRecord>(&raw).map_err(StoreError::from) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Ignoring stored user record");
                None
            }
        }
    }

    /// Persist the token and, when given, the user record. Without a user
    /// record any previously stored one is removed so the two keys never
    /// describe different sessions.
    pub fn write(&self, token: &str, user: Option<&UserRecord>) -> Result<(), StoreError> {
        self.storage.set(TOKEN_KEY, token)?;
        match user {
            Some(user) => self.storage.set(USER_KEY, &serde_json::to_string(user)?),
            None => self.storage.remove(USER_KEY),
        }
    }

    /// Remove both keys. Both removals are attempted even if the first fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        let token = self.storage.remove(TOKEN_KEY);
        let user = self.storage.remove(USER_KEY);
        token.and(user)
    }
}
