use async_trait::async_trait;
use serde::Serialize;

use super::error::AuthError;
use super::session::UserRecord;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Username and password required".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.username.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AuthError::InvalidInput(
                "Username, email and password required".to_string(),
            ));
        }
        if !self.email.contains('@') {
            return Err(AuthError::InvalidInput("Invalid email address".to_string()));
        }
        Ok(())
    }
}

/// What a successful credential exchange hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub token: String,
    pub user: Option<UserRecord>,
}

/// The remote side of authentication.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError>;

    async fn register(&self, registration: &Registration) -> Result<(), AuthError>;

    /// Resolve a stored token to its user; used to verify a rehydrated session.
    async fn current_user(&self, token: &str) -> Result<UserRecord, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_fields() {
        assert!(Credentials::new("u", "p").validate().is_ok());
        assert!(matches!(
            Credentials::new("", "p").validate(),
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            Credentials::new("u", "").validate(),
            Err(AuthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_registration_validation() {
        assert!(Registration::new("u", "u@example.com", "p").validate().is_ok());
        assert!(Registration::new("u", "", "p").validate().is_err());
        assert_eq!(
            Registration::new("u", "not-an-email", "p").validate(),
            Err(AuthError::InvalidInput("Invalid email address".to_string()))
        );
    }
}
