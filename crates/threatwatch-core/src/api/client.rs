//! HTTP client for the threatwatch auth service.
//!
//! This module provides the `ApiClient` struct, the production
//! [`AuthBackend`]: login and registration requests plus the current-user
//! lookup used to verify a stored token.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::{AuthBackend, AuthError, Credentials, LoginGrant, Registration, UserRecord};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_REJECTED: &str = "Invalid credentials";
const REGISTER_REJECTED: &str = "Registration failed";
const SESSION_REJECTED: &str = "Session is no longer valid";

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(flatten)]
    profile: Map<String, Value>,
}

/// API client for the auth service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://host/api`)
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn post_login(&self, credentials: &Credentials) -> Result<LoginGrant, ApiError> {
        let url = self.url("/auth/login");
        debug!(%url, username = %credentials.username, "Sending login request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let auth: LoginResponse = response.json().await?;

        let mut profile = auth.profile;
        profile
            .entry("username")
            .or_insert_with(|| Value::String(credentials.username.clone()));
        let user = match serde_json::from_value::<UserRecord>(Value::Object(profile)) {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "Login response carried no usable profile");
                None
            }
        };

        Ok(LoginGrant {
            token: auth.token,
            user,
        })
    }

    async fn post_register(&self, registration: &Registration) -> Result<(), ApiError> {
        let url = self.url("/auth/register");
        debug!(%url, username = %registration.username, "Sending registration request");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(registration)
            .send()
            .await?;
        Self::check_response(response).await?;
        Ok(())
    }

    async fn get_current_user(&self, token: &str) -> Result<UserRecord, ApiError> {
        let url = self.url("/auth/me");
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl AuthBackend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
        self.post_login(credentials)
            .await
            .map_err(|e| e.into_auth_error(LOGIN_REJECTED))
    }

    async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        self.post_register(registration)
            .await
            .map_err(|e| e.into_auth_error(REGISTER_REJECTED))
    }

    async fn current_user(&self, token: &str) -> Result<UserRecord, AuthError> {
        self.get_current_user(token)
            .await
            .map_err(|e| e.into_auth_error(SESSION_REJECTED))
    }
}
