use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Request rejected: {0}")]
    BadRequest(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            400 | 404 | 409 | 422 => ApiError::BadRequest(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// Translate into the session-level error. `rejected` is the message the
    /// user sees when the service refused the request.
    pub fn into_auth_error(self, rejected: &str) -> AuthError {
        match self {
            ApiError::Unauthorized
            | ApiError::AccessDenied(_)
            | ApiError::BadRequest(_) => AuthError::Rejected(rejected.to_string()),
            ApiError::NetworkError(e) if e.is_decode() => AuthError::InvalidResponse(e.to_string()),
            ApiError::NetworkError(e) => AuthError::Unreachable(e.to_string()),
            ApiError::RateLimited => AuthError::Unreachable("rate limited".to_string()),
            ApiError::ServerError(body) => AuthError::Unreachable(format!("server error: {}", body)),
            ApiError::InvalidResponse(msg) => AuthError::InvalidResponse(msg),
        }
    }
}
