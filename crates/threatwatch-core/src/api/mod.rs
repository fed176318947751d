//! REST client for the threatwatch auth service.
//!
//! The service issues bearer tokens from `POST /auth/login`; `ApiClient`
//! implements [`AuthBackend`](crate::auth::AuthBackend) on top of it.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
