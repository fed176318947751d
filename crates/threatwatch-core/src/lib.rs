//! Core library for threatwatch: the dashboard session and what gates on it.
//!
//! - [`auth`]: session manager, credential store and storage backends
//! - [`api`]: HTTP client for the auth service
//! - [`guard`] and [`router`]: protected-route gating and the route table
//! - [`notify`] and [`navigate`]: the UI collaborators the session manager drives
//! - [`config`]: persisted settings and environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;
pub mod navigate;
pub mod notify;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use api::ApiClient;
pub use auth::{
    AuthError, AuthPhase, AuthSnapshot, CredentialStore, Credentials, Registration, Session,
    SessionManager, SessionSettings, UserRecord,
};
pub use config::{AuthMode, Config, StorageBackend};
pub use guard::{Access, GuardDecision, RouteGuard};
pub use navigate::{Navigator, Routes};
pub use notify::{NotificationSink, Severity, TracingNotifier};
pub use router::{Page, Resolution, Router};
