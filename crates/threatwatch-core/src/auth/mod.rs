//! Authentication module: the session state machine and its persistence.
//!
//! This module provides:
//! - `SessionManager`: owns the session; `initialize`, `login`, `logout`, `register`
//! - `CredentialStore`: durable token + user record on top of a `Storage` backend
//! - `AuthBackend`: the remote credential exchange, implemented by `api::ApiClient`
//!
//! The session is published through a watch channel so route guards react
//! to every change without being rebuilt.

pub mod backend;
pub mod credentials;
pub mod error;
pub mod manager;
pub mod session;
pub mod storage;

pub use backend::{AuthBackend, Credentials, LoginGrant, Registration};
pub use credentials::CredentialStore;
pub use error::{AuthError, StoreError};
pub use manager::{SessionManager, SessionSettings, DEV_TOKEN};
pub use session::{AuthPhase, AuthSnapshot, Session, UserRecord, DEFAULT_DEV_USERNAME};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage};
