//! The session state machine.
//!
//! `SessionManager` is the single owner of the in-memory session and the
//! only writer of the [`CredentialStore`]. Observers read the published
//! [`AuthSnapshot`] through a watch channel.
//!
//! Every mutation runs under the epoch lock. `logout` and the start of each
//! `login` bump the epoch; an async call whose captured epoch no longer
//! matches at commit time is discarded, so a slow login can never resurrect
//! a session the user has already logged out of.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{AuthMode, Config};
use crate::guard::RouteGuard;
use crate::navigate::{Navigator, Routes};
use crate::notify::{NotificationSink, Severity};

use super::backend::{AuthBackend, Credentials, LoginGrant, Registration};
use super::credentials::CredentialStore;
use super::error::AuthError;
use super::session::{AuthSnapshot, Session, UserRecord, DEFAULT_DEV_USERNAME};

/// Token handed out by bypass-mode logins.
pub const DEV_TOKEN: &str = "dev-token-123";

const LOGIN_MESSAGE: &str = "Successfully logged in";
const DEV_LOGIN_MESSAGE: &str = "Development mode: Logged in successfully";
const LOGOUT_MESSAGE: &str = "Successfully logged out";
const REGISTER_MESSAGE: &str = "Registration successful! Please log in.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSettings {
    pub mode: AuthMode,
    pub routes: Routes,
    /// Confirm a rehydrated token with the auth service before trusting it.
    /// Only meaningful in remote mode.
    pub verify_on_startup: bool,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.auth_mode,
            routes: Routes::default(),
            verify_on_startup: config.verify_on_startup,
        }
    }
}

/// Outcome of reading the credential store at startup.
enum Rehydration {
    Restored(Session),
    /// The auth service refused the stored token.
    Revoked,
    Absent,
}

pub struct SessionManager {
    settings: SessionSettings,
    store: CredentialStore,
    backend: Arc<dyn AuthBackend>,
    notifier: Arc<dyn NotificationSink>,
    navigator: Arc<dyn Navigator>,
    epoch: Mutex<u64>,
    started: AtomicBool,
    state: watch::Sender<AuthSnapshot>,
}

impl SessionManager {
    pub fn new(
        settings: SessionSettings,
        store: CredentialStore,
        backend: Arc<dyn AuthBackend>,
        notifier: Arc<dyn NotificationSink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            settings,
            store,
            backend,
            notifier,
            navigator,
            epoch: Mutex::new(0),
            started: AtomicBool::new(false),
            state,
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// A route guard that redirects to the login entry when signed out.
    pub fn guard(&self) -> RouteGuard {
        RouteGuard::new(
            self.subscribe(),
            self.navigator.clone(),
            self.settings.routes.login.clone(),
        )
    }

    pub fn mode(&self) -> AuthMode {
        self.settings.mode
    }

    pub fn routes(&self) -> &Routes {
        &self.settings.routes
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Restore the session from the credential store. Runs once; later
    /// calls return immediately. Always marks the manager initialized.
    pub async fn initialize(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Session manager already initialized");
            return;
        }

        let epoch = *self.lock_epoch();
        let outcome = self.rehydrate().await;

        let current = self.lock_epoch();
        if *current != epoch {
            debug!("Session changed during startup, keeping newer state");
            self.state.send_modify(|s| s.initialized = true);
            return;
        }

        let session = match outcome {
            Rehydration::Restored(session) => {
                info!(username = ?session.username(), mode = ?self.settings.mode, "Session restored");
                Some(session)
            }
            Rehydration::Revoked => {
                if let Err(e) = self.store.clear() {
                    warn!(error = %e, "Failed to clear revoked credentials");
                }
                None
            }
            Rehydration::Absent => None,
        };
        self.state.send_modify(|s| {
            s.session = session;
            s.initialized = true;
        });
        drop(current);
    }

    async fn rehydrate(&self) -> Rehydration {
        let Some(token) = self.store.read_token() else {
            debug!("No stored token");
            return Rehydration::Absent;
        };

        let user = match self.settings.mode {
            AuthMode::Bypass => Some(
                self.store
                    .read_user()
                    .unwrap_or_else(|| UserRecord::new(DEFAULT_DEV_USERNAME)),
            ),
            AuthMode::Remote if !self.settings.verify_on_startup => None,
            AuthMode::Remote => match self.backend.current_user(&token).await {
                Ok(user) => Some(user),
                Err(AuthError::Rejected(reason)) => {
                    warn!(%reason, "Stored token rejected by auth service");
                    return Rehydration::Revoked;
                }
                Err(e) => {
                    warn!(error = %e, "Could not verify stored token");
                    return Rehydration::Absent;
                }
            },
        };

        Session::new(token, user).map_or(Rehydration::Absent, Rehydration::Restored)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Exchange credentials for a session. On success the token is
    /// persisted, the session published, a success notification shown and
    /// the user sent to the authenticated area, in that order. On failure
    /// one error notification is shown and the error is returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        // Rejected input never reaches the epoch, so it cannot supersede a
        // login already in flight.
        if let Err(e) = credentials.validate() {
            warn!(error = %e, "Login refused before contacting auth service");
            self.notifier.show(&e.to_string(), Severity::Error);
            return Err(e);
        }

        let epoch = self.advance_epoch();
        let pending = PendingRequest::begin(&self.state);

        let outcome = match self.exchange(credentials).await {
            Ok(grant) => self.commit_login(epoch, grant, pending),
            Err(e) => {
                drop(pending);
                if self.is_stale(epoch) {
                    Err(AuthError::Superseded)
                } else {
                    Err(e)
                }
            }
        };

        match outcome {
            Ok(session) => {
                info!(username = ?session.username(), "Login successful");
                let message = match self.settings.mode {
                    AuthMode::Bypass => DEV_LOGIN_MESSAGE,
                    AuthMode::Remote => LOGIN_MESSAGE,
                };
                self.notifier.show(message, Severity::Success);
                self.navigator.go_to(&self.settings.routes.authenticated);
                Ok(session)
            }
            Err(AuthError::Superseded) => {
                info!("Discarding login that completed after a newer session change");
                Err(AuthError::Superseded)
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.notifier.show(&e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<LoginGrant, AuthError> {
        match self.settings.mode {
            AuthMode::Bypass => {
                debug!(username = %credentials.username, "Bypass mode, skipping auth service");
                Ok(LoginGrant {
                    token: DEV_TOKEN.to_string(),
                    user: Some(UserRecord::new(credentials.username.trim())),
                })
            }
            AuthMode::Remote => self.backend.login(credentials).await,
        }
    }

    fn commit_login(
        &self,
        epoch: u64,
        grant: LoginGrant,
        pending: PendingRequest<'_>,
    ) -> Result<Session, AuthError> {
        let session = Session::new(grant.token, grant.user).ok_or_else(|| {
            AuthError::InvalidResponse("auth service returned an empty token".to_string())
        })?;

        // Remote mode keeps only the token; the profile is refetched if needed.
        let persisted_user = match self.settings.mode {
            AuthMode::Bypass => session.user(),
            AuthMode::Remote => None,
        };

        let current = self.lock_epoch();
        if *current != epoch {
            return Err(AuthError::Superseded);
        }
        if let Err(e) = self.store.write(session.token(), persisted_user) {
            warn!(error = %e, "Failed to persist session");
        }
        let published = session.clone();
        pending.finish(move |s| s.session = Some(published));
        drop(current);

        Ok(session)
    }

    /// End the session. Never fails and is safe to call while signed out.
    pub fn logout(&self) {
        {
            let mut epoch = self.lock_epoch();
            *epoch += 1;
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear stored credentials");
            }
            self.state.send_modify(|s| s.session = None);
        }
        info!("Logged out");
        self.notifier.show(LOGOUT_MESSAGE, Severity::Success);
        self.navigator.go_to(&self.settings.routes.public);
    }

    /// Create an account. Success sends the user to the login entry and
    /// leaves the current session untouched.
    pub async fn register(&self, registration: &Registration) -> Result<(), AuthError> {
        let pending = PendingRequest::begin(&self.state);
        let result = match registration.validate() {
            Ok(()) => self.backend.register(registration).await,
            Err(e) => Err(e),
        };
        drop(pending);

        match result {
            Ok(()) => {
                info!(username = %registration.username, "Registration successful");
                self.notifier.show(REGISTER_MESSAGE, Severity::Success);
                self.navigator.go_to(&self.settings.routes.login);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.notifier.show(&e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    fn advance_epoch(&self) -> u64 {
        let mut epoch = self.lock_epoch();
        *epoch += 1;
        *epoch
    }

    fn is_stale(&self, epoch: u64) -> bool {
        *self.lock_epoch() != epoch
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Counts an in-flight login or register in the published snapshot.
/// Dropping it (including when the owning future is cancelled) releases
/// the count.
struct PendingRequest<'a> {
    state: &'a watch::Sender<AuthSnapshot>,
    finished: bool,
}

impl<'a> PendingRequest<'a> {
    fn begin(state: &'a watch::Sender<AuthSnapshot>) -> Self {
        state.send_modify(|s| s.pending += 1);
        Self {
            state,
            finished: false,
        }
    }

    /// Release the count and apply `update` in the same state change.
    fn finish(mut self, update: impl FnOnce(&mut AuthSnapshot)) {
        self.finished = true;
        self.state.send_modify(|s| {
            s.pending = s.pending.saturating_sub(1);
            update(s);
        });
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state
                .send_modify(|s| s.pending = s.pending.saturating_sub(1));
        }
    }
}
