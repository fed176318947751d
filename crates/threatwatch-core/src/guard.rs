//! Gate for protected views.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::auth::{AuthSnapshot, Session};
use crate::navigate::Navigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Denied,
}

/// Whether protected content may be shown for `session`.
pub fn decide(session: Option<&Session>) -> Access {
    match session {
        Some(_) => Access::Granted,
        None => Access::Denied,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision<T> {
    Render(T),
    Redirect(String),
}

/// Renders protected content only while a session exists.
///
/// The guard holds a live view of the session manager's state, so a view
/// that keeps its guard sees logouts on the next `guard` call; `changed`
/// wakes it when that happens.
pub struct RouteGuard {
    state: watch::Receiver<AuthSnapshot>,
    navigator: Arc<dyn Navigator>,
    redirect_to: String,
}

impl RouteGuard {
    pub fn new(
        state: watch::Receiver<AuthSnapshot>,
        navigator: Arc<dyn Navigator>,
        redirect_to: impl Into<String>,
    ) -> Self {
        Self {
            state,
            navigator,
            redirect_to: redirect_to.into(),
        }
    }

    pub fn access(&self) -> Access {
        decide(self.state.borrow().session.as_ref())
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session.clone()
    }

    /// Render `children` for the current session, or navigate away and
    /// report the redirect.
    pub fn guard<T>(&mut self, children: impl FnOnce(&Session) -> T) -> GuardDecision<T> {
        let session = self.state.borrow_and_update().session.clone();
        match session {
            Some(session) => GuardDecision::Render(children(&session)),
            None => {
                debug!(redirect = %self.redirect_to, "No session, redirecting");
                self.navigator.go_to(&self.redirect_to);
                GuardDecision::Redirect(self.redirect_to.clone())
            }
        }
    }

    /// True if the session state moved since the last `guard` call.
    pub fn has_changed(&self) -> bool {
        self.state.has_changed().unwrap_or(false)
    }

    /// Wait for the next state change. Returns false once the session
    /// manager is gone.
    pub async fn changed(&mut self) -> bool {
        self.state.changed().await.is_ok()
    }

    /// Wait until startup rehydration has finished.
    pub async fn ready(&mut self) -> bool {
        self.state.wait_for(|s| s.initialized).await.is_ok()
    }
}
