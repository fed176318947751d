//! Application state for the threatwatch shell.
//!
//! `App` wires the session manager to the terminal: it owns the router the
//! shell renders through and remembers the last username in the config.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use threatwatch_core::auth::{AuthBackend, Storage};
use threatwatch_core::{
    ApiClient, AuthError, AuthMode, Config, CredentialStore, Credentials, Navigator, Page, Registration,
    Resolution, Router, Session, SessionManager, SessionSettings,
};
use tracing::{debug, warn};

use crate::console::{ConsoleNotifier, ShellNavigator};

/// Redirect chains longer than this are a routing bug, not user input.
const MAX_REDIRECTS: usize = 4;

pub struct App {
    config: Config,
    config_path: Option<PathBuf>,
    manager: SessionManager,
    router: Router,
    navigator: Arc<ShellNavigator>,
}

impl App {
    /// Build the application from the user's config.
    pub fn new(config: Config) -> Result<Self> {
        let storage = config.open_storage()?;
        let backend = Arc::new(ApiClient::new(config.api_base_url())?);
        let config_path = Config::config_path().ok();
        Ok(Self::with_parts(config, config_path, storage, backend))
    }

    pub fn with_parts(
        config: Config,
        config_path: Option<PathBuf>,
        storage: Arc<dyn Storage>,
        backend: Arc<dyn AuthBackend>,
    ) -> Self {
        let settings = SessionSettings::from_config(&config);
        let navigator = Arc::new(ShellNavigator::new(&settings.routes.public));
        let routes = settings.routes.clone();

        let manager = SessionManager::new(
            settings,
            CredentialStore::new(storage),
            backend,
            Arc::new(ConsoleNotifier::default()),
            navigator.clone(),
        );
        let router = Router::new(manager.guard(), navigator.clone(), routes);

        Self {
            config,
            config_path,
            manager,
            router,
            navigator,
        }
    }

    /// Restore any stored session and land on the matching start page.
    pub async fn start(&mut self) {
        self.manager.initialize().await;
        if self.manager.is_authenticated() {
            let target = self.manager.routes().authenticated.clone();
            self.open(&target);
        }
    }

    pub fn session(&self) -> Option<Session> {
        self.manager.session()
    }

    pub fn last_username(&self) -> Option<&str> {
        self.config.last_username.as_deref()
    }

    pub fn current_path(&self) -> String {
        self.navigator.current()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    pub async fn login(&mut self, username: &str, password: &str) -> Result<Session, AuthError> {
        let session = self
            .manager
            .login(&Credentials::new(username, password))
            .await?;

        self.config.last_username = Some(username.trim().to_string());
        self.save_config();
        Ok(session)
    }

    /// Submit a registration from the register page. A failure leaves the
    /// user on that page.
    pub async fn register(&mut self, registration: &Registration) -> Result<(), AuthError> {
        let form = self.manager.routes().register.clone();
        self.open(&form);
        self.manager.register(registration).await
    }

    pub fn logout(&mut self) {
        self.manager.logout();
    }

    pub fn open(&mut self, path: &str) {
        self.navigator.go_to(path);
    }

    pub fn status(&self) -> String {
        let snapshot = self.manager.snapshot();
        match snapshot.session {
            Some(session) => format!(
                "Signed in as {} ({} mode, session started {})",
                session.username().unwrap_or("an unnamed user"),
                mode_label(self.manager.mode()),
                session.age_display()
            ),
            None => format!("Not signed in ({} mode)", mode_label(self.manager.mode())),
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Render the page at the current path, following guard redirects.
    pub fn render(&mut self) -> String {
        for _ in 0..MAX_REDIRECTS {
            let path = self.navigator.current();
            match self.router.resolve(&path) {
                Resolution::Show { page, session } => return render_page(page, session.as_ref()),
                Resolution::Redirect(target) => debug!(from = %path, to = %target, "Redirected"),
                Resolution::NotFound(path) => {
                    return format!("No page at {}. Type `help` for commands.", path)
                }
            }
        }
        warn!(path = %self.navigator.current(), "Redirect loop");
        "Too many redirects".to_string()
    }

    fn save_config(&self) {
        let Some(ref path) = self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, "Failed to save config");
        }
    }
}

fn mode_label(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Bypass => "development",
        AuthMode::Remote => "remote",
    }
}

fn render_page(page: Page, session: Option<&Session>) -> String {
    let who = session.map(|s| s.username().unwrap_or("an unnamed user"));
    let body = match page {
        Page::Landing => match who {
            Some(who) => format!("Signed in as {}. `open /dashboard` to continue.", who),
            None => "AI-enhanced threat detection. `login` or `register` to get started.".to_string(),
        },
        Page::Login => "Type `login` to sign in, or `register` to create an account.".to_string(),
        Page::Register => "Type `register` to create an account.".to_string(),
        Page::Dashboard | Page::Alerts | Page::NetworkTraffic | Page::Settings => {
            let age = session.map(Session::age_display).unwrap_or_default();
            format!(
                "Signed in as {} (session started {})",
                who.unwrap_or("an unnamed user"),
                age
            )
        }
    };
    format!("== {} ({}) ==\n{}", page.title(), page.path(), body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatwatch_core::auth::MemoryStorage;

    fn app(mode: AuthMode) -> App {
        let config = Config {
            auth_mode: mode,
            ..Config::default()
        };
        // Nothing listens on the discard port, so remote calls fail fast.
        let backend = Arc::new(ApiClient::new("http://127.0.0.1:9/api").unwrap());
        App::with_parts(config, None, Arc::new(MemoryStorage::new()), backend)
    }

    #[tokio::test]
    async fn test_starts_on_landing_page() {
        let mut app = app(AuthMode::Bypass);
        app.start().await;

        assert_eq!(app.current_path(), "/");
        assert!(app.render().starts_with("== Home (/) =="));
    }

    #[tokio::test]
    async fn test_protected_page_redirects_to_login() {
        let mut app = app(AuthMode::Bypass);
        app.start().await;

        app.open("/alerts");

        assert!(app.render().starts_with("== Sign In (/login) =="));
        assert_eq!(app.current_path(), "/login");
    }

    #[tokio::test]
    async fn test_login_lands_on_dashboard_and_logout_returns_home() {
        let mut app = app(AuthMode::Bypass);
        app.start().await;

        app.login("analyst", "pw").await.unwrap();
        let page = app.render();
        assert!(page.starts_with("== Dashboard (/dashboard) =="));
        assert!(page.contains("analyst"));
        assert_eq!(app.last_username(), Some("analyst"));

        app.logout();
        assert!(app.render().starts_with("== Home (/) =="));
        assert!(app.session().is_none());
    }

    #[tokio::test]
    async fn test_login_page_redirects_when_signed_in() {
        let mut app = app(AuthMode::Bypass);
        app.start().await;
        app.login("analyst", "pw").await.unwrap();

        app.open("/login");

        assert!(app.render().starts_with("== Dashboard"));
    }

    #[tokio::test]
    async fn test_remote_login_failure_keeps_page() {
        let mut app = app(AuthMode::Remote);
        app.start().await;
        app.open("/login");

        let err = app.login("u", "p").await.unwrap_err();

        assert!(matches!(err, AuthError::Unreachable(_)));
        assert_eq!(app.current_path(), "/login");
        assert_eq!(app.last_username(), None);
    }

    #[tokio::test]
    async fn test_status_line() {
        let mut app = app(AuthMode::Bypass);
        app.start().await;
        assert_eq!(app.status(), "Not signed in (development mode)");

        app.login("analyst", "pw").await.unwrap();
        assert!(app.status().starts_with("Signed in as analyst (development mode"));
    }

    #[tokio::test]
    async fn test_failed_register_stays_on_form() {
        let mut app = app(AuthMode::Remote);
        app.start().await;

        let err = app
            .register(&Registration::new("new", "new@example.com", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, AuthError::Unreachable(_)));
        assert_eq!(app.current_path(), "/register");
        assert!(app.render().starts_with("== Create Account (/register) =="));
    }

    #[test]
    fn test_open_moves_navigator() {
        let mut app = app(AuthMode::Bypass);
        app.open("/settings");
        assert_eq!(app.current_path(), "/settings");
    }

    #[test]
    fn test_unknown_path_renders_hint() {
        let mut app = app(AuthMode::Bypass);
        app.open("/nowhere");
        assert!(app.render().starts_with("No page at /nowhere"));
    }
}
