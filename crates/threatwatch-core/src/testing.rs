//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use tokio::sync::{watch, Notify};

use crate::auth::credentials::TOKEN_KEY;
use crate::auth::storage::{MemoryStorage, Storage};
use crate::auth::{
    AuthBackend, AuthError, AuthSnapshot, CredentialStore, Credentials, LoginGrant, Registration,
    SessionManager, SessionSettings, StoreError, UserRecord,
};
use crate::config::AuthMode;
use crate::navigate::Navigator;
use crate::notify::{NotificationSink, Severity};

/// Side effects in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StoreWrite(String),
    Notified(Severity),
    Navigated {
        path: String,
        token_persisted: bool,
        session_published: bool,
    },
}

type EventLog = Arc<Mutex<Vec<Event>>>;

fn push(log: &EventLog, event: Event) {
    log.lock().unwrap().push(event);
}

pub struct RecordingStorage {
    inner: MemoryStorage,
    log: EventLog,
}

impl Storage for RecordingStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        push(&self.log, Event::StoreWrite(key.to_string()));
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
    log: EventLog,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        push(&self.log, Event::Notified(severity));
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
    log: EventLog,
    storage: Arc<RecordingStorage>,
    state: OnceLock<watch::Receiver<AuthSnapshot>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        let token_persisted = matches!(self.storage.get(TOKEN_KEY), Ok(Some(_)));
        let session_published = self
            .state
            .get()
            .map(|rx| rx.borrow().session.is_some())
            .unwrap_or(false);
        push(
            &self.log,
            Event::Navigated {
                path: path.to_string(),
                token_persisted,
                session_published,
            },
        );
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Lets a test pause a login inside the backend.
#[derive(Clone, Default)]
pub struct LoginGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl LoginGate {
    /// Resolves once a login call is waiting on the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

pub struct FakeBackend {
    calls: AtomicUsize,
    login: Mutex<Result<LoginGrant, AuthError>>,
    register: Mutex<Result<(), AuthError>>,
    current_user: Mutex<Result<UserRecord, AuthError>>,
    gate: Mutex<Option<LoginGate>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            login: Mutex::new(Ok(LoginGrant {
                token: "remote-token".to_string(),
                user: Some(UserRecord::new("u")),
            })),
            register: Mutex::new(Ok(())),
            current_user: Mutex::new(Ok(UserRecord::new("me"))),
            gate: Mutex::new(None),
        }
    }
}

impl FakeBackend {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_login(&self, result: Result<LoginGrant, AuthError>) {
        *self.login.lock().unwrap() = result;
    }

    pub fn set_register(&self, result: Result<(), AuthError>) {
        *self.register.lock().unwrap() = result;
    }

    pub fn set_current_user(&self, result: Result<UserRecord, AuthError>) {
        *self.current_user.lock().unwrap() = result;
    }

    /// Make the next logins wait until the returned gate is released.
    pub fn hold_login(&self) -> LoginGate {
        let gate = LoginGate::default();
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn login(&self, _credentials: &Credentials) -> Result<LoginGrant, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.login.lock().unwrap().clone()
    }

    async fn register(&self, _registration: &Registration) -> Result<(), AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.register.lock().unwrap().clone()
    }

    async fn current_user(&self, _token: &str) -> Result<UserRecord, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.current_user.lock().unwrap().clone()
    }
}

/// A session manager wired to in-memory collaborators.
pub struct Harness {
    pub manager: SessionManager,
    pub storage: Arc<RecordingStorage>,
    pub backend: Arc<FakeBackend>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    log: EventLog,
}

impl Harness {
    pub fn bypass() -> Self {
        Self::build(AuthMode::Bypass, false)
    }

    pub fn remote() -> Self {
        Self::build(AuthMode::Remote, false)
    }

    pub fn remote_verifying() -> Self {
        Self::build(AuthMode::Remote, true)
    }

    fn build(mode: AuthMode, verify_on_startup: bool) -> Self {
        let log: EventLog = Arc::default();
        let storage = Arc::new(RecordingStorage {
            inner: MemoryStorage::new(),
            log: log.clone(),
        });
        let backend = Arc::new(FakeBackend::default());
        let notifier = Arc::new(RecordingNotifier {
            messages: Mutex::default(),
            log: log.clone(),
        });
        let navigator = Arc::new(RecordingNavigator {
            paths: Mutex::default(),
            log: log.clone(),
            storage: storage.clone(),
            state: OnceLock::new(),
        });

        let settings = SessionSettings {
            mode,
            verify_on_startup,
            ..SessionSettings::default()
        };
        let manager = SessionManager::new(
            settings,
            CredentialStore::new(storage.clone()),
            backend.clone(),
            notifier.clone(),
            navigator.clone(),
        );
        let _ = navigator.state.set(manager.subscribe());

        Self {
            manager,
            storage,
            backend,
            notifier,
            navigator,
            log,
        }
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }
}
