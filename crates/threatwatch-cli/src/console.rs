//! Terminal implementations of the notification sink and navigator.

use std::sync::{Mutex, PoisonError};

use threatwatch_core::{Navigator, NotificationSink, Severity, TracingNotifier};
use tracing::debug;

/// Prints notifications to stderr and mirrors them into the log.
#[derive(Debug, Default)]
pub struct ConsoleNotifier {
    log: TracingNotifier,
}

impl ConsoleNotifier {
    fn marker(severity: Severity) -> &'static str {
        match severity {
            Severity::Success => "✓",
            Severity::Error => "✗",
            Severity::Warning => "!",
            Severity::Info => "i",
        }
    }
}

impl NotificationSink for ConsoleNotifier {
    fn show(&self, message: &str, severity: Severity) {
        eprintln!("{} {}", Self::marker(severity), message);
        self.log.show(message, severity);
    }
}

/// Remembers the current path; the shell renders whatever it points at.
#[derive(Debug)]
pub struct ShellNavigator {
    current: Mutex<String>,
}

impl ShellNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            current: Mutex::new(start.to_string()),
        }
    }

    pub fn current(&self) -> String {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for ShellNavigator {
    fn go_to(&self, path: &str) {
        debug!(path, "Navigating");
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = path.to_string();
    }
}
