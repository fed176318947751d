//! Transient user notifications ("toasts").

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

/// Fire-and-forget sink for user-facing messages.
pub trait NotificationSink: Send + Sync {
    fn show(&self, message: &str, severity: Severity);
}

/// Sends notifications to the log. Useful when no UI is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => error!(severity = severity.label(), "{}", message),
            Severity::Warning => warn!(severity = severity.label(), "{}", message),
            Severity::Success | Severity::Info => info!(severity = severity.label(), "{}", message),
        }
    }
}
