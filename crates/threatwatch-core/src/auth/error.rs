use thiserror::Error;

/// Failure of a login or registration attempt.
///
/// The `Display` text is what the user sees in the error notification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Rejected(String),

    #[error("Unable to connect to server: {0}")]
    Unreachable(String),

    #[error("Unexpected response from server: {0}")]
    InvalidResponse(String),

    /// A logout or a newer login happened while this call was in flight.
    #[error("Session changed while the request was in flight")]
    Superseded,
}

/// Failure inside the local credential storage.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored data is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),
}
