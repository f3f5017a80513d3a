use thiserror::Error;

/// Session-layer failures.
///
/// None of these are fatal to the application: callers log them and fall
/// back to the anonymous state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("malformed session record: {0}")]
    MalformedRecord(String),

    #[error("credential storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("session token is empty")]
    EmptyToken,

    #[error("navigation failed: {0}")]
    NavigationFailed(String),
}

impl SessionError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedRecord(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::NavigationFailed(msg.into())
    }
}
