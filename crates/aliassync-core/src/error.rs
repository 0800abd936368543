//! Error types for aliassync
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for aliassync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for aliassync
#[derive(Error, Debug)]
pub enum Error {
    /// A record that had to exist for the operation to proceed is absent
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Non-success response or transport failure from the remote store
    #[error("Remote store error: {0}")]
    Remote(String),

    /// The remote store rejected the API credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a remote store error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error reports an absent record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error originated at the remote store
    /// (transport, status, credentials or payload)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote(_) | Self::Authentication(_) | Self::Malformed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(Error::not_found("a.example.com").is_not_found());
        assert!(!Error::remote("502 Bad Gateway").is_not_found());

        assert!(Error::remote("connection refused").is_remote());
        assert!(Error::auth("401").is_remote());
        assert!(Error::malformed("expected value").is_remote());
        assert!(!Error::config("missing key").is_remote());
        assert!(!Error::invalid_input("app.other.org").is_remote());
    }

    #[test]
    fn test_error_display() {
        let err = Error::not_found("Host override app.example.com does not exist");
        assert_eq!(
            err.to_string(),
            "Record not found: Host override app.example.com does not exist"
        );
    }
}
