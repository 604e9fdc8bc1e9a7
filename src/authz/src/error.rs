//! Error types for the authorization cache

use thiserror::Error;

/// Authorization cache errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token exchange with the identity provider failed
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Permission fetch from the identity provider failed
    #[error("Permission fetch failed: {0}")]
    PermissionFetch(String),

    /// Identity has never authenticated successfully
    #[error("Unknown identity: {0}")]
    UnknownIdentity(String),

    /// Access code outside the known read/write/readwrite/subscribe set
    #[error("Unrecognized access code: {0}")]
    InvalidAccessCode(i32),

    /// Invalid provider configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthError>;
