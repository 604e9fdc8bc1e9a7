//! Credential provider boundary
//!
//! The cache never talks to the identity backend directly. It holds a
//! [`CredentialHandle`] per entry and goes through a [`CredentialProvider`]
//! for the two network operations: exchanging presented credentials for a
//! handle, and fetching the permission payload for a handle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque capability used to re-query the identity backend for one identity.
///
/// Carries exactly the data a refresh call needs (the bearer token and its
/// advertised lifetime), not a live HTTP client; transport stays with the
/// provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialHandle {
    /// Bearer access token presented on userinfo requests
    pub access_token: String,

    /// Token type as issued (virtually always "Bearer")
    pub token_type: String,

    /// Expiry advertised by the token endpoint, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialHandle {
    /// Creates a bearer handle without an advertised expiry.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
        }
    }

    /// Whether the advertised token lifetime has elapsed.
    ///
    /// A handle without an expiry is never considered expired; the backend
    /// remains the authority either way.
    pub fn is_expired(&self) -> bool {
        self.expires_at.map(|at| at <= Utc::now()).unwrap_or(false)
    }
}

/// One permission payload as fetched from the identity backend.
///
/// Replaces an entry's permission data wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Whether the identity holds elevated broker privilege
    pub superuser: bool,

    /// Topic patterns the identity may read or subscribe to
    pub read: Vec<String>,

    /// Topic patterns the identity may publish to
    pub write: Vec<String>,
}

/// Identity backend operations consumed by the cache.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Exchanges a username/password pair for a credential handle.
    async fn exchange_password(&self, username: &str, password: &str) -> Result<CredentialHandle>;

    /// Wraps a presented bearer token in a credential handle.
    ///
    /// No validation happens here; a bad token surfaces on the first
    /// permission fetch.
    async fn handle_from_token(&self, token: &str) -> Result<CredentialHandle>;

    /// Fetches the current permission payload for a handle.
    async fn fetch_permissions(&self, handle: &CredentialHandle) -> Result<PermissionSet>;
}
