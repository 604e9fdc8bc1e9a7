//! # Topicgate Authorization Cache
//!
//! Authorization cache and topic-ACL evaluator for broker access checks
//! backed by a remote OAuth2 identity provider.
//!
//! ## Features
//!
//! - **TTL-based authorization cache** keyed by username or bearer token,
//!   refreshed lazily through the identity backend
//! - **Hierarchical topic matching** with `+`/`#` wildcards and `%u`/`%c`
//!   placeholder substitution
//! - **Fail-closed decisions** — every broker-facing operation collapses to
//!   a boolean and denies on any ambiguous state
//! - **Async-first design** using the Tokio runtime
//! - **Pluggable credential provider** seam for testing without a network
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use topicgate_authz::{AuthorizationCache, OAuthConfig, OAuthProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OAuthProvider::new(OAuthConfig {
//!         client_id: "broker".into(),
//!         client_secret: "secret".into(),
//!         token_url: "https://sso.example.com/token".into(),
//!         userinfo_url: "https://sso.example.com/userinfo".into(),
//!         scopes: vec!["mqtt".into()],
//!     })?;
//!
//!     let cache = AuthorizationCache::new(Arc::new(provider), Duration::from_secs(300));
//!
//!     if cache.authenticate("alice", "password", "client-1").await {
//!         let allowed = cache.check_topic_access("alice", "sensors/alice/temp", "client-1", 1).await;
//!         println!("read access: {allowed}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod cache;
pub mod error;
pub mod oauth;
pub mod provider;
pub mod topics;

// Re-export commonly used types
pub use access::AccessLevel;
pub use cache::{AuthorizationCache, CacheEntry, CacheStats};
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthProvider};
pub use provider::{CredentialHandle, CredentialProvider, PermissionSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
