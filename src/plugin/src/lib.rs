//! # Topicgate Broker Plugin
//!
//! Broker-facing shim over the authorization cache: parses the broker's
//! option map, wires up the OAuth2 credential provider, and exposes the
//! three boolean entry points the broker calls per connection and per
//! publish. No structured error ever crosses this boundary — every failure
//! is logged and reported upward as a denial.

pub mod config;

pub use config::PluginConfig;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use topicgate_authz::{AuthorizationCache, OAuthProvider};

/// Human-readable plugin name used in the startup banner
pub const PLUGIN_NAME: &str = "Topicgate OAuth Plugin";

/// The broker plugin: one authorization cache over one OAuth2 backend.
pub struct Plugin {
    cache: AuthorizationCache,
    scopes: Vec<String>,
}

impl Plugin {
    /// Initializes the plugin from the broker's option map.
    ///
    /// Fatal on missing or invalid options; the broker is expected to treat
    /// an error here as a startup failure.
    pub fn init(opts: &HashMap<String, String>) -> Result<Self> {
        let config = PluginConfig::from_opts(opts)?;
        let scopes = config.oauth.scopes.clone();
        let provider = OAuthProvider::new(config.oauth)?;
        let cache = AuthorizationCache::new(Arc::new(provider), config.cache_ttl);

        info!("{} {} initialized", PLUGIN_NAME, topicgate_authz::VERSION);

        Ok(Self { cache, scopes })
    }

    /// Authenticates a connecting client.
    ///
    /// An empty password marks the username as a raw bearer token.
    pub async fn get_user(&self, username: &str, password: &str, client_id: &str) -> bool {
        self.cache.authenticate(username, password, client_id).await
    }

    /// Whether the user holds elevated broker privilege.
    pub async fn get_superuser(&self, username: &str) -> bool {
        self.cache.is_superuser(username).await
    }

    /// Whether the user may perform `access` (broker access code) on `topic`.
    pub async fn check_acl(&self, username: &str, topic: &str, client_id: &str, access: i32) -> bool {
        self.cache.check_topic_access(username, topic, client_id, access).await
    }

    /// Plugin name and version for the broker's plugin listing.
    pub fn name(&self) -> String {
        format!("{} {}", PLUGIN_NAME, topicgate_authz::VERSION)
    }

    /// Scopes requested on every token exchange.
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// The underlying cache, for inspection and operator tooling.
    pub fn cache(&self) -> &AuthorizationCache {
        &self.cache
    }

    /// Broker shutdown hook.
    pub fn halt(&self) {
        info!("{} shutting down", PLUGIN_NAME);
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; `default_filter` applies otherwise. Safe to
/// call more than once (later calls are no-ops).
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
