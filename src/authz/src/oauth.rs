//! OAuth2 credential provider
//!
//! Concrete [`CredentialProvider`] backed by an OAuth2 identity provider:
//! resource-owner password grants against the token endpoint, permission
//! payloads from the userinfo endpoint.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AuthError, Result};
use crate::provider::{CredentialHandle, CredentialProvider, PermissionSet};

/// OAuth2 endpoint and client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// OAuth2 client identifier
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Token endpoint for the password grant
    pub token_url: String,

    /// Userinfo endpoint serving the permission payload
    pub userinfo_url: String,

    /// Scopes requested on token exchange
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Token endpoint response, the subset this provider consumes.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Userinfo payload; absent fields default to no privilege.
///
/// ```json
/// { "mqtt": { "superuser": bool, "topics": { "read": [...], "write": [...] } } }
/// ```
#[derive(Debug, Default, Deserialize)]
struct UserInfo {
    #[serde(default)]
    mqtt: MqttSection,
}

#[derive(Debug, Default, Deserialize)]
struct MqttSection {
    #[serde(default)]
    superuser: bool,
    #[serde(default)]
    topics: TopicsSection,
}

#[derive(Debug, Default, Deserialize)]
struct TopicsSection {
    #[serde(default)]
    read: Vec<String>,
    #[serde(default)]
    write: Vec<String>,
}

impl From<UserInfo> for PermissionSet {
    fn from(info: UserInfo) -> Self {
        Self {
            superuser: info.mqtt.superuser,
            read: info.mqtt.topics.read,
            write: info.mqtt.topics.write,
        }
    }
}

/// OAuth2-backed credential provider.
///
/// Owns the single HTTP client shared by all token and userinfo requests.
pub struct OAuthProvider {
    config: OAuthConfig,
    http: Client,
}

impl OAuthProvider {
    /// Creates a provider from endpoint configuration.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        if config.token_url.is_empty() {
            return Err(AuthError::InvalidConfig("token_url is empty".to_string()));
        }
        if config.userinfo_url.is_empty() {
            return Err(AuthError::InvalidConfig("userinfo_url is empty".to_string()));
        }

        Ok(Self {
            config,
            http: Client::new(),
        })
    }

    /// Scopes requested on token exchange.
    pub fn scopes(&self) -> &[String] {
        &self.config.scopes
    }
}

#[async_trait]
impl CredentialProvider for OAuthProvider {
    async fn exchange_password(&self, username: &str, password: &str) -> Result<CredentialHandle> {
        let scope = self.config.scopes.join(" ");
        let mut form = vec![
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        if !scope.is_empty() {
            form.push(("scope", scope.as_str()));
        }

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::TokenExchange(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::TokenExchange(e.to_string()))?;

        debug!("Password grant for {} succeeded", username);

        Ok(CredentialHandle {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        })
    }

    async fn handle_from_token(&self, token: &str) -> Result<CredentialHandle> {
        Ok(CredentialHandle::bearer(token))
    }

    async fn fetch_permissions(&self, handle: &CredentialHandle) -> Result<PermissionSet> {
        let response = self
            .http
            .get(&self.config.userinfo_url)
            .bearer_auth(&handle.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::PermissionFetch(format!(
                "userinfo endpoint returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::PermissionFetch(e.to_string()))?;

        info!("Got userinfo from auth backend");

        Ok(info.into())
    }
}
