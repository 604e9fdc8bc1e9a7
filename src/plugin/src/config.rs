//! Plugin option parsing and validation
//!
//! The broker hands plugins a flat string key→value map. Missing required
//! options are startup-fatal; everything optional has the defaults the
//! backend documents (no caching, no scopes).

use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use topicgate_authz::OAuthConfig;

/// Validated plugin configuration
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// OAuth2 client and endpoint settings
    pub oauth: OAuthConfig,

    /// How long fetched permission data stays trusted; zero disables caching
    pub cache_ttl: Duration,
}

impl PluginConfig {
    /// Parses the broker's option map.
    ///
    /// The client secret comes from `oauth_client_secret_file` when that
    /// option is set and non-empty (whole-file contents, no trimming),
    /// otherwise from `oauth_client_secret`. `oauth_scopes` is a
    /// comma-separated list with all whitespace stripped before splitting.
    pub fn from_opts(opts: &HashMap<String, String>) -> Result<Self> {
        let client_id = required(opts, "oauth_client_id")?;

        let client_secret = match opts.get("oauth_client_secret_file").filter(|p| !p.is_empty()) {
            Some(path) => fs::read_to_string(path)
                .with_context(|| format!("reading client secret file {path}"))?,
            None => required(opts, "oauth_client_secret")?,
        };

        let token_url = required(opts, "oauth_token_url")?;
        let userinfo_url = required(opts, "oauth_userinfo_url")?;

        let cache_ttl = match opts.get("oauth_cache_duration") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("invalid oauth_cache_duration: {raw:?}"))?;
                Duration::from_secs(secs)
            }
            None => Duration::ZERO,
        };

        let scopes = opts
            .get("oauth_scopes")
            .map(|raw| {
                raw.replace(' ', "")
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            oauth: OAuthConfig {
                client_id,
                client_secret,
                token_url,
                userinfo_url,
                scopes,
            },
            cache_ttl,
        })
    }
}

fn required(opts: &HashMap<String, String>, key: &str) -> Result<String> {
    opts.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .with_context(|| format!("missing required option {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_opts() -> HashMap<String, String> {
        [
            ("oauth_client_id", "broker"),
            ("oauth_client_secret", "hunter2"),
            ("oauth_token_url", "https://sso.example.com/token"),
            ("oauth_userinfo_url", "https://sso.example.com/userinfo"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn minimal_options_parse_with_defaults() {
        let config = PluginConfig::from_opts(&base_opts()).unwrap();

        assert_eq!(config.oauth.client_id, "broker");
        assert_eq!(config.oauth.client_secret, "hunter2");
        assert_eq!(config.cache_ttl, Duration::ZERO);
        assert!(config.oauth.scopes.is_empty());
    }

    #[test]
    fn missing_required_option_fails() {
        for key in [
            "oauth_client_id",
            "oauth_client_secret",
            "oauth_token_url",
            "oauth_userinfo_url",
        ] {
            let mut opts = base_opts();
            opts.remove(key);
            let err = PluginConfig::from_opts(&opts).unwrap_err();
            assert!(err.to_string().contains(key), "error should name {key}");
        }
    }

    #[test]
    fn empty_required_option_fails() {
        let mut opts = base_opts();
        opts.insert("oauth_client_id".to_string(), String::new());
        assert!(PluginConfig::from_opts(&opts).is_err());
    }

    #[test]
    fn cache_duration_is_seconds() {
        let mut opts = base_opts();
        opts.insert("oauth_cache_duration".to_string(), "300".to_string());
        let config = PluginConfig::from_opts(&opts).unwrap();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn invalid_cache_duration_fails() {
        let mut opts = base_opts();
        opts.insert("oauth_cache_duration".to_string(), "soon".to_string());
        assert!(PluginConfig::from_opts(&opts).is_err());
    }

    #[test]
    fn scopes_split_on_commas_with_whitespace_stripped() {
        let mut opts = base_opts();
        opts.insert("oauth_scopes".to_string(), "mqtt, profile ,email".to_string());
        let config = PluginConfig::from_opts(&opts).unwrap();
        assert_eq!(config.oauth.scopes, vec!["mqtt", "profile", "email"]);
    }

    #[test]
    fn secret_file_overrides_inline_secret() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "file-secret").unwrap();

        let mut opts = base_opts();
        opts.insert(
            "oauth_client_secret_file".to_string(),
            file.path().to_string_lossy().into_owned(),
        );
        let config = PluginConfig::from_opts(&opts).unwrap();
        assert_eq!(config.oauth.client_secret, "file-secret");
    }

    #[test]
    fn missing_secret_file_fails() {
        let mut opts = base_opts();
        opts.insert(
            "oauth_client_secret_file".to_string(),
            "/nonexistent/secret".to_string(),
        );
        assert!(PluginConfig::from_opts(&opts).is_err());
    }

    #[test]
    fn empty_secret_file_option_falls_back_to_inline_secret() {
        let mut opts = base_opts();
        opts.insert("oauth_client_secret_file".to_string(), String::new());
        let config = PluginConfig::from_opts(&opts).unwrap();
        assert_eq!(config.oauth.client_secret, "hunter2");
    }
}
