//! Per-identity authorization cache
//!
//! Maps identity keys (usernames, or raw bearer tokens for token-flow
//! clients) to cached permission data, refreshing through the injected
//! [`CredentialProvider`] whenever an entry goes stale. Every broker-facing
//! operation collapses to a boolean and fails closed: unknown identity,
//! unrefreshable stale entry, and unrecognized access codes all deny.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::access::{self, AccessLevel};
use crate::error::{AuthError, Result};
use crate::provider::{CredentialHandle, CredentialProvider, PermissionSet};

/// Cached authorization state for one identity.
///
/// Pattern vectors keep the provider's response order; matching itself is
/// order-independent.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity key this entry was created for
    pub identity: String,

    /// Elevated broker privilege, as reported by the provider
    pub superuser: bool,

    /// Topic patterns the identity may read or subscribe to
    pub read_patterns: Vec<String>,

    /// Topic patterns the identity may publish to
    pub write_patterns: Vec<String>,

    /// When this entry was created (first successful authentication)
    pub created_at: DateTime<Utc>,

    /// When permission data was last fetched; the Unix epoch until then
    pub updated_at: DateTime<Utc>,

    /// Capability for re-querying the provider
    pub handle: CredentialHandle,
}

impl CacheEntry {
    /// Entry for a password-flow identity.
    ///
    /// Seeded with the epoch sentinel so the first real check refreshes the
    /// (still empty) permission data before trusting it.
    fn password_flow(identity: &str, handle: CredentialHandle) -> Self {
        Self {
            identity: identity.to_string(),
            superuser: false,
            read_patterns: Vec::new(),
            write_patterns: Vec::new(),
            created_at: Utc::now(),
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
            handle,
        }
    }

    /// Entry for a token-flow identity, populated at creation.
    ///
    /// Token clients have no separate exchange step to defer to, so the
    /// permission payload is already in hand.
    fn token_flow(identity: &str, handle: CredentialHandle, permissions: PermissionSet) -> Self {
        let mut entry = Self::password_flow(identity, handle);
        entry.apply(permissions);
        entry
    }

    /// Commits one fetched permission payload.
    ///
    /// Both pattern sets are replaced wholesale, never merged, and
    /// `updated_at` moves forward in the same commit.
    fn apply(&mut self, permissions: PermissionSet) {
        self.superuser = permissions.superuser;
        self.read_patterns = permissions.read;
        self.write_patterns = permissions.write;
        self.updated_at = Utc::now();
    }

    /// Whether the entry's permission data is still trustworthy.
    ///
    /// A zero TTL disables caching entirely: nothing is ever valid and every
    /// check refreshes.
    fn is_valid(&self, ttl: Duration) -> bool {
        if ttl.is_zero() {
            return false;
        }
        let age = (Utc::now() - self.updated_at).to_std().unwrap_or_default();
        age < ttl
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Checks answered from fresh cached data
    pub hits: usize,
    /// Checks against identities with no cache entry
    pub misses: usize,
    /// Checks that found a stale entry and had to refresh
    pub expirations: usize,
    /// Number of cached identities
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expirations;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Authorization cache keyed by identity.
///
/// Constructed once at process start and shared by handle; internal
/// synchronization is a concurrent map of per-entry locks. A provider
/// refresh runs with no lock held — only the final field commit takes the
/// entry's write lock, so concurrent readers never observe a permission set
/// mixing two fetches.
pub struct AuthorizationCache {
    entries: DashMap<String, Arc<RwLock<CacheEntry>>>,
    provider: Arc<dyn CredentialProvider>,
    ttl: Duration,
    stats: DashMap<String, usize>,
}

impl AuthorizationCache {
    /// Creates a cache over a credential provider.
    ///
    /// `ttl` bounds how long fetched permission data is trusted; zero
    /// disables caching so every check re-fetches.
    pub fn new(provider: Arc<dyn CredentialProvider>, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            provider,
            ttl,
            stats: DashMap::new(),
        }
    }

    /// Authenticates an identity, the sole gate that populates the cache.
    ///
    /// An empty `password` marks `identity` as a raw bearer token: the
    /// permission payload is fetched immediately and the entry created fully
    /// populated. Otherwise the pair goes through a password grant and the
    /// entry starts empty and stale, forcing a refresh on the first check.
    ///
    /// Returns `false` on any provider failure, in which case no entry is
    /// created or touched.
    pub async fn authenticate(&self, identity: &str, password: &str, _client_id: &str) -> bool {
        info!("Authenticating {} against the auth backend", identity);

        let entry = if password.is_empty() {
            let handle = match self.provider.handle_from_token(identity).await {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Rejected token for {}: {}", identity, e);
                    return false;
                }
            };
            match self.provider.fetch_permissions(&handle).await {
                Ok(permissions) => CacheEntry::token_flow(identity, handle, permissions),
                Err(e) => {
                    error!("Token authentication for {} failed: {}", identity, e);
                    return false;
                }
            }
        } else {
            match self.provider.exchange_password(identity, password).await {
                Ok(handle) => CacheEntry::password_flow(identity, handle),
                Err(e) => {
                    error!("Password authentication for {} failed: {}", identity, e);
                    return false;
                }
            }
        };

        self.entries
            .insert(identity.to_string(), Arc::new(RwLock::new(entry)));
        true
    }

    /// Whether the identity holds elevated broker privilege.
    ///
    /// Missing entry or failed refresh denies; a refresh failure leaves the
    /// stale entry untouched for a later retry.
    pub async fn is_superuser(&self, identity: &str) -> bool {
        debug!("Checking if {} is a superuser", identity);

        match self.usable_entry(identity).await {
            Ok(entry) => {
                let guard = entry.read().await;
                debug!("Superuser check for {} was {}", identity, guard.superuser);
                guard.superuser
            }
            Err(e) => {
                self.deny(identity, &e);
                false
            }
        }
    }

    /// Whether the identity may perform `access` (a broker access code) on
    /// `topic`.
    ///
    /// The identity key substitutes `%u` and `client_id` substitutes `%c` in
    /// cached patterns; for token-flow identities `%u` therefore receives
    /// the raw token value. Unknown access codes deny without touching the
    /// provider.
    pub async fn check_topic_access(
        &self,
        identity: &str,
        topic: &str,
        client_id: &str,
        access: i32,
    ) -> bool {
        debug!(
            "Checking access of {} to topic {} with access {}",
            identity, topic, access
        );

        let Some(level) = AccessLevel::from_code(access) else {
            self.deny(identity, &AuthError::InvalidAccessCode(access));
            return false;
        };

        match self.usable_entry(identity).await {
            Ok(entry) => {
                let guard = entry.read().await;
                access::evaluate(
                    level,
                    &guard.read_patterns,
                    &guard.write_patterns,
                    topic,
                    identity,
                    client_id,
                )
            }
            Err(e) => {
                self.deny(identity, &e);
                false
            }
        }
    }

    /// Looks up the entry for `identity`, refreshing it first if stale.
    async fn usable_entry(&self, identity: &str) -> Result<Arc<RwLock<CacheEntry>>> {
        let entry = self
            .entries
            .get(identity)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| {
                self.increment_stat("misses");
                AuthError::UnknownIdentity(identity.to_string())
            })?;

        self.refresh_if_stale(identity, &entry).await?;
        Ok(entry)
    }

    /// Refreshes an entry's permission data when the TTL has lapsed.
    ///
    /// The provider call runs without any lock held; the fetched payload is
    /// committed in one write-locked assignment. On fetch failure the entry
    /// keeps its previous (stale) data.
    async fn refresh_if_stale(&self, identity: &str, entry: &Arc<RwLock<CacheEntry>>) -> Result<()> {
        let handle = {
            let guard = entry.read().await;
            if guard.is_valid(self.ttl) {
                self.increment_stat("hits");
                debug!("Using cached permissions for {}", identity);
                return Ok(());
            }
            guard.handle.clone()
        };

        self.increment_stat("expirations");
        if handle.is_expired() {
            warn!("Token for {} expired, refreshing anyway", identity);
        }

        let permissions = self.provider.fetch_permissions(&handle).await?;

        let mut guard = entry.write().await;
        guard.apply(permissions);
        Ok(())
    }

    fn deny(&self, identity: &str, reason: &AuthError) {
        match reason {
            AuthError::UnknownIdentity(_) => {
                warn!("Have no cache entry for {}", identity);
            }
            AuthError::InvalidAccessCode(code) => {
                warn!("Denying {}: unrecognized access code {}", identity, code);
            }
            e => {
                error!("Failed to refresh permissions for {}: {}", identity, e);
            }
        }
    }

    /// Clones the current entry state for an identity, if cached.
    pub async fn snapshot(&self, identity: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(identity).map(|e| Arc::clone(e.value()))?;
        let guard = entry.read().await;
        Some(guard.clone())
    }

    /// Whether an identity has authenticated successfully at least once.
    pub fn contains(&self, identity: &str) -> bool {
        self.entries.contains_key(identity)
    }

    /// Number of cached identities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no identities.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops all entries and statistics.
    pub fn clear(&self) {
        self.entries.clear();
        self.stats.clear();
    }

    /// Configured permission TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            expirations: self.get_stat("expirations"),
            entries: self.entries.len(),
        }
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}
