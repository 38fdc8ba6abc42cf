use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::store::TokenStore;
use super::types::{Credential, CredentialSource, Identity, ProviderError, TokenData};
use crate::config::ClientConfig;

/// Cap on configured or provider-stated validity windows; keeps the cast
/// and the expiry arithmetic below out of panic range
const MAX_WINDOW_SECS: u64 = 60 * 60 * 24 * 365;

fn window(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_WINDOW_SECS) as i64)
}

/// Process-wide credential cache
///
/// Holds at most one credential; both pipeline variants read and write it.
/// Mutations happen under the write lock, so a truly parallel runtime gets
/// the same atomic replacement the cooperative model assumes.
pub struct CredentialCache {
    /// Identity provider used to mint credentials
    source: Arc<dyn CredentialSource>,

    /// External persisted-token store, signalled on refresh token rotation
    store: Arc<dyn TokenStore>,

    /// The cached credential, if any
    cached: RwLock<Option<Credential>>,

    /// Margin subtracted from expiry when answering "is this still usable"
    safety_buffer: Duration,

    /// Validity assumed when the provider does not state one
    validity: Duration,
}

impl CredentialCache {
    pub fn new(
        config: &ClientConfig,
        source: Arc<dyn CredentialSource>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        Self {
            source,
            store,
            cached: RwLock::new(None),
            safety_buffer: window(config.credential_safety_buffer),
            validity: window(config.credential_validity),
        }
    }

    /// Resolve a usable credential for the given identity
    ///
    /// Returns `None` when no identity is signed in or the provider cannot
    /// mint; the caller proceeds unauthenticated. Never fails the request.
    pub async fn resolve(&self, identity: Option<&Identity>) -> Option<Credential> {
        let identity = identity?;

        {
            let cached = self.cached.read().await;
            if let Some(credential) = cached.as_ref() {
                if credential.is_usable(Utc::now(), self.safety_buffer) {
                    tracing::debug!("Reusing cached credential");
                    return Some(credential.clone());
                }
            }
        }

        let mut slot = self.cached.write().await;

        // Another task may have refreshed while we waited for the lock
        if let Some(credential) = slot.as_ref() {
            if credential.is_usable(Utc::now(), self.safety_buffer) {
                return Some(credential.clone());
            }
        }

        match self.source.mint(identity, false).await {
            Ok(data) => {
                let credential = self.admit(data).await;
                *slot = Some(credential.clone());
                Some(credential)
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %identity.user_id,
                    error = %e,
                    "Credential fetch failed, proceeding unauthenticated"
                );
                *slot = None;
                None
            }
        }
    }

    /// Unconditionally invalidate and mint a forced-fresh credential
    ///
    /// Propagates provider failure; the caller must then treat the identity
    /// as unauthenticated.
    pub async fn force_refresh(&self, identity: &Identity) -> Result<Credential, ProviderError> {
        tracing::debug!(user_id = %identity.user_id, "Forcing credential refresh");

        let mut slot = self.cached.write().await;
        *slot = None;

        let data = self.source.mint(identity, true).await?;
        let credential = self.admit(data).await;
        *slot = Some(credential.clone());
        Ok(credential)
    }

    /// Clear cached state; idempotent
    pub async fn invalidate(&self) {
        let mut slot = self.cached.write().await;
        *slot = None;
    }

    /// Turn a provider grant into a cached credential, stamping the
    /// usable-until instant and forwarding any rotated refresh token
    async fn admit(&self, data: TokenData) -> Credential {
        if let Some(ref rotated) = data.refresh_token {
            self.store.store_credential(rotated).await;
        }

        let validity = data.expires_in.map(window).unwrap_or(self.validity);
        let usable_until = Utc::now() + validity;

        tracing::info!(usable_until = %usable_until.to_rfc3339(), "Credential cached");

        Credential {
            token: data.access_token,
            usable_until,
        }
    }

    #[cfg(test)]
    async fn seed(&self, token: &str, usable_until: chrono::DateTime<Utc>) {
        let mut slot = self.cached.write().await;
        *slot = Some(Credential {
            token: token.to_string(),
            usable_until,
        });
    }
}
