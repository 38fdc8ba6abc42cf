// Authentication types

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Short-lived bearer credential held by the cache
#[derive(Debug, Clone)]
pub struct Credential {
    /// Opaque bearer token attached as `Authorization: Bearer <token>`
    pub token: String,

    /// Absolute instant after which the cache treats the token as expired.
    /// Set by the cache at store time, not by the provider.
    pub usable_until: DateTime<Utc>,
}

impl Credential {
    /// Whether the credential can still be attached to a request without
    /// risking expiry mid-flight
    pub fn is_usable(&self, now: DateTime<Utc>, safety_buffer: Duration) -> bool {
        now < self.usable_until - safety_buffer
    }
}

/// The currently signed-in user the credential is issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,

    /// Long-lived token exchanged with the provider for short-lived
    /// credentials; persisted outside this component
    pub refresh_token: String,
}

/// Token data from a successful mint
#[derive(Debug, Clone)]
pub struct TokenData {
    pub access_token: String,

    /// New long-lived token when the provider rotates it
    pub refresh_token: Option<String>,

    /// Provider-stated validity in seconds, when given
    pub expires_in: Option<u64>,
}

/// Identity provider failure
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Provider unreachable or the transport failed
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider rejected refresh: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// Provider response could not be interpreted
    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Source of fresh bearer credentials
///
/// `force_fresh` instructs the provider to bypass any caching of its own
/// and mint a brand-new credential.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn mint(&self, identity: &Identity, force_fresh: bool)
        -> Result<TokenData, ProviderError>;
}

/// Shared handle to the signed-in identity
///
/// Cheap to clone; both pipelines observe the same state.
#[derive(Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Identity>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, identity: Identity) {
        let mut current = self.inner.write().await;
        tracing::info!(user_id = %identity.user_id, "Identity signed in");
        *current = Some(identity);
    }

    pub async fn sign_out(&self) {
        let mut current = self.inner.write().await;
        if let Some(identity) = current.take() {
            tracing::info!(user_id = %identity.user_id, "Identity signed out");
        }
    }

    /// Snapshot of the current identity, if any
    pub async fn current(&self) -> Option<Identity> {
        self.inner.read().await.clone()
    }
}

/// Wire shape of a token endpoint grant
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenGrantResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}
