// External persisted-token store boundary
//
// On-device persistence itself lives outside this component; the pipelines
// only ever signal it through this trait.

use async_trait::async_trait;
use tokio::sync::RwLock;

/// Store for the long-lived token persisted outside this process
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist a rotated long-lived token
    async fn store_credential(&self, token: &str);

    /// Drop all persisted tokens; called when forced refresh fails and the
    /// identity must be treated as unauthenticated
    async fn clear_all(&self);
}

/// In-memory store, the only implementation shipped with this crate
#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stored(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn store_credential(&self, token: &str) {
        tracing::debug!("Persisting rotated refresh token");
        let mut slot = self.token.write().await;
        *slot = Some(token.to_string());
    }

    async fn clear_all(&self) {
        tracing::warn!("Clearing persisted tokens");
        let mut slot = self.token.write().await;
        *slot = None;
    }
}
