use once_cell::sync::OnceCell;
use reqwest::{Method, Response};
use std::sync::Arc;

use crate::auth::{CredentialCache, CredentialSource, Session, TokenStore};
use crate::config::ClientConfig;
use crate::error::{HttpError, Result};
use crate::pipeline::RequestPipeline;

/// Which configured execution path a request goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineVariant {
    /// Default timeout, everyday calls
    Standard,

    /// Longer timeout for operations expected to take a while, such as
    /// larger aggregate computations
    Extended,
}

/// Entry point for feature code
///
/// Owns the composition: one credential cache, one session, and the two
/// pipeline variants, each built lazily at most once and reused.
pub struct ApiClient {
    config: ClientConfig,
    cache: Arc<CredentialCache>,
    session: Session,
    store: Arc<dyn TokenStore>,
    standard: OnceCell<RequestPipeline>,
    extended: OnceCell<RequestPipeline>,
}

impl ApiClient {
    pub fn new(
        config: ClientConfig,
        source: Arc<dyn CredentialSource>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let cache = Arc::new(CredentialCache::new(&config, source, store.clone()));

        Self {
            config,
            cache,
            session: Session::new(),
            store,
            standard: OnceCell::new(),
            extended: OnceCell::new(),
        }
    }

    /// The shared signed-in identity handle
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Send one logical request through the chosen pipeline variant
    pub async fn send(
        &self,
        variant: PipelineVariant,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        self.pipeline(variant)?.send(method, path, body).await
    }

    /// Build the variant's pipeline on first use, then reuse it
    fn pipeline(&self, variant: PipelineVariant) -> Result<&RequestPipeline> {
        let (cell, timeout, label) = match variant {
            PipelineVariant::Standard => {
                (&self.standard, self.config.request_timeout, "standard")
            }
            PipelineVariant::Extended => {
                (&self.extended, self.config.extended_timeout, "extended")
            }
        };

        cell.get_or_try_init(|| {
            tracing::debug!(pipeline = label, timeout_secs = timeout, "Building pipeline");
            RequestPipeline::new(
                &self.config,
                timeout,
                label,
                self.cache.clone(),
                self.session.clone(),
                self.store.clone(),
            )
        })
        .map_err(HttpError::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::auth::{Identity, ProviderError, TokenData};
    use async_trait::async_trait;

    struct StaticSource;

    #[async_trait]
    impl crate::auth::CredentialSource for StaticSource {
        async fn mint(
            &self,
            _identity: &Identity,
            _force_fresh: bool,
        ) -> std::result::Result<TokenData, ProviderError> {
            Ok(TokenData {
                access_token: "tok".to_string(),
                refresh_token: None,
                expires_in: Some(3600),
            })
        }
    }

    fn client() -> ApiClient {
        ApiClient::new(
            ClientConfig::new("http://api", "http://auth/token", "key"),
            Arc::new(StaticSource),
            Arc::new(MemoryTokenStore::new()),
        )
    }

    #[test]
    fn test_pipelines_are_memoized() {
        let client = client();

        let first = client.pipeline(PipelineVariant::Standard).unwrap() as *const _;
        let second = client.pipeline(PipelineVariant::Standard).unwrap() as *const _;
        assert_eq!(first, second);

        // The extended variant is its own instance
        let extended = client.pipeline(PipelineVariant::Extended).unwrap() as *const _;
        assert_ne!(first, extended);
    }
}
