use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::auth::{Credential, CredentialCache, Session, TokenStore};
use crate::config::ClientConfig;
use crate::error::{HttpError, Result};

/// Per-logical-request retry state
///
/// A logical request may be resubmitted at most once; the marker is set
/// before any further async work so interleaved completions of the same
/// request cannot trigger a duplicate refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RetryMarker {
    FirstAttempt,
    Retried,
}

/// One configured HTTP execution path
///
/// Fixed base address, default headers, and timeout; the standard and
/// extended variants differ only in timeout and share the credential cache.
pub struct RequestPipeline {
    /// HTTP client with connection pooling and the variant's timeout
    client: Client,

    base_url: String,

    /// Shared credential state, read before send and refreshed on 401
    cache: Arc<CredentialCache>,

    /// Signed-in identity handle
    session: Session,

    /// External persisted-token store, cleared on terminal auth failure
    store: Arc<dyn TokenStore>,

    /// Variant name for logs
    variant: &'static str,
}

impl RequestPipeline {
    pub fn new(
        config: &ClientConfig,
        request_timeout: u64,
        variant: &'static str,
        cache: Arc<CredentialCache>,
        session: Session,
        store: Arc<dyn TokenStore>,
    ) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("mealtrack-client/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache,
            session,
            store,
            variant,
        })
    }

    /// Execute one logical request, inclusive of any single automatic retry
    ///
    /// Outgoing stage: resolve a credential for the current identity and
    /// attach it as a bearer header; absent identity or a failed fetch sends
    /// the request unauthenticated. Incoming stage: a first 401 triggers one
    /// forced refresh and resubmission; everything else passes through.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let request_id = Uuid::new_v4();
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        // The identity is snapshotted once; the whole logical request,
        // retry included, is bound to it.
        let identity = self.session.current().await;
        let mut credential = self.cache.resolve(identity.as_ref()).await;
        let mut marker = RetryMarker::FirstAttempt;

        tracing::debug!(
            request_id = %request_id,
            pipeline = self.variant,
            method = %method,
            url = %url,
            authenticated = credential.is_some(),
            "Sending HTTP request"
        );

        loop {
            let response = self
                .execute(&method, &url, body.as_ref(), credential.as_ref())
                .await
                .map_err(HttpError::from_transport)?;

            let status = response.status();
            if status.is_success() {
                tracing::debug!(
                    request_id = %request_id,
                    status = %status,
                    "Request successful"
                );
                return Ok(response);
            }

            if status == StatusCode::UNAUTHORIZED && marker == RetryMarker::FirstAttempt {
                if let Some(id) = identity.as_ref() {
                    // Mark before any further await so a concurrent observer
                    // of this logical request cannot start a second cycle.
                    marker = RetryMarker::Retried;

                    let original = response.text().await.unwrap_or_default();
                    tracing::warn!(
                        request_id = %request_id,
                        pipeline = self.variant,
                        "Received 401, forcing credential refresh and resubmitting"
                    );

                    match self.cache.force_refresh(id).await {
                        Ok(fresh) => {
                            credential = Some(fresh);
                            continue;
                        }
                        Err(e) => {
                            tracing::error!(
                                request_id = %request_id,
                                error = %e,
                                "Forced refresh failed, surfacing original auth failure"
                            );
                            self.cache.invalidate().await;
                            self.store.clear_all().await;
                            return Err(HttpError::Auth {
                                status: StatusCode::UNAUTHORIZED.as_u16(),
                                message: original,
                            });
                        }
                    }
                }
            }

            let message = response.text().await.unwrap_or_default();
            tracing::warn!(
                request_id = %request_id,
                status = %status,
                message = %message,
                retried = marker == RetryMarker::Retried,
                "Request failed"
            );
            return Err(HttpError::from_status(status, message));
        }
    }

    async fn execute(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
        credential: Option<&Credential>,
    ) -> reqwest::Result<Response> {
        let mut builder = self.client.request(method.clone(), url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(&credential.token);
        }
        builder.send().await
    }
}
