// Identity provider token endpoint client

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::{
    CredentialSource, Identity, ProviderError, TokenData, TokenGrantResponse,
};
use crate::config::ClientConfig;

/// Production `CredentialSource`: exchanges the identity's long-lived token
/// for a short-lived bearer credential via a refresh grant
pub struct TokenEndpoint {
    client: Client,
    token_url: String,
    api_key: String,
}

impl TokenEndpoint {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .context("Failed to create provider HTTP client")?;

        Ok(Self {
            client,
            token_url: config.token_url.clone(),
            api_key: config.provider_api_key.clone(),
        })
    }

    async fn refresh_grant(
        &self,
        identity: &Identity,
        force_fresh: bool,
    ) -> Result<TokenData, ProviderError> {
        tracing::debug!(
            user_id = %identity.user_id,
            force_fresh,
            "Requesting credential from token endpoint"
        );

        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", identity.refresh_token.as_str()),
        ];
        // Tells the provider to skip its own token cache
        if force_fresh {
            form.push(("force_refresh", "true"));
        }

        let response = self
            .client
            .post(&self.token_url)
            .query(&[("key", self.api_key.as_str())])
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                message = %message,
                "Token endpoint rejected refresh"
            );
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let grant: TokenGrantResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        if grant.access_token.is_empty() {
            return Err(ProviderError::Malformed(
                "grant does not contain an access token".to_string(),
            ));
        }

        tracing::info!(
            expires_in = ?grant.expires_in,
            rotated = grant.refresh_token.is_some(),
            "Credential minted"
        );

        Ok(TokenData {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_in: grant.expires_in,
        })
    }
}

#[async_trait]
impl CredentialSource for TokenEndpoint {
    async fn mint(
        &self,
        identity: &Identity,
        force_fresh: bool,
    ) -> Result<TokenData, ProviderError> {
        self.refresh_grant(identity, force_fresh).await
    }
}
