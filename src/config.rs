use anyhow::{Context, Result};

/// Client configuration
///
/// Immutable after construction; shared by both pipeline variants.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base address of the Mealtrack API
    pub base_url: String,

    /// Identity provider token endpoint (refresh grant)
    pub token_url: String,

    /// API key appended to token endpoint requests
    pub provider_api_key: String,

    // Timeouts (seconds)
    pub connect_timeout: u64,
    pub request_timeout: u64,
    pub extended_timeout: u64,

    /// Margin subtracted from a credential's expiry so a token never
    /// expires mid-request (seconds)
    pub credential_safety_buffer: u64,

    /// Validity window assumed when the provider omits expiresIn (seconds)
    pub credential_validity: u64,
}

impl ClientConfig {
    /// Create a configuration with defaults for everything but the addresses
    pub fn new(
        base_url: impl Into<String>,
        token_url: impl Into<String>,
        provider_api_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            token_url: token_url.into(),
            provider_api_key: provider_api_key.into(),
            connect_timeout: 10,
            request_timeout: 30,
            extended_timeout: 120,
            credential_safety_buffer: 300,
            credential_validity: 3600,
        }
    }

    /// Load configuration from the environment with priority: ENV > defaults
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let base_url = std::env::var("MEALTRACK_API_BASE_URL")
            .context("MEALTRACK_API_BASE_URL is required")?;

        let token_url = std::env::var("MEALTRACK_TOKEN_URL")
            .context("MEALTRACK_TOKEN_URL is required")?;

        let provider_api_key = std::env::var("MEALTRACK_PROVIDER_API_KEY")
            .context("MEALTRACK_PROVIDER_API_KEY is required")?;

        let mut config = Self::new(base_url, token_url, provider_api_key);

        config.connect_timeout = env_u64("HTTP_CONNECT_TIMEOUT", config.connect_timeout);
        config.request_timeout = env_u64("HTTP_REQUEST_TIMEOUT", config.request_timeout);
        config.extended_timeout = env_u64("HTTP_EXTENDED_TIMEOUT", config.extended_timeout);
        config.credential_safety_buffer =
            env_u64("CREDENTIAL_SAFETY_BUFFER", config.credential_safety_buffer);
        config.credential_validity = env_u64("CREDENTIAL_VALIDITY", config.credential_validity);

        Ok(config)
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(
            "https://api.mealtrack.example",
            "https://auth.mealtrack.example/token",
            "key-123",
        );

        assert_eq!(config.connect_timeout, 10);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.extended_timeout, 120);
        assert_eq!(config.credential_safety_buffer, 300);
        assert_eq!(config.credential_validity, 3600);
    }

    #[test]
    fn test_env_u64_fallback() {
        assert_eq!(env_u64("MEALTRACK_UNSET_VARIABLE_FOR_TEST", 42), 42);
    }
}
