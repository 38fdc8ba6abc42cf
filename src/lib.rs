// Mealtrack client - HTTP access layer with credential caching

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;

pub use auth::{
    Credential, CredentialCache, CredentialSource, Identity, MemoryTokenStore, ProviderError,
    Session, TokenData, TokenEndpoint, TokenStore,
};
pub use client::{ApiClient, PipelineVariant};
pub use config::ClientConfig;
pub use error::{HttpError, StatusClass};
pub use reqwest::Method;
