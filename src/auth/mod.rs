// Authentication module
//
// Credential caching, identity provider access, and the session handle
// shared by both request pipelines.

mod cache;
mod provider;
mod store;
mod types;

pub use cache::CredentialCache;
pub use provider::TokenEndpoint;
pub use store::{MemoryTokenStore, TokenStore};
pub use types::{Credential, CredentialSource, Identity, ProviderError, Session, TokenData};
