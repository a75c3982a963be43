//! Opaque credential source for the cloud API
//!
//! Token acquisition and refresh live outside this crate (the vendor uses a
//! hosted identity provider). The sync core only asks for a currently valid
//! bearer token and treats any failure to produce one as `Unauthorized`.

use crate::error::{Result, StratusError};
use async_trait::async_trait;

/// Supplies a valid bearer token on demand
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Return a currently valid access token
    async fn access_token(&self) -> Result<String>;
}

/// Fixed-token provider for setups where the token is issued externally.
///
/// Reads the token from configuration, with the STRATUS_ACCESS_TOKEN
/// environment variable taking precedence.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Build from config, honoring the environment override
    pub fn from_config(config: &crate::config::Config) -> Self {
        let token = std::env::var("STRATUS_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| config.access_token.clone());
        Self::new(token)
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(StratusError::unauthorized("no access token configured"));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_provider_returns_token() {
        let provider = StaticTokenProvider::new("abc123");
        assert_eq!(provider.access_token().await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn empty_token_is_unauthorized() {
        let provider = StaticTokenProvider::new("  ");
        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, StratusError::Unauthorized { .. }));
    }
}
