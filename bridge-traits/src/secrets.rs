//! Client Secret Acquisition
//!
//! Confidential-client deployments configure the OAuth client secret
//! statically. Deployments that refuse to embed it obtain it from the user
//! at exchange time instead. This trait is that fallback, kept out of the
//! exchange logic so the prompt mechanism stays a host concern.

use async_trait::async_trait;

use crate::error::Result;

/// Source of the OAuth client secret
///
/// Implementations must never persist the secret; it is requested again
/// for every exchange that needs it.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Produce the client secret, `Ok(None)` if the user/host has none
    async fn client_secret(&self) -> Result<Option<String>>;
}

/// Provider for hosts without an interactive channel
///
/// Always answers `None`, which the exchange logic reports as a
/// configuration problem.
#[derive(Debug, Clone, Default)]
pub struct NoInteractiveSecrets;

#[async_trait]
impl SecretProvider for NoInteractiveSecrets {
    async fn client_secret(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_interactive_secrets_answers_none() {
        let provider = NoInteractiveSecrets;
        assert_eq!(provider.client_secret().await.unwrap(), None);
    }
}
