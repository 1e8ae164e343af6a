//! Client Secret from the Process Environment

use async_trait::async_trait;
use bridge_traits::{error::Result, secrets::SecretProvider};
use tracing::debug;

/// Environment variable consulted for the confidential client secret.
pub const CLIENT_SECRET_ENV: &str = "DROPBOX_CLIENT_SECRET";

/// Reads the client secret from the process environment on every request,
/// so a rotated value is picked up without a restart. Supplies nothing when
/// the variable is unset or blank.
pub struct EnvSecretProvider {
    var_name: String,
}

impl EnvSecretProvider {
    pub fn new() -> Self {
        Self {
            var_name: CLIENT_SECRET_ENV.to_string(),
        }
    }

    /// Use a different variable name. Mostly for tests, which need isolated
    /// variables to avoid cross-test interference.
    pub fn with_var(var_name: impl Into<String>) -> Self {
        Self {
            var_name: var_name.into(),
        }
    }
}

impl Default for EnvSecretProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn client_secret(&self) -> Result<Option<String>> {
        match std::env::var(&self.var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            _ => {
                debug!(var = %self.var_name, "No client secret in the environment");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_secret_from_environment() {
        std::env::set_var("TEST_SECRET_PRESENT", "hunter2");
        let provider = EnvSecretProvider::with_var("TEST_SECRET_PRESENT");

        assert_eq!(
            provider.client_secret().await.unwrap(),
            Some("hunter2".to_string())
        );
    }

    #[tokio::test]
    async fn test_unset_variable_yields_none() {
        let provider = EnvSecretProvider::with_var("TEST_SECRET_UNSET");
        assert_eq!(provider.client_secret().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_variable_yields_none() {
        std::env::set_var("TEST_SECRET_BLANK", "   ");
        let provider = EnvSecretProvider::with_var("TEST_SECRET_BLANK");

        assert_eq!(provider.client_secret().await.unwrap(), None);
    }
}
