use std::sync::Arc;

use bridge_traits::KeyValueStore;
use tracing::warn;

use crate::error::{AuthError, Result};
use crate::types::{CredentialRecord, TokenSet};

const ACCESS_TOKEN_KEY: &str = "dropbox_access_token";
const REFRESH_TOKEN_KEY: &str = "dropbox_refresh_token";
const TOKEN_EXPIRY_KEY: &str = "dropbox_token_expiry";
const LOGIN_STATE_KEY: &str = "dropbox_oauth_state";

/// Typed accessor over the storage media. Owns the canonical keys; nothing
/// else in the crate touches the key-value layer directly.
///
/// Two scopes back it. The persistent scope survives restarts and is shared
/// by every context of the same origin, so credential writes are
/// last-write-wins. The session scope holds only the CSRF login state and
/// ends with the session.
///
/// There is no in-memory cache: every read reflects the latest persisted
/// state, including writes made by another tab.
pub struct CredentialStore {
    persistent: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(persistent: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            session,
        }
    }

    /// Reads the full credential record. An expiry value that does not
    /// parse as epoch milliseconds is removed and reported as absent, which
    /// downgrades the record to the expired path instead of failing it.
    pub async fn load(&self) -> Result<CredentialRecord> {
        let access_token = self
            .persistent
            .get(ACCESS_TOKEN_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let refresh_token = self
            .persistent
            .get(REFRESH_TOKEN_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        let raw_expiry = self
            .persistent
            .get(TOKEN_EXPIRY_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let expires_at_millis = match raw_expiry {
            None => None,
            Some(raw) => match raw.parse::<i64>() {
                Ok(millis) => Some(millis),
                Err(_) => {
                    warn!(
                        key = TOKEN_EXPIRY_KEY,
                        "stored expiry is not a timestamp; discarding it"
                    );
                    self.persistent
                        .remove(TOKEN_EXPIRY_KEY)
                        .await
                        .map_err(|e| AuthError::Storage(e.to_string()))?;
                    None
                }
            },
        };

        Ok(CredentialRecord {
            access_token,
            refresh_token,
            expires_at_millis,
        })
    }

    /// Persists a token endpoint result. A result without a refresh token
    /// leaves the stored refresh token in place; only
    /// [`clear_credentials`](Self::clear_credentials) removes it.
    pub async fn persist_tokens(&self, tokens: &TokenSet) -> Result<()> {
        self.persistent
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        self.persistent
            .set(TOKEN_EXPIRY_KEY, &tokens.expires_at_millis.to_string())
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if let Some(refresh_token) = &tokens.refresh_token {
            self.persistent
                .set(REFRESH_TOKEN_KEY, refresh_token)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// Removes the whole credential record. Safe to call when nothing is
    /// stored.
    pub async fn clear_credentials(&self) -> Result<()> {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY] {
            self.persistent
                .remove(key)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    /// Stores the CSRF nonce for the login attempt being started. A second
    /// attempt overwrites the first, which then fails validation on its
    /// callback.
    pub async fn store_login_state(&self, state: &str) -> Result<()> {
        self.session
            .set(LOGIN_STATE_KEY, state)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    /// Takes the pending CSRF nonce, removing it in the same step. The
    /// nonce is gone after this call no matter how the comparison turns
    /// out, so a captured callback URL cannot be replayed.
    pub async fn take_login_state(&self) -> Result<Option<String>> {
        let state = self
            .session
            .get(LOGIN_STATE_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        if state.is_some() {
            self.session
                .remove(LOGIN_STATE_KEY)
                .await
                .map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(state)
    }
}
