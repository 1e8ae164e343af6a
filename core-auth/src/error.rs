use thiserror::Error;

/// Errors produced by the token lifecycle.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Client id, secret, or endpoint configuration is missing or unusable.
    /// Blocks all token operations until fixed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The `state` returned by the authorization server did not match the
    /// pending login attempt. The stored nonce has already been discarded;
    /// the flow must restart with a fresh one.
    #[error("authorization state did not match the pending login attempt")]
    CsrfValidation,

    /// The token endpoint rejected an authorization-code exchange.
    #[error("authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    /// The token endpoint rejected a refresh, or the refresh never reached
    /// it. `permanent` is true when the server answered with a client error,
    /// meaning the refresh token itself is likely invalid or revoked.
    #[error("token refresh failed: {reason}")]
    RefreshFailed { reason: String, permanent: bool },

    /// No usable credentials exist and a redirect to the authorization
    /// endpoint has been started. Not a failure: the caller's operation is
    /// incomplete and resumes after the callback handler runs.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The credential storage medium failed.
    #[error("credential storage error: {0}")]
    Storage(String),

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
