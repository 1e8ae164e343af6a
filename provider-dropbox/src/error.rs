//! Error types for the Dropbox provider.

use thiserror::Error;

/// Errors surfaced by Dropbox operations.
#[derive(Error, Debug)]
pub enum DropboxError {
    /// Token acquisition failed. Carries the auth layer's error unchanged so
    /// callers can still distinguish a required re-login from a transient
    /// refresh failure.
    #[error(transparent)]
    Auth(#[from] core_auth::AuthError),

    /// Dropbox answered with a non-success status.
    #[error("Dropbox API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// A response body did not match the expected shape.
    #[error("Failed to parse Dropbox response: {0}")]
    ParseError(String),

    /// The host transport failed before a response arrived.
    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

/// Result alias for Dropbox operations.
pub type Result<T> = std::result::Result<T, DropboxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;

    #[test]
    fn test_api_error_display_includes_status_and_message() {
        let error = DropboxError::ApiError {
            status_code: 409,
            message: "shared_link_already_exists/metadata/".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Dropbox API error (status 409): shared_link_already_exists/metadata/"
        );
    }

    #[test]
    fn test_auth_error_converts_and_keeps_its_message() {
        let error: DropboxError = core_auth::AuthError::AuthenticationRequired.into();
        assert!(matches!(
            error,
            DropboxError::Auth(core_auth::AuthError::AuthenticationRequired)
        ));
    }

    #[test]
    fn test_bridge_error_converts() {
        let error: DropboxError =
            BridgeError::OperationFailed("connection reset".to_string()).into();
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn test_parse_error_display() {
        let error = DropboxError::ParseError("missing field `url`".to_string());
        assert_eq!(
            error.to_string(),
            "Failed to parse Dropbox response: missing field `url`"
        );
    }
}
