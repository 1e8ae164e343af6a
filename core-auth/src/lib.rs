//! # Token Lifecycle Management
//!
//! Manages the OAuth 2.0 access/refresh token pair the application uses
//! against the storage API.
//!
//! ## Overview
//!
//! Four pieces, each depending only on the previous one:
//!
//! - [`CredentialStore`] owns the persisted keys for the credential record
//!   and the transient CSRF login state.
//! - [`build_authorization_url`] produces the redirect target for the
//!   authorization-code flow.
//! - [`TokenExchanger`] performs the two token endpoint grants and persists
//!   every successful result.
//! - [`AuthManager`] decides per call whether the cached token is still
//!   valid, must be refreshed, or a fresh authorization round-trip is
//!   needed.
//!
//! ## Features
//!
//! - Authorization-code flow with offline access (refresh token issuance)
//! - Transparent refresh inside a five-minute expiry safety buffer
//! - Single-flight refresh shared by concurrent callers
//! - Single-use CSRF state nonce, consumed on match and mismatch alike

pub mod config;
pub mod error;
pub mod manager;
pub mod oauth;
pub mod store;
pub mod types;

pub use config::{derive_redirect_uri, AuthConfig};
pub use error::{AuthError, Result};
pub use manager::{AuthManager, AuthManagerBuilder};
pub use oauth::{build_authorization_url, TokenExchanger};
pub use store::CredentialStore;
pub use types::{CredentialRecord, TokenSet, TokenStatus};
