//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations using
//! desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//! - `KeyValueStore` using a SQLite-backed table
//! - `SecretProvider` reading the process environment
//!
//! Hosts supply their own [`Navigator`](bridge_traits::Navigator): how the
//! redirect to the authorization endpoint is presented (system browser,
//! embedded webview) is an application decision, not a platform one.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{EnvSecretProvider, ReqwestHttpClient, SqliteKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let store = SqliteKeyValueStore::new("data/app.db".into()).await?;
//!     let secrets = EnvSecretProvider::new();
//!
//!     // Wire into core_auth::AuthManager::builder()
//! }
//! ```

mod http;
mod secrets;
mod storage;

pub use http::ReqwestHttpClient;
pub use secrets::{EnvSecretProvider, CLIENT_SECRET_ENV};
pub use storage::SqliteKeyValueStore;
