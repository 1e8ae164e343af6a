//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the token lifecycle core and
//! platform-specific implementations. Each trait is a capability the core
//! requires but that looks different per host (desktop shell, web page).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with TLS
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - String key-value scopes
//!   (persistent credentials, session state)
//!
//! ### Platform Integration
//! - [`Navigator`](navigation::Navigator) - Redirect mechanism for the
//!   authorization round-trip
//! - [`SecretProvider`](secrets::SecretProvider) - Interactive client-secret
//!   fallback
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing, naming the capability and what the host must inject.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Platform implementations should:
//!
//! - Convert platform-specific errors to `BridgeError`
//! - Provide actionable error messages
//! - Include error context (e.g., key names, network status)
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod navigation;
pub mod secrets;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use navigation::Navigator;
pub use secrets::{NoInteractiveSecrets, SecretProvider};
pub use storage::{KeyValueStore, MemoryKeyValueStore};
pub use time::{Clock, SystemClock};
