//! # Dropbox Provider
//!
//! Dropbox storage connector for the asset platform. Uploads ad assets into
//! a per-type folder layout, deletes them, and resolves public
//! direct-download links for publishing.
//!
//! Authentication is delegated to [`core_auth::AuthManager`]; the connector
//! requests a valid access token before every call and never caches one.
//!
//! ## Features
//!
//! - Timestamped uploads under `/ads/{file_type}/` so names never collide
//! - Shared-link creation with a fallback to the existing link on conflict
//! - Direct-download URL rewriting (`?dl=0` to `?dl=1`)
//! - Account lookup for the signed-in user

pub mod connector;
pub mod endpoints;
pub mod error;
pub mod types;

pub use connector::DropboxConnector;
pub use error::{DropboxError, Result};
pub use types::{DropboxAccount, DropboxFileMetadata, SharedLinkMetadata};
