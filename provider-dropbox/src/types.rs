//! Wire types for the Dropbox v2 API.
//!
//! Dropbox already speaks snake_case JSON, so these map directly without
//! field renaming. Fields the platform never reads are omitted; serde
//! ignores unknown fields by default.

use serde::{Deserialize, Serialize};

/// Arguments for `files/upload`, sent JSON-encoded in the
/// `Dropbox-API-Arg` header rather than the request body.
#[derive(Debug, Clone, Serialize)]
pub struct UploadArgs {
    /// Destination path in the app folder, e.g. `/ads/image/1700000000000_banner.png`.
    pub path: String,
    /// Write mode. Always `add` so existing files are never overwritten.
    pub mode: String,
    /// Renames on conflict instead of failing the upload.
    pub autorename: bool,
    /// Suppresses client notifications for the write.
    pub mute: bool,
}

impl UploadArgs {
    /// Standard arguments for an asset upload to `path`.
    pub fn for_path(path: String) -> Self {
        Self {
            path,
            mode: "add".to_string(),
            autorename: true,
            mute: false,
        }
    }
}

/// Metadata returned for an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct DropboxFileMetadata {
    /// Opaque file identifier, e.g. `id:a4ayc_80_OEAAAAAAAAAXw`.
    pub id: String,
    /// File name including extension.
    pub name: String,
    /// Lowercased full path, absent for certain metadata variants.
    #[serde(default)]
    pub path_lower: Option<String>,
    /// Display path with original casing.
    #[serde(default)]
    pub path_display: Option<String>,
    /// Server modification time in ISO 8601.
    #[serde(default)]
    pub server_modified: Option<String>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Dropbox content hash of the uploaded bytes.
    #[serde(default)]
    pub content_hash: Option<String>,
}

/// Settings for `sharing/create_shared_link_with_settings`.
#[derive(Debug, Clone, Serialize)]
pub struct SharedLinkSettings {
    /// Who can view the link. Assets are always published `public`.
    pub requested_visibility: String,
}

/// Request body for `sharing/create_shared_link_with_settings`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateSharedLinkRequest {
    pub path: String,
    pub settings: SharedLinkSettings,
}

impl CreateSharedLinkRequest {
    /// A public shared link request for `path`.
    pub fn public(path: String) -> Self {
        Self {
            path,
            settings: SharedLinkSettings {
                requested_visibility: "public".to_string(),
            },
        }
    }
}

/// Request body for `sharing/list_shared_links`.
#[derive(Debug, Clone, Serialize)]
pub struct ListSharedLinksRequest {
    pub path: String,
    /// Restricts results to links on the path itself, not parent folders.
    pub direct_only: bool,
}

/// A single shared link as returned by the sharing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SharedLinkMetadata {
    /// Preview URL ending in `?dl=0`.
    pub url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_lower: Option<String>,
}

/// Response for `sharing/list_shared_links`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSharedLinksResponse {
    pub links: Vec<SharedLinkMetadata>,
    #[serde(default)]
    pub has_more: bool,
}

/// Name block inside an account record.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountName {
    pub display_name: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
}

/// Response for `users/get_current_account`.
#[derive(Debug, Clone, Deserialize)]
pub struct DropboxAccount {
    /// Stable account identifier, e.g. `dbid:AAH4f99T0taONIb-OurWxbNQ6ywGRopQngc`.
    pub account_id: String,
    pub email: String,
    pub name: AccountName,
}

/// Error envelope returned by Dropbox on non-success statuses.
///
/// `error_summary` is a dotted tag path such as
/// `shared_link_already_exists/metadata/`. The structured `error` object is
/// not modeled; the summary is enough to classify and report failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error_summary: Option<String>,
}
