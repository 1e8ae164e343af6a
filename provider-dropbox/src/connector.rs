//! Dropbox API connector
//!
//! Publishes ad assets to Dropbox and manages their shared links. Every
//! operation asks the auth manager for a valid access token first, so token
//! refresh and re-login policy stay out of this crate entirely.

use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use core_auth::AuthManager;

use crate::endpoints::{
    direct_download_url, upload_path, CREATE_SHARED_LINK_URL, FILE_DELETE_URL, FILE_UPLOAD_URL,
    GET_CURRENT_ACCOUNT_URL, LIST_SHARED_LINKS_URL,
};
use crate::error::{DropboxError, Result};
use crate::types::{
    ApiErrorBody, CreateSharedLinkRequest, DropboxAccount, DropboxFileMetadata,
    ListSharedLinksRequest, ListSharedLinksResponse, SharedLinkMetadata, UploadArgs,
};

/// Timeout for metadata and sharing calls.
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for uploads, which carry the full asset body.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Dropbox API connector
///
/// Uploads assets, deletes them, and resolves public direct-download links.
/// Requests are executed exactly once; a failed call surfaces as an error
/// and the caller decides whether to retry.
///
/// # Example
///
/// ```ignore
/// use provider_dropbox::DropboxConnector;
///
/// let connector = DropboxConnector::new(auth, http_client, clock);
/// let metadata = connector.upload("image", "banner.png", bytes).await?;
/// let link = connector.shareable_link(&metadata.path_display.unwrap()).await?;
/// ```
pub struct DropboxConnector {
    /// Token lifecycle manager consulted before every request.
    auth: Arc<AuthManager>,

    /// HTTP client for API requests.
    http_client: Arc<dyn HttpClient>,

    /// Clock used to timestamp upload paths.
    clock: Arc<dyn Clock>,
}

impl DropboxConnector {
    /// Create a new Dropbox connector.
    pub fn new(
        auth: Arc<AuthManager>,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            auth,
            http_client,
            clock,
        }
    }

    /// Upload an asset to the app folder.
    ///
    /// The remote path is `/ads/{file_type}/{timestamp}_{file_name}`, so two
    /// uploads of the same file land at distinct paths. The write mode is
    /// `add` with autorename; nothing is ever overwritten.
    #[instrument(skip(self, contents), fields(file_type = %file_type, file_name = %file_name))]
    pub async fn upload(
        &self,
        file_type: &str,
        file_name: &str,
        contents: Bytes,
    ) -> Result<DropboxFileMetadata> {
        let token = self.auth.get_valid_access_token().await?;

        let path = upload_path(file_type, self.clock.unix_timestamp_millis(), file_name);
        let args = UploadArgs::for_path(path);
        let api_arg = serde_json::to_string(&args).map_err(|e| {
            DropboxError::ParseError(format!("Failed to encode upload arguments: {}", e))
        })?;

        info!(size = contents.len(), "Uploading asset to Dropbox");

        let request = HttpRequest::new(HttpMethod::Post, FILE_UPLOAD_URL)
            .bearer_token(&token)
            .header("Dropbox-API-Arg", api_arg)
            .header("Content-Type", "application/octet-stream")
            .body(contents)
            .timeout(UPLOAD_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(Self::api_error(&response));
        }

        let metadata: DropboxFileMetadata = serde_json::from_slice(&response.body)
            .map_err(|e| DropboxError::ParseError(format!("Failed to parse upload response: {}", e)))?;

        info!(id = %metadata.id, "Upload complete");
        Ok(metadata)
    }

    /// Delete the file at `path`.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        let token = self.auth.get_valid_access_token().await?;

        let body = serde_json::json!({ "path": path });
        let request = HttpRequest::new(HttpMethod::Post, FILE_DELETE_URL)
            .bearer_token(&token)
            .json(&body)?
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(Self::api_error(&response));
        }

        info!("Deleted remote file");
        Ok(())
    }

    /// Resolve a public direct-download link for the file at `path`.
    ///
    /// Creates a shared link with `public` visibility. Dropbox answers 409
    /// when a link already exists for the path; in that case the existing
    /// link is looked up instead. Either way the returned URL has its `dl`
    /// flag set to `1` so it serves the file bytes, not a preview page.
    #[instrument(skip(self), fields(path = %path))]
    pub async fn shareable_link(&self, path: &str) -> Result<String> {
        let token = self.auth.get_valid_access_token().await?;

        let body = CreateSharedLinkRequest::public(path.to_string());
        let request = HttpRequest::new(HttpMethod::Post, CREATE_SHARED_LINK_URL)
            .bearer_token(&token)
            .json(&body)?
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;

        if response.is_success() {
            let link: SharedLinkMetadata = serde_json::from_slice(&response.body).map_err(|e| {
                DropboxError::ParseError(format!("Failed to parse shared link response: {}", e))
            })?;
            return Ok(direct_download_url(&link.url));
        }

        if response.status == 409 {
            debug!("Shared link already exists, listing existing links");
            return self.existing_link(&token, path).await;
        }

        Err(Self::api_error(&response))
    }

    /// Look up the already-created shared link for `path`.
    async fn existing_link(&self, token: &str, path: &str) -> Result<String> {
        let body = ListSharedLinksRequest {
            path: path.to_string(),
            direct_only: true,
        };
        let request = HttpRequest::new(HttpMethod::Post, LIST_SHARED_LINKS_URL)
            .bearer_token(token)
            .json(&body)?
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(Self::api_error(&response));
        }

        let listing: ListSharedLinksResponse = serde_json::from_slice(&response.body)
            .map_err(|e| {
                DropboxError::ParseError(format!("Failed to parse shared links list: {}", e))
            })?;

        match listing.links.into_iter().next() {
            Some(link) => Ok(direct_download_url(&link.url)),
            None => Err(DropboxError::ApiError {
                status_code: 409,
                message: "shared link conflict reported but no existing link was found"
                    .to_string(),
            }),
        }
    }

    /// Fetch the account that owns the current token.
    #[instrument(skip(self))]
    pub async fn current_account(&self) -> Result<DropboxAccount> {
        let token = self.auth.get_valid_access_token().await?;

        let request = HttpRequest::new(HttpMethod::Post, GET_CURRENT_ACCOUNT_URL)
            .bearer_token(&token)
            .timeout(API_TIMEOUT);

        let response = self.http_client.execute(request).await?;
        if !response.is_success() {
            return Err(Self::api_error(&response));
        }

        serde_json::from_slice(&response.body)
            .map_err(|e| DropboxError::ParseError(format!("Failed to parse account response: {}", e)))
    }

    /// Build an `ApiError` from a non-success response.
    ///
    /// Prefers the `error_summary` tag when the body is the standard Dropbox
    /// error envelope, and falls back to the raw body otherwise.
    fn api_error(response: &HttpResponse) -> DropboxError {
        let message = serde_json::from_slice::<ApiErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.error_summary)
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).to_string());

        warn!(status = response.status, %message, "Dropbox API request failed");
        DropboxError::ApiError {
            status_code: response.status,
            message,
        }
    }
}
