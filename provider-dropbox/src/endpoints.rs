//! Dropbox API endpoints and path conventions.
//!
//! Content operations (uploads) go to `content.dropboxapi.com`, everything
//! else to `api.dropboxapi.com`. All calls are POST per the Dropbox v2 API.

/// Upload endpoint. Expects a `Dropbox-API-Arg` header and a raw body.
pub const FILE_UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";

/// Deletes a file or folder at a given path.
pub const FILE_DELETE_URL: &str = "https://api.dropboxapi.com/2/files/delete_v2";

/// Creates a shared link with explicit visibility settings.
pub const CREATE_SHARED_LINK_URL: &str =
    "https://api.dropboxapi.com/2/sharing/create_shared_link_with_settings";

/// Lists existing shared links for a path.
pub const LIST_SHARED_LINKS_URL: &str = "https://api.dropboxapi.com/2/sharing/list_shared_links";

/// Returns account information for the token's owner.
pub const GET_CURRENT_ACCOUNT_URL: &str =
    "https://api.dropboxapi.com/2/users/get_current_account";

/// Builds the remote path for an uploaded asset.
///
/// Assets are grouped by type under `/ads`, and the upload timestamp is
/// prefixed to the file name so repeated uploads of the same file never
/// collide.
pub fn upload_path(file_type: &str, timestamp_millis: i64, file_name: &str) -> String {
    format!("/ads/{file_type}/{timestamp_millis}_{file_name}")
}

/// Rewrites a shared link into a direct-download URL.
///
/// Dropbox shared links end in `?dl=0`, which renders a preview page.
/// Flipping the flag to `dl=1` makes the link serve the file bytes directly.
pub fn direct_download_url(shared_url: &str) -> String {
    shared_url.replace("?dl=0", "?dl=1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_path_groups_by_type_and_prefixes_timestamp() {
        let path = upload_path("image", 1_700_000_000_000, "banner.png");
        assert_eq!(path, "/ads/image/1700000000000_banner.png");
    }

    #[test]
    fn test_upload_path_keeps_file_name_extension() {
        let path = upload_path("video", 42, "clip.mp4");
        assert!(path.ends_with("_clip.mp4"));
        assert!(path.starts_with("/ads/video/"));
    }

    #[test]
    fn test_direct_download_url_flips_dl_flag() {
        let url = direct_download_url("https://www.dropbox.com/s/abc123/banner.png?dl=0");
        assert_eq!(url, "https://www.dropbox.com/s/abc123/banner.png?dl=1");
    }

    #[test]
    fn test_direct_download_url_leaves_other_urls_alone() {
        let url = direct_download_url("https://www.dropbox.com/s/abc123/banner.png?dl=1");
        assert_eq!(url, "https://www.dropbox.com/s/abc123/banner.png?dl=1");
    }
}
