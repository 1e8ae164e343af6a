use std::fmt;

use url::Url;

use crate::error::{AuthError, Result};

/// Authorization endpoint used for the browser redirect.
pub const DROPBOX_AUTHORIZE_URL: &str = "https://www.dropbox.com/oauth2/authorize";
/// Token endpoint used for code exchange and refresh.
pub const DROPBOX_TOKEN_URL: &str = "https://api.dropboxapi.com/oauth2/token";
/// Fixed callback document appended to the host page's directory.
pub const CALLBACK_PAGE: &str = "oauth-callback.html";

// Ships in sample configs; never a real app key.
const PLACEHOLDER_CLIENT_ID: &str = "YOUR_DROPBOX_CLIENT_ID";

/// Immutable OAuth client configuration, constructed once at startup and
/// passed explicitly to the components that need it. Validation happens
/// here so a misconfigured deployment fails before the first token call.
#[derive(Clone)]
pub struct AuthConfig {
    pub client_id: String,
    /// Confidential client secret. When absent, the exchanger asks its
    /// [`SecretProvider`](bridge_traits::SecretProvider) before each call.
    pub client_secret: Option<String>,
    /// Must exactly match a redirect URI registered with the server.
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl AuthConfig {
    /// Creates a configuration for the hosted endpoints. Rejects an empty
    /// or placeholder client id and a relative redirect URI.
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Result<Self> {
        let client_id = client_id.into();
        if client_id.is_empty() || client_id == PLACEHOLDER_CLIENT_ID {
            return Err(AuthError::Configuration(
                "client id is not set; register the application and configure its app key"
                    .to_string(),
            ));
        }

        let redirect_uri = redirect_uri.into();
        Url::parse(&redirect_uri).map_err(|e| {
            AuthError::Configuration(format!(
                "redirect URI {redirect_uri:?} is not an absolute URL: {e}"
            ))
        })?;

        Ok(Self {
            client_id,
            client_secret: None,
            redirect_uri,
            authorize_url: DROPBOX_AUTHORIZE_URL.to_string(),
            token_url: DROPBOX_TOKEN_URL.to_string(),
        })
    }

    /// Statically configures the confidential client secret.
    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Overrides both endpoints. Intended for tests and self-hosted mock
    /// servers; production callers keep the defaults.
    pub fn with_endpoints(
        mut self,
        authorize_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("redirect_uri", &self.redirect_uri)
            .field("authorize_url", &self.authorize_url)
            .field("token_url", &self.token_url)
            .finish()
    }
}

/// Relative locations of the host documents involved in the flow. Static
/// convention shared with the deployed site; hosts resolve these against
/// their own base URL when driving the navigator.
pub mod pages {
    /// Main application document.
    pub const MAIN: &str = "./index.html";
    /// Sign-in document that offers to start the authorization flow.
    pub const SIGN_IN: &str = "./auth.html";
    /// Document the authorization server redirects back to.
    pub const CALLBACK: &str = "./oauth-callback.html";
    /// Where the callback document sends the user after a completed login.
    pub const LOGIN_SUCCESS: &str = "./index.html?oauth=success";
    /// Where the callback document sends the user when the flow fails.
    pub const LOGIN_FAILURE: &str = "./index.html";
}

/// Derives the callback redirect URI from the URL of the currently loaded
/// document: the document segment is replaced by [`CALLBACK_PAGE`], query
/// and fragment are dropped. `https://host/app/index.html` becomes
/// `https://host/app/oauth-callback.html`.
pub fn derive_redirect_uri(page_url: &str) -> Result<String> {
    let mut url = Url::parse(page_url).map_err(|e| {
        AuthError::Configuration(format!("page URL {page_url:?} is not an absolute URL: {e}"))
    })?;
    url.set_query(None);
    url.set_fragment(None);
    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            AuthError::Configuration(format!("page URL {page_url:?} cannot hold a path"))
        })?;
        segments.pop();
        segments.push(CALLBACK_PAGE);
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_client_id_is_rejected() {
        let result = AuthConfig::new("YOUR_DROPBOX_CLIENT_ID", "https://example.com/cb.html");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn empty_client_id_is_rejected() {
        let result = AuthConfig::new("", "https://example.com/cb.html");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn relative_redirect_uri_is_rejected() {
        let result = AuthConfig::new("r5yg28qc965rli0", "/oauth-callback.html");
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn new_config_points_at_hosted_endpoints() {
        let config = AuthConfig::new("r5yg28qc965rli0", "https://example.com/cb.html")
            .expect("valid config");

        assert_eq!(config.authorize_url, DROPBOX_AUTHORIZE_URL);
        assert_eq!(config.token_url, DROPBOX_TOKEN_URL);
        assert_eq!(config.client_secret, None);
    }

    #[test]
    fn endpoints_can_be_overridden_for_tests() {
        let config = AuthConfig::new("r5yg28qc965rli0", "https://example.com/cb.html")
            .expect("valid config")
            .with_endpoints("http://127.0.0.1:9/authorize", "http://127.0.0.1:9/token");

        assert_eq!(config.authorize_url, "http://127.0.0.1:9/authorize");
        assert_eq!(config.token_url, "http://127.0.0.1:9/token");
    }

    #[test]
    fn redirect_uri_replaces_document_segment() {
        let derived = derive_redirect_uri("https://example.com/ads/index.html")
            .expect("derivable");
        assert_eq!(derived, "https://example.com/ads/oauth-callback.html");
    }

    #[test]
    fn redirect_uri_from_directory_page_appends_callback() {
        let derived = derive_redirect_uri("https://example.com/ads/").expect("derivable");
        assert_eq!(derived, "https://example.com/ads/oauth-callback.html");
    }

    #[test]
    fn redirect_uri_from_site_root() {
        let derived = derive_redirect_uri("https://example.com/").expect("derivable");
        assert_eq!(derived, "https://example.com/oauth-callback.html");
    }

    #[test]
    fn redirect_uri_drops_query_and_fragment() {
        let derived = derive_redirect_uri("https://example.com/app/page.html?tab=2#top")
            .expect("derivable");
        assert_eq!(derived, "https://example.com/app/oauth-callback.html");
    }

    #[test]
    fn callback_page_constant_matches_the_page_map() {
        // derive_redirect_uri appends CALLBACK_PAGE; the deployed callback
        // document must be that same file.
        assert_eq!(pages::CALLBACK, format!("./{CALLBACK_PAGE}"));
    }

    #[test]
    fn debug_output_redacts_client_secret() {
        let config = AuthConfig::new("r5yg28qc965rli0", "https://example.com/cb.html")
            .expect("valid config")
            .with_client_secret("shhh");

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("shhh"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
