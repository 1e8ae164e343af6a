//! Authorization URL construction and the two token endpoint operations.
//!
//! The exchanger owns the network calls that mint or renew tokens and
//! persists every successful result. It never decides *whether* to refresh;
//! that policy lives in [`AuthManager`](crate::manager::AuthManager).

use std::sync::Arc;

use bridge_traits::{Clock, HttpClient, HttpMethod, HttpRequest, HttpResponse, SecretProvider};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::store::CredentialStore;
use crate::types::TokenSet;

/// Builds the redirect target for the authorization-code flow, binding the
/// caller's CSRF nonce into the URL. `token_access_type=offline` asks the
/// server to issue a refresh token alongside the first access token.
pub fn build_authorization_url(config: &AuthConfig, state: &str) -> Result<String> {
    let mut url = Url::parse(&config.authorize_url).map_err(|e| {
        AuthError::Configuration(format!(
            "authorization endpoint {:?} is not a valid URL: {e}",
            config.authorize_url
        ))
    })?;
    url.query_pairs_mut()
        .append_pair("client_id", &config.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &config.redirect_uri)
        .append_pair("state", state)
        .append_pair("token_access_type", "offline");
    Ok(url.into())
}

/// Success payload of the token endpoint. `refresh_token` only appears on
/// the first exchange or when the server rotates it.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// Failure payload of the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Pulls the most useful description out of a non-success response body,
/// falling back to the raw text when it is not the documented JSON shape.
fn upstream_error(response: &HttpResponse) -> String {
    match response.json::<TokenErrorBody>() {
        Ok(body) => body
            .error_description
            .or(body.error)
            .unwrap_or_else(|| String::from_utf8_lossy(&response.body).into_owned()),
        Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
    }
}

/// Performs the two grants against the token endpoint and hands each
/// normalized result to the [`CredentialStore`].
pub struct TokenExchanger {
    config: Arc<AuthConfig>,
    http_client: Arc<dyn HttpClient>,
    store: Arc<CredentialStore>,
    secrets: Arc<dyn SecretProvider>,
    clock: Arc<dyn Clock>,
}

impl TokenExchanger {
    pub fn new(
        config: Arc<AuthConfig>,
        http_client: Arc<dyn HttpClient>,
        store: Arc<CredentialStore>,
        secrets: Arc<dyn SecretProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            http_client,
            store,
            secrets,
            clock,
        }
    }

    /// Exchanges a one-time authorization code for the initial token pair.
    /// The redirect URI must be the one the code was obtained with.
    #[instrument(skip(self, code))]
    pub async fn exchange_authorization_code(&self, code: &str) -> Result<TokenSet> {
        let client_secret = self.resolve_client_secret().await?;
        let params = [
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];
        let request = self.token_request(&params)?;
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.is_success() {
            let description = upstream_error(&response);
            warn!(
                status = response.status,
                error = %description,
                "authorization code exchange rejected"
            );
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {}: {}",
                response.status, description
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .map_err(|e| AuthError::ExchangeFailed(format!("unreadable token response: {e}")))?;
        let tokens = self.normalize(token_response, None);
        self.store.persist_tokens(&tokens).await?;
        debug!("authorization code exchanged for tokens");
        Ok(tokens)
    }

    /// Mints a new access token from the long-lived refresh token.
    ///
    /// A client-error status marks the failure permanent: the refresh token
    /// itself is likely invalid or revoked and retrying cannot help. Server
    /// errors and transport failures stay transient.
    #[instrument(skip(self, refresh_token))]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet> {
        let client_secret = self.resolve_client_secret().await?;
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", client_secret.as_str()),
        ];
        let request = self.token_request(&params)?;
        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| AuthError::RefreshFailed {
                reason: e.to_string(),
                permanent: false,
            })?;

        if !response.is_success() {
            let description = upstream_error(&response);
            let permanent = response.is_client_error();
            warn!(
                status = response.status,
                permanent,
                error = %description,
                "token refresh rejected"
            );
            return Err(AuthError::RefreshFailed {
                reason: format!(
                    "token endpoint returned {}: {}",
                    response.status, description
                ),
                permanent,
            });
        }

        let token_response: TokenResponse =
            response.json().map_err(|e| AuthError::RefreshFailed {
                reason: format!("unreadable token response: {e}"),
                permanent: false,
            })?;
        let tokens = self.normalize(token_response, Some(refresh_token));
        self.store.persist_tokens(&tokens).await?;
        debug!("access token refreshed");
        Ok(tokens)
    }

    fn token_request(&self, params: &[(&str, &str)]) -> Result<HttpRequest> {
        let body = serde_urlencoded::to_string(params)
            .map_err(|e| AuthError::Internal(format!("failed to encode token request: {e}")))?;
        Ok(HttpRequest::new(HttpMethod::Post, &self.config.token_url).form(body))
    }

    /// Resolves the confidential client secret: static configuration first,
    /// then the host's provider. The value is used for one request and never
    /// persisted.
    async fn resolve_client_secret(&self) -> Result<String> {
        if let Some(client_secret) = &self.config.client_secret {
            return Ok(client_secret.clone());
        }
        match self.secrets.client_secret().await {
            Ok(Some(client_secret)) => Ok(client_secret),
            Ok(None) => Err(AuthError::Configuration(
                "no client secret is configured and the host cannot supply one".to_string(),
            )),
            Err(e) => Err(AuthError::Configuration(format!(
                "client secret unavailable: {e}"
            ))),
        }
    }

    fn normalize(&self, response: TokenResponse, current_refresh_token: Option<&str>) -> TokenSet {
        TokenSet {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .or_else(|| current_refresh_token.map(str::to_string)),
            expires_at_millis: self.clock.unix_timestamp_millis() + response.expires_in * 1000,
        }
    }
}
