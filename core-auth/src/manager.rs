//! Token lifecycle orchestration.
//!
//! [`AuthManager`] is the single entry point API callers use to obtain a
//! bearer token. Each call classifies the stored credentials and either
//! returns the cached token, refreshes it, or starts a new authorization
//! round-trip through the host's navigator.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::{
    Clock, HttpClient, KeyValueStore, MemoryKeyValueStore, Navigator, NoInteractiveSecrets,
    SecretProvider, SystemClock,
};
use rand::{distributions::Alphanumeric, Rng};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::oauth::{build_authorization_url, TokenExchanger};
use crate::store::CredentialStore;
use crate::types::TokenStatus;

/// Safety margin subtracted from the stored expiry. A token inside this
/// window counts as expired so it cannot lapse mid-request.
pub const TOKEN_EXPIRY_BUFFER: Duration = Duration::from_secs(5 * 60);

/// Upper bound on one token endpoint round-trip, so a hung request cannot
/// leave callers pending forever.
pub const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Length of the CSRF state nonce bound into the authorization URL.
const STATE_LENGTH: usize = 16;

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Orchestrates acquisition, transparent refresh, and logout for the one
/// credential record this application holds.
pub struct AuthManager {
    config: Arc<AuthConfig>,
    store: Arc<CredentialStore>,
    exchanger: TokenExchanger,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager").finish_non_exhaustive()
    }
}

impl AuthManager {
    pub fn builder() -> AuthManagerBuilder {
        AuthManagerBuilder::default()
    }

    /// Returns a bearer token that is safe to use right now.
    ///
    /// A valid cached token is returned without any network call. An
    /// expired record with a refresh token is refreshed, persisted, and
    /// returned; concurrent callers share one refresh. With no usable
    /// credentials a new authorization round-trip is started and the call
    /// fails with [`AuthError::AuthenticationRequired`]; the caller resumes
    /// after the callback handler has run.
    #[instrument(skip(self))]
    pub async fn get_valid_access_token(&self) -> Result<String> {
        let buffer_millis = TOKEN_EXPIRY_BUFFER.as_millis() as i64;
        let record = self.store.load().await?;
        match record.status(self.clock.unix_timestamp_millis(), buffer_millis) {
            TokenStatus::Valid(token) => {
                debug!("returning cached access token");
                Ok(token)
            }
            TokenStatus::ExpiredRefreshable(_) => self.refresh_shared(buffer_millis).await,
            TokenStatus::ExpiredUnrefreshable | TokenStatus::NoCredentials => {
                info!("no usable credentials; starting authorization");
                self.initiate_login().await?;
                Err(AuthError::AuthenticationRequired)
            }
        }
    }

    /// Single-flight refresh. The first caller through the gate performs
    /// the network call; callers queued behind it re-read storage and find
    /// the fresh token already persisted.
    async fn refresh_shared(&self, buffer_millis: i64) -> Result<String> {
        let _gate = self.refresh_gate.lock().await;

        let record = self.store.load().await?;
        let refresh_token =
            match record.status(self.clock.unix_timestamp_millis(), buffer_millis) {
                TokenStatus::Valid(token) => return Ok(token),
                TokenStatus::ExpiredRefreshable(refresh_token) => refresh_token,
                TokenStatus::ExpiredUnrefreshable | TokenStatus::NoCredentials => {
                    // Credentials disappeared while we waited for the gate.
                    self.initiate_login().await?;
                    return Err(AuthError::AuthenticationRequired);
                }
            };

        let outcome = match timeout(
            TOKEN_REQUEST_TIMEOUT,
            self.exchanger.refresh(&refresh_token),
        )
        .await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(AuthError::RefreshFailed {
                reason: format!("no response within {}s", TOKEN_REQUEST_TIMEOUT.as_secs()),
                permanent: false,
            }),
        };

        match outcome {
            Ok(tokens) => {
                info!("access token refreshed");
                Ok(tokens.access_token)
            }
            Err(err) => {
                if matches!(
                    err,
                    AuthError::RefreshFailed {
                        permanent: true,
                        ..
                    }
                ) {
                    warn!("refresh token rejected; starting a new authorization");
                    if let Err(login_err) = self.initiate_login().await {
                        warn!(error = %login_err, "failed to start re-authorization");
                    }
                }
                Err(err)
            }
        }
    }

    /// Starts the authorization-code round-trip: generates a fresh CSRF
    /// nonce, stores it for the callback handler, and navigates to the
    /// authorization endpoint. Returns the URL it navigated to, for hosts
    /// that additionally present it to the user.
    ///
    /// One attempt is in flight at a time by convention. A second attempt
    /// (another tab, another call) replaces the pending nonce, and the
    /// earlier attempt's callback then fails CSRF validation.
    #[instrument(skip(self))]
    pub async fn initiate_login(&self) -> Result<String> {
        let state = generate_state();
        self.store.store_login_state(&state).await?;
        let url = build_authorization_url(&self.config, &state)?;
        info!("redirecting to the authorization endpoint");
        self.navigator
            .navigate(&url)
            .await
            .map_err(|e| AuthError::Internal(format!("navigation failed: {e}")))?;
        Ok(url)
    }

    /// Finishes the round-trip from the callback document with the `code`
    /// and `state` taken from its query string.
    ///
    /// The pending nonce is removed before it is compared, so a captured
    /// callback URL cannot be replayed whether validation passes or fails.
    #[instrument(skip(self, code, returned_state))]
    pub async fn complete_authorization(
        &self,
        code: &str,
        returned_state: &str,
    ) -> Result<String> {
        match self.store.take_login_state().await? {
            Some(stored) if stored == returned_state => {}
            Some(_) => {
                warn!("authorization callback state does not match the pending attempt");
                return Err(AuthError::CsrfValidation);
            }
            None => {
                warn!("authorization callback received with no pending attempt");
                return Err(AuthError::CsrfValidation);
            }
        }

        let tokens = match timeout(
            TOKEN_REQUEST_TIMEOUT,
            self.exchanger.exchange_authorization_code(code),
        )
        .await
        {
            Ok(outcome) => outcome?,
            Err(_) => {
                return Err(AuthError::ExchangeFailed(format!(
                    "no response within {}s",
                    TOKEN_REQUEST_TIMEOUT.as_secs()
                )))
            }
        };
        info!("authorization completed");
        Ok(tokens.access_token)
    }

    /// Discards the whole credential record. Safe to call repeatedly; the
    /// next token request starts a fresh authorization round-trip.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<()> {
        self.store.clear_credentials().await?;
        info!("credentials cleared");
        Ok(())
    }
}

/// Assembles an [`AuthManager`] from host-supplied parts.
///
/// `config`, `http_client`, `persistent_store`, and `navigator` are
/// required. The session store defaults to an in-memory map, the secret
/// provider to one that supplies nothing, and the clock to system time.
#[derive(Default)]
pub struct AuthManagerBuilder {
    config: Option<AuthConfig>,
    http_client: Option<Arc<dyn HttpClient>>,
    persistent_store: Option<Arc<dyn KeyValueStore>>,
    session_store: Option<Arc<dyn KeyValueStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    secrets: Option<Arc<dyn SecretProvider>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AuthManagerBuilder {
    pub fn config(mut self, config: AuthConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Storage that survives restarts; holds the credential record.
    pub fn persistent_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.persistent_store = Some(store);
        self
    }

    /// Storage scoped to the current session; holds only the CSRF nonce.
    pub fn session_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn secret_provider(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.secrets = Some(secrets);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<AuthManager> {
        let config = Arc::new(self.config.ok_or_else(|| {
            AuthError::Configuration(
                "config is required; construct one with AuthConfig::new".to_string(),
            )
        })?);
        let http_client = self.http_client.ok_or_else(|| {
            AuthError::Configuration(
                "http_client is required; supply the host transport".to_string(),
            )
        })?;
        let persistent_store = self.persistent_store.ok_or_else(|| {
            AuthError::Configuration(
                "persistent_store is required; credentials must survive restarts".to_string(),
            )
        })?;
        let navigator = self.navigator.ok_or_else(|| {
            AuthError::Configuration(
                "navigator is required; authorization needs a redirect mechanism".to_string(),
            )
        })?;
        let session_store = self
            .session_store
            .unwrap_or_else(|| Arc::new(MemoryKeyValueStore::new()));
        let secrets = self
            .secrets
            .unwrap_or_else(|| Arc::new(NoInteractiveSecrets));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let store = Arc::new(CredentialStore::new(persistent_store, session_store));
        let exchanger = TokenExchanger::new(
            config.clone(),
            http_client,
            store.clone(),
            secrets,
            clock.clone(),
        );

        Ok(AuthManager {
            config,
            store,
            exchanger,
            navigator,
            clock,
            refresh_gate: Mutex::new(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};
    use bytes::Bytes;
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::mock;
    use url::Url;

    use super::*;
    use crate::types::TokenSet;

    const NOW_MS: i64 = 1_700_000_000_000;
    const CLIENT_ID: &str = "r5yg28qc965rli0";
    const REDIRECT_URI: &str = "https://example.com/ads/oauth-callback.html";

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(
                &self,
                request: HttpRequest,
            ) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    struct FixedClock(i64);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.0).single().expect("valid millis")
        }
    }

    #[derive(Default)]
    struct RecordingNavigator {
        urls: StdMutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn navigate(&self, url: &str) -> bridge_traits::error::Result<()> {
            self.urls.lock().expect("lock").push(url.to_string());
            Ok(())
        }
    }

    struct Harness {
        manager: AuthManager,
        store: Arc<CredentialStore>,
        navigator: Arc<RecordingNavigator>,
    }

    fn harness(http: MockHttp) -> Harness {
        let persistent = Arc::new(MemoryKeyValueStore::new());
        let session = Arc::new(MemoryKeyValueStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let config = AuthConfig::new(CLIENT_ID, REDIRECT_URI)
            .expect("valid config")
            .with_client_secret("s3cret");
        let manager = AuthManager::builder()
            .config(config)
            .http_client(Arc::new(http))
            .persistent_store(persistent.clone())
            .session_store(session.clone())
            .navigator(navigator.clone())
            .clock(Arc::new(FixedClock(NOW_MS)))
            .build()
            .expect("buildable manager");
        let store = Arc::new(CredentialStore::new(persistent, session));
        Harness {
            manager,
            store,
            navigator,
        }
    }

    fn json_response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Default::default(),
            body: Bytes::from(body.to_string()),
        }
    }

    async fn seed_tokens(
        store: &CredentialStore,
        access: &str,
        refresh: Option<&str>,
        expires_at_millis: i64,
    ) {
        store
            .persist_tokens(&TokenSet {
                access_token: access.to_string(),
                refresh_token: refresh.map(str::to_string),
                expires_at_millis,
            })
            .await
            .expect("seed tokens");
    }

    fn state_param(url_text: &str) -> String {
        let url = Url::parse(url_text).expect("authorization url");
        url.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .expect("state parameter")
    }

    #[tokio::test]
    async fn cached_token_is_returned_without_network_calls() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);
        seed_tokens(&h.store, "cached", Some("R"), NOW_MS + 600_000).await;

        let token = h.manager.get_valid_access_token().await.expect("token");

        assert_eq!(token, "cached");
        assert!(h.navigator.urls().is_empty());
    }

    #[tokio::test]
    async fn token_expired_one_second_ago_is_refreshed() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token":"new","expires_in":7200}"#)));
        let h = harness(http);
        seed_tokens(&h.store, "stale", Some("R"), NOW_MS - 1_000).await;

        let token = h.manager.get_valid_access_token().await.expect("token");

        assert_eq!(token, "new");
        let record = h.store.load().await.expect("load");
        assert_eq!(record.access_token.as_deref(), Some("new"));
        assert_eq!(record.expires_at_millis, Some(NOW_MS + 7_200_000));
        assert_eq!(record.refresh_token.as_deref(), Some("R"));
        assert!(h.navigator.urls().is_empty());
    }

    #[tokio::test]
    async fn token_inside_the_buffer_window_is_refreshed() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token":"new","expires_in":7200}"#)));
        let h = harness(http);
        // Live for another 200s, but inside the 300s safety buffer.
        seed_tokens(&h.store, "stale", Some("R"), NOW_MS + 200_000).await;

        let token = h.manager.get_valid_access_token().await.expect("token");
        assert_eq!(token, "new");
    }

    #[tokio::test]
    async fn rejected_refresh_starts_a_new_authorization() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                400,
                r#"{"error":"invalid_grant","error_description":"refresh token revoked"}"#,
            ))
        });
        let h = harness(http);
        seed_tokens(&h.store, "stale", Some("R"), NOW_MS - 1_000).await;

        let err = h
            .manager
            .get_valid_access_token()
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            AuthError::RefreshFailed {
                permanent: true,
                ..
            }
        ));
        let urls = h.navigator.urls();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://www.dropbox.com/oauth2/authorize"));
        // A fresh nonce is pending for the new attempt.
        assert!(h.store.take_login_state().await.expect("take").is_some());
    }

    #[tokio::test]
    async fn transient_refresh_failure_does_not_redirect() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Err(BridgeError::OperationFailed("connection reset".to_string())));
        let h = harness(http);
        seed_tokens(&h.store, "stale", Some("R"), NOW_MS - 1_000).await;

        let err = h
            .manager
            .get_valid_access_token()
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            AuthError::RefreshFailed {
                permanent: false,
                ..
            }
        ));
        assert!(h.navigator.urls().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_start_an_authorization_round_trip() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);

        let err = h
            .manager
            .get_valid_access_token()
            .await
            .expect_err("must fail");
        assert!(matches!(err, AuthError::AuthenticationRequired));

        let urls = h.navigator.urls();
        assert_eq!(urls.len(), 1);
        let url = Url::parse(&urls[0]).expect("authorization url");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".to_string(), CLIENT_ID.to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("redirect_uri".to_string(), REDIRECT_URI.to_string())));
        assert!(pairs.contains(&("token_access_type".to_string(), "offline".to_string())));

        let state = state_param(&urls[0]);
        assert_eq!(state.len(), 16);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        // The stored nonce is exactly the value bound into the URL.
        assert_eq!(
            h.store.take_login_state().await.expect("take"),
            Some(state)
        );
    }

    #[tokio::test]
    async fn initiate_login_returns_the_url_it_navigated_to() {
        let h = harness(MockHttp::new());

        let url = h.manager.initiate_login().await.expect("login started");

        assert_eq!(h.navigator.urls(), vec![url.clone()]);
        // The pending nonce matches the state bound into the URL.
        assert_eq!(
            h.store.take_login_state().await.expect("take"),
            Some(state_param(&url))
        );
    }

    #[tokio::test]
    async fn expired_token_without_refresh_token_requires_authentication() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);
        seed_tokens(&h.store, "stale", None, NOW_MS - 1_000).await;

        let err = h
            .manager
            .get_valid_access_token()
            .await
            .expect_err("must fail");

        assert!(matches!(err, AuthError::AuthenticationRequired));
        assert_eq!(h.navigator.urls().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(json_response(200, r#"{"access_token":"new","expires_in":7200}"#)));
        let h = harness(http);
        seed_tokens(&h.store, "stale", Some("R"), NOW_MS - 1_000).await;

        let (first, second) = tokio::join!(
            h.manager.get_valid_access_token(),
            h.manager.get_valid_access_token()
        );

        assert_eq!(first.expect("first caller"), "new");
        assert_eq!(second.expect("second caller"), "new");
    }

    #[tokio::test]
    async fn completed_authorization_stores_tokens_and_consumes_the_nonce() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{"access_token":"A","refresh_token":"R","expires_in":3600}"#,
            ))
        });
        let h = harness(http);
        h.store
            .store_login_state("expectedState123")
            .await
            .expect("seed state");

        let token = h
            .manager
            .complete_authorization("the-code", "expectedState123")
            .await
            .expect("token");

        assert_eq!(token, "A");
        let record = h.store.load().await.expect("load");
        assert_eq!(record.access_token.as_deref(), Some("A"));
        assert_eq!(record.refresh_token.as_deref(), Some("R"));
        assert_eq!(record.expires_at_millis, Some(NOW_MS + 3_600_000));
        assert_eq!(h.store.take_login_state().await.expect("take"), None);
    }

    #[tokio::test]
    async fn mismatched_state_fails_without_touching_the_network() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);
        h.store
            .store_login_state("expectedState123")
            .await
            .expect("seed state");

        let err = h
            .manager
            .complete_authorization("the-code", "forgedState99999")
            .await
            .expect_err("must fail");

        assert!(matches!(err, AuthError::CsrfValidation));
        // Even a failed comparison consumes the nonce.
        assert_eq!(h.store.take_login_state().await.expect("take"), None);
    }

    #[tokio::test]
    async fn callback_without_a_pending_attempt_fails_validation() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);

        let err = h
            .manager
            .complete_authorization("the-code", "anyState12345678")
            .await
            .expect_err("must fail");

        assert!(matches!(err, AuthError::CsrfValidation));
    }

    #[tokio::test]
    async fn replaying_a_completed_callback_fails_validation() {
        let mut http = MockHttp::new();
        http.expect_execute().times(1).returning(|_| {
            Ok(json_response(
                200,
                r#"{"access_token":"A","refresh_token":"R","expires_in":3600}"#,
            ))
        });
        let h = harness(http);
        h.store
            .store_login_state("expectedState123")
            .await
            .expect("seed state");

        h.manager
            .complete_authorization("the-code", "expectedState123")
            .await
            .expect("first completion");
        let err = h
            .manager
            .complete_authorization("the-code", "expectedState123")
            .await
            .expect_err("replay must fail");

        assert!(matches!(err, AuthError::CsrfValidation));
    }

    #[tokio::test]
    async fn logout_discards_credentials_and_the_next_call_reauthorizes() {
        let mut http = MockHttp::new();
        http.expect_execute().times(0);
        let h = harness(http);
        seed_tokens(&h.store, "cached", Some("R"), NOW_MS + 600_000).await;

        h.manager.logout().await.expect("logout");
        h.manager.logout().await.expect("repeated logout");

        let err = h
            .manager
            .get_valid_access_token()
            .await
            .expect_err("must fail");
        assert!(matches!(err, AuthError::AuthenticationRequired));
        assert_eq!(h.navigator.urls().len(), 1);
    }

    #[tokio::test]
    async fn builder_rejects_missing_required_parts() {
        let err = AuthManager::builder().build().expect_err("must fail");
        assert!(matches!(err, AuthError::Configuration(_)));
        assert!(err.to_string().contains("config"));
    }
}
