use std::fmt;

/// A normalized token endpoint result: the bearer token, the long-lived
/// refresh token when the server issued one, and the absolute expiry the
/// exchanger computed from `expires_in`.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Epoch milliseconds after which `access_token` must not be trusted.
    pub expires_at_millis: i64,
}

impl TokenSet {
    /// True while the token can still be handed to callers: strictly inside
    /// the expiry minus the safety buffer, so it will not lapse mid-request.
    pub fn is_fresh(&self, now_millis: i64, buffer_millis: i64) -> bool {
        now_millis < self.expires_at_millis - buffer_millis
    }
}

// Never print token material, even at trace level.
impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at_millis", &self.expires_at_millis)
            .finish()
    }
}

/// The persisted credential state as read back from storage. Any of the
/// three fields may be missing independently: a partial write, an explicit
/// clear, or a record from before a refresh token was ever issued.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at_millis: Option<i64>,
}

impl CredentialRecord {
    /// Classifies the record for one lifecycle decision. The access token
    /// counts as usable only while `now < expiry - buffer`; a missing expiry
    /// makes it unusable no matter how recently it was stored.
    pub fn status(&self, now_millis: i64, buffer_millis: i64) -> TokenStatus {
        if let (Some(token), Some(expires_at)) = (&self.access_token, self.expires_at_millis) {
            if now_millis < expires_at - buffer_millis {
                return TokenStatus::Valid(token.clone());
            }
        }
        match &self.refresh_token {
            Some(refresh_token) => TokenStatus::ExpiredRefreshable(refresh_token.clone()),
            None if self.access_token.is_none() && self.expires_at_millis.is_none() => {
                TokenStatus::NoCredentials
            }
            None => TokenStatus::ExpiredUnrefreshable,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at_millis", &self.expires_at_millis)
            .finish()
    }
}

/// Outcome of classifying the stored credentials at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// Access token is inside its safety window; use it as-is.
    Valid(String),
    /// Access token is missing or too close to expiry, but a refresh token
    /// can mint a new one without user interaction.
    ExpiredRefreshable(String),
    /// Access token is unusable and there is nothing to refresh with.
    ExpiredUnrefreshable,
    /// Storage holds no credentials at all.
    NoCredentials,
}
