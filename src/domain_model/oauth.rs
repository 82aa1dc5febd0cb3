use super::ServiceKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// The CSRF value carried through the authorization redirect.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(transparent)]
pub struct OAuthState(pub String);

impl fmt::Display for OAuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An authorization redirect waiting for its callback.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub service: ServiceKind,
    pub redirect_uri: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of a successful authorization-code exchange.
#[derive(Clone)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn pending_authorization_expires_at_deadline() {
        let now = Utc::now();
        let pending = PendingAuthorization {
            service: ServiceKind::Jira,
            redirect_uri: "http://localhost/cb".into(),
            expires_at: now + Duration::seconds(10),
        };
        assert!(!pending.is_expired(now));
        assert!(pending.is_expired(now + Duration::seconds(10)));
    }
}
