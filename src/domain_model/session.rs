use super::{AuthMethod, ServiceKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(SessionId)
    }
}

/// Signed form of a [`SessionId`] handed to clients: `<id>.<signature>`.
#[derive(Clone, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Clone)]
pub enum Credential {
    OAuth {
        access_token: String,
        refresh_token: Option<String>,
        token_type: String,
        /// Atlassian site resolved from accessible-resources at login.
        cloud_id: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    },
    ApiToken {
        domain: String,
        email: String,
        api_token: String,
    },
}

impl Credential {
    pub fn auth_method(&self) -> AuthMethod {
        match self {
            Credential::OAuth { .. } => AuthMethod::OAuth,
            Credential::ApiToken { .. } => AuthMethod::ApiToken,
        }
    }

    /// False only for an OAuth credential whose site could not be resolved.
    pub fn has_site(&self) -> bool {
        match self {
            Credential::OAuth { cloud_id, .. } => cloud_id.is_some(),
            Credential::ApiToken { .. } => true,
        }
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::OAuth {
                cloud_id,
                expires_at,
                ..
            } => f
                .debug_struct("OAuth")
                .field("cloud_id", cloud_id)
                .field("expires_at", expires_at)
                .finish_non_exhaustive(),
            Credential::ApiToken { domain, email, .. } => f
                .debug_struct("ApiToken")
                .field("domain", domain)
                .field("email", email)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub service: ServiceKind,
    pub credential: Credential,
    pub user_info: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        service: ServiceKind,
        credential: Credential,
        user_info: Option<serde_json::Value>,
    ) -> Self {
        Session {
            id: SessionId::generate(),
            service,
            credential,
            user_info,
            created_at: Utc::now(),
        }
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.credential.auth_method()
    }

    /// OAuth expiry, recorded for display only.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match &self.credential {
            Credential::OAuth { expires_at, .. } => *expires_at,
            Credential::ApiToken { .. } => None,
        }
    }
}
