use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Jira,
    Confluence,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Jira => "jira",
            ServiceKind::Confluence => "confluence",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Jira => "Jira",
            ServiceKind::Confluence => "Confluence",
        }
    }

    /// Space-separated 3LO scopes requested at authorization time.
    pub fn oauth_scopes(&self) -> &'static str {
        match self {
            ServiceKind::Jira => "read:jira-user read:jira-work",
            ServiceKind::Confluence => "read:confluence-user read:confluence-content.summary",
        }
    }

    /// Endpoint that answers 200 only for a valid email/API token pair.
    pub fn whoami_path(&self) -> &'static [&'static str] {
        match self {
            ServiceKind::Jira => &["rest", "api", "3", "myself"],
            ServiceKind::Confluence => &["wiki", "rest", "api", "user", "current"],
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service: {0}")]
pub struct UnknownService(pub String);

impl std::str::FromStr for ServiceKind {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jira" => Ok(ServiceKind::Jira),
            "confluence" => Ok(ServiceKind::Confluence),
            other => Err(UnknownService(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[serde(rename = "oauth")]
    OAuth,
    ApiToken,
}
