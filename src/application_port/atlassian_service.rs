use crate::domain_model::{ContentItem, Project, Session, Space};
use crate::domain_port::GatewayError;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream returned HTTP {status}")]
    UpstreamError { status: u16 },
    #[error("{0} not found")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unexpected upstream response: {0}")]
    InvalidResponse(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(e) => ServiceError::UpstreamUnavailable(e),
            GatewayError::Status { status, .. } => ServiceError::UpstreamError { status },
            GatewayError::Decode(e) => ServiceError::InvalidResponse(e),
            GatewayError::NoSite => ServiceError::NotFound("Atlassian site".to_string()),
            GatewayError::Config(e) => ServiceError::Internal(e),
        }
    }
}

pub const DEFAULT_CONTENT_LIMIT: u32 = 25;
pub const MAX_CONTENT_LIMIT: u32 = 100;

#[async_trait::async_trait]
pub trait JiraService: Send + Sync {
    async fn list_projects(&self, session: &Session) -> Result<Vec<Project>, ServiceError>;
    async fn get_project(&self, session: &Session, key: &str) -> Result<Value, ServiceError>;
    async fn validate_connection(&self, session: &Session) -> Result<(), ServiceError>;
}

#[async_trait::async_trait]
pub trait ConfluenceService: Send + Sync {
    async fn list_spaces(&self, session: &Session) -> Result<Vec<Space>, ServiceError>;
    async fn get_space(&self, session: &Session, key: &str) -> Result<Value, ServiceError>;
    async fn get_space_content(
        &self,
        session: &Session,
        key: &str,
        limit: u32,
    ) -> Result<Vec<ContentItem>, ServiceError>;
    async fn validate_connection(&self, session: &Session) -> Result<(), ServiceError>;
}
