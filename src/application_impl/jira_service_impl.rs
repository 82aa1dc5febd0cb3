use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use serde_json::Value;
use std::sync::Arc;

const PROJECT_PATH: [&str; 4] = ["rest", "api", "3", "project"];

pub struct RealJiraService {
    gateway: Arc<dyn AtlassianGateway>,
}

impl RealJiraService {
    pub fn new(gateway: Arc<dyn AtlassianGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait::async_trait]
impl JiraService for RealJiraService {
    async fn list_projects(&self, session: &Session) -> Result<Vec<Project>, ServiceError> {
        if !session.credential.has_site() {
            return Ok(Vec::new());
        }
        let value = self
            .gateway
            .get_json(ServiceKind::Jira, &session.credential, &PROJECT_PATH, &[])
            .await?;
        serde_json::from_value(value).map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }

    async fn get_project(&self, session: &Session, key: &str) -> Result<Value, ServiceError> {
        if key.is_empty() {
            return Err(ServiceError::BadRequest("project key is empty".to_string()));
        }
        let segments = ["rest", "api", "3", "project", key];
        self.gateway
            .get_json(ServiceKind::Jira, &session.credential, &segments, &[])
            .await
            .map_err(|e| match e {
                GatewayError::Status { status: 404, .. } => {
                    ServiceError::NotFound(format!("project {key}"))
                }
                other => other.into(),
            })
    }

    async fn validate_connection(&self, session: &Session) -> Result<(), ServiceError> {
        self.gateway
            .get_json(ServiceKind::Jira, &session.credential, &PROJECT_PATH, &[])
            .await?;
        Ok(())
    }
}
