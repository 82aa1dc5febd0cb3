use super::{ConnectionStatus, PathKey};
use crate::api::error::*;
use crate::api::response::ApiResponse;
use crate::application_port::*;
use crate::domain_model::Session;
use crate::logger::*;
use std::sync::Arc;
use warp::{self, reject};

pub async fn list_projects(
    session: Session,
    jira_service: Arc<dyn JiraService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let projects = jira_service
        .list_projects(&session)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    let message = format!("Retrieved {} projects", projects.len());
    Ok(warp::reply::json(
        &ApiResponse::list(projects).with_message(message),
    ))
}

pub async fn get_project(
    key: PathKey,
    session: Session,
    jira_service: Arc<dyn JiraService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let project = jira_service
        .get_project(&session, &key.0)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(project)))
}

pub async fn validate_jira_connection(
    session: Session,
    jira_service: Arc<dyn JiraService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = match jira_service.validate_connection(&session).await {
        Ok(()) => ConnectionStatus {
            valid: true,
            message: "Jira connection is valid".to_string(),
        },
        Err(e) => {
            info!(session = %session.id, "jira connection check failed: {}", e);
            ConnectionStatus {
                valid: false,
                message: format!("Jira connection failed: {}", e),
            }
        }
    };
    Ok(warp::reply::json(&ApiResponse::ok(status)))
}
