use super::{ConnectionStatus, PathKey};
use crate::api::error::*;
use crate::api::response::ApiResponse;
use crate::application_port::*;
use crate::domain_model::Session;
use crate::logger::*;
use serde::Deserialize;
use std::sync::Arc;
use warp::{self, reject};

pub async fn list_spaces(
    session: Session,
    confluence_service: Arc<dyn ConfluenceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let spaces = confluence_service
        .list_spaces(&session)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    let message = format!("Retrieved {} spaces", spaces.len());
    Ok(warp::reply::json(&ApiResponse::list(spaces).with_message(message)))
}

pub async fn get_space(
    key: PathKey,
    session: Session,
    confluence_service: Arc<dyn ConfluenceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let space = confluence_service
        .get_space(&session, &key.0)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(space)))
}

#[derive(Debug, Deserialize)]
pub struct SpaceContentQuery {
    pub limit: Option<u32>,
}

pub async fn get_space_content(
    PathKey(key): PathKey,
    query: SpaceContentQuery,
    session: Session,
    confluence_service: Arc<dyn ConfluenceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let limit = query.limit.unwrap_or(DEFAULT_CONTENT_LIMIT);
    let content = confluence_service
        .get_space_content(&session, &key, limit)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    let message = format!("Retrieved {} content items", content.len());
    Ok(warp::reply::json(
        &ApiResponse::space_list(key, content).with_message(message),
    ))
}

pub async fn validate_confluence_connection(
    session: Session,
    confluence_service: Arc<dyn ConfluenceService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let status = match confluence_service.validate_connection(&session).await {
        Ok(()) => ConnectionStatus {
            valid: true,
            message: "Confluence connection is valid".to_string(),
        },
        Err(e) => {
            info!(session = %session.id, "confluence connection check failed: {}", e);
            ConnectionStatus {
                valid: false,
                message: format!("Confluence connection failed: {}", e),
            }
        }
    };
    Ok(warp::reply::json(&ApiResponse::ok(status)))
}
