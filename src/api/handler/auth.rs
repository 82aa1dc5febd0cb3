use crate::api::cookie::SessionCookie;
use crate::api::error::*;
use crate::api::response::ApiResponse;
use crate::application_port::*;
use crate::domain_model::{AuthMethod, ServiceKind};
use crate::logger::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use warp::http::header::SET_COOKIE;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub auth_url: String,
    pub state: String,
}

pub async fn start_oauth(
    service: ServiceKind,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let start = auth_service
        .start_oauth(service)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    let response = OAuthStartResponse {
        auth_url: start.auth_url,
        state: start.state.0,
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

/// Accepted both as a JSON body and as the redirect's query string.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticatedResponse {
    pub service: ServiceKind,
    pub auth_method: AuthMethod,
    /// Same value as the cookie, for clients that send `X-Session-Id`.
    pub session_id: String,
    pub user_info: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

fn authenticated(outcome: AuthOutcome, cookie: SessionCookie) -> impl warp::Reply {
    let session = &outcome.session;
    let response = AuthenticatedResponse {
        service: session.service,
        auth_method: session.auth_method(),
        session_id: outcome.token.0.clone(),
        user_info: session.user_info.clone(),
        expires_at: session.expires_at(),
    };
    let message = format!(
        "Successfully authenticated with {}",
        session.service.display_name()
    );
    warp::reply::with_header(
        warp::reply::json(&ApiResponse::ok(response).with_message(message)),
        SET_COOKIE,
        cookie.issue(&outcome.token),
    )
}

pub async fn oauth_callback(
    service: ServiceKind,
    body: OAuthCallbackRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: Arc<SessionCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let outcome = auth_service
        .handle_oauth_callback(service, &body.code, &body.state)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(authenticated(outcome, *cookie))
}

#[derive(Debug, Deserialize)]
pub struct ApiTokenRequest {
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

pub async fn api_token_login(
    service: ServiceKind,
    body: ApiTokenRequest,
    auth_service: Arc<dyn AuthService>,
    cookie: Arc<SessionCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = ApiTokenInput {
        domain: body.domain,
        email: body.email,
        api_token: body.api_token,
    };
    let outcome = auth_service
        .authenticate_api_token(service, input)
        .await
        .map_err(ApiError::from)
        .map_err(reject::custom)?;

    Ok(authenticated(outcome, *cookie))
}

#[derive(Debug, Deserialize)]
pub struct LogoutQuery {
    pub session_id: Option<String>,
}

pub async fn logout(
    query: LogoutQuery,
    token: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookie: Arc<SessionCookie>,
) -> Result<impl warp::Reply, warp::Rejection> {
    if let Some(token) = token.or(query.session_id) {
        auth_service
            .logout(&token)
            .await
            .map_err(ApiError::from)
            .map_err(reject::custom)?;
    } else {
        debug!("logout without a session");
    }

    Ok(warp::reply::with_header(
        warp::reply::json(&ApiResponse::message("Logged out")),
        SET_COOKIE,
        cookie.clear(),
    ))
}
