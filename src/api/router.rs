use super::cookie::*;
use super::error::*;
use super::handler::{self, PathKey};
use crate::application_port::AuthService;
use crate::domain_model::{ServiceKind, Session};
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const BODY_LIMIT: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let auth = server.auth_service.clone();
    let cookie = Arc::new(SessionCookie {
        secure: server.cookie_secure,
    });

    let health = warp::path::end()
        .and(warp::get())
        .and_then(handler::health);

    // region auth

    let oauth_start = warp::path!("auth" / ServiceKind / "oauth" / "start")
        .and(warp::get())
        .and(with(auth.clone()))
        .and_then(handler::start_oauth);

    let callback_params = warp::post()
        .and(json_body::<handler::OAuthCallbackRequest>())
        .or(warp::get().and(warp::query::<handler::OAuthCallbackRequest>()))
        .unify();
    let oauth_callback = warp::path!("auth" / ServiceKind / "oauth" / "callback")
        .and(callback_params)
        .and(with(auth.clone()))
        .and(with(cookie.clone()))
        .and_then(handler::oauth_callback);

    let api_token = warp::path!("auth" / ServiceKind / "api-token")
        .and(warp::post())
        .and(json_body::<handler::ApiTokenRequest>())
        .and(with(auth.clone()))
        .and(with(cookie.clone()))
        .and_then(handler::api_token_login);

    let logout = warp::path!("auth" / "logout")
        .and(warp::post())
        .and(warp::query::<handler::LogoutQuery>())
        .and(session_token())
        .and(with(auth.clone()))
        .and(with(cookie.clone()))
        .and_then(handler::logout);

    // endregion

    // region jira

    let jira_projects = warp::path!("jira" / "projects")
        .and(warp::get())
        .and(with_session(auth.clone(), ServiceKind::Jira))
        .and(with(server.jira_service.clone()))
        .and_then(handler::list_projects);

    let jira_project = warp::path!("jira" / "projects" / PathKey)
        .and(warp::get())
        .and(with_session(auth.clone(), ServiceKind::Jira))
        .and(with(server.jira_service.clone()))
        .and_then(handler::get_project);

    let jira_validate = warp::path!("jira" / "connection" / "validate")
        .and(warp::get())
        .and(with_session(auth.clone(), ServiceKind::Jira))
        .and(with(server.jira_service.clone()))
        .and_then(handler::validate_jira_connection);

    // endregion

    // region confluence

    let confluence_spaces = warp::path!("confluence" / "spaces")
        .and(warp::get())
        .and(with_session(auth.clone(), ServiceKind::Confluence))
        .and(with(server.confluence_service.clone()))
        .and_then(handler::list_spaces);

    let confluence_space = warp::path!("confluence" / "spaces" / PathKey)
        .and(warp::get())
        .and(with_session(auth.clone(), ServiceKind::Confluence))
        .and(with(server.confluence_service.clone()))
        .and_then(handler::get_space);

    let confluence_content = warp::path!("confluence" / "spaces" / PathKey / "content")
        .and(warp::get())
        .and(warp::query::<handler::SpaceContentQuery>())
        .and(with_session(auth.clone(), ServiceKind::Confluence))
        .and(with(server.confluence_service.clone()))
        .and_then(handler::get_space_content);

    let confluence_validate = warp::path!("confluence" / "connection" / "validate")
        .and(warp::get())
        .and(with_session(auth, ServiceKind::Confluence))
        .and(with(server.confluence_service.clone()))
        .and_then(handler::validate_confluence_connection);

    // endregion

    health
        .or(oauth_start)
        .or(oauth_callback)
        .or(api_token)
        .or(logout)
        .or(jira_projects)
        .or(jira_project)
        .or(jira_validate)
        .or(confluence_spaces)
        .or(confluence_space)
        .or(confluence_content)
        .or(confluence_validate)
}

/// Any origin when `origins` is empty, otherwise exactly those.
pub fn cors(origins: &[String]) -> warp::cors::Builder {
    let cors = warp::cors()
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type", SESSION_HEADER]);
    if origins.is_empty() {
        cors.allow_any_origin()
    } else {
        cors.allow_origins(origins.iter().map(String::as_str))
    }
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(BODY_LIMIT).and(warp::body::json())
}

/// Session token from the cookie, else from the `X-Session-Id` header.
fn session_token() -> impl Filter<Extract = (Option<String>,), Error = warp::Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>(SESSION_HEADER))
        .map(|cookie: Option<String>, header: Option<String>| {
            cookie
                .filter(|token| !token.is_empty())
                .or(header.filter(|token| !token.is_empty()))
        })
}

fn with_session(
    auth_service: Arc<dyn AuthService>,
    service: ServiceKind,
) -> impl Filter<Extract = (Session,), Error = warp::Rejection> + Clone {
    session_token().and_then(move |token: Option<String>| {
        let auth_service = auth_service.clone();
        async move {
            let token = token
                .ok_or_else(|| reject::custom(ApiError::code(ApiErrorCode::Unauthenticated)))?;
            let session = auth_service
                .authorize(&token, service)
                .await
                .map_err(ApiError::from)
                .map_err(reject::custom)?;
            Ok::<Session, warp::Rejection>(session)
        }
    })
}
