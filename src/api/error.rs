use super::response::ApiResponse;
use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let error = if let Some(error) = err.find::<ApiError>() {
        error.clone()
    } else if err.is_not_found() {
        ApiError::new(ApiErrorCode::NotFound, "Route not found")
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if let Some(e) = err.find::<reject::InvalidQuery>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiError::new(ApiErrorCode::MethodNotAllowed, "Method not allowed")
    } else if let Some(e) = err.find::<reject::UnsupportedMediaType>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if let Some(e) = err.find::<reject::PayloadTooLarge>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else if let Some(e) = err.find::<reject::LengthRequired>() {
        ApiError::new(ApiErrorCode::BadRequest, e.to_string())
    } else {
        ApiError::internal(format!("unhandled rejection: {:?}", err))
    };

    let status = error.http_status();
    let json = warp::reply::json(&ApiResponse::<()>::err(error));
    Ok(warp::reply::with_status(json, status))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("OAuth state is invalid or expired")]
    InvalidState,
    #[error("Authorization code exchange failed")]
    TokenExchangeFailed,
    #[error("Bad request")]
    BadRequest,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Session belongs to another service")]
    WrongService,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Atlassian returned an error")]
    UpstreamError,
    #[error("Atlassian is unreachable")]
    UpstreamUnavailable,
    #[error("OAuth is not configured")]
    OAuthNotConfigured,
    #[error("Internal error")]
    InternalError,
}

/// Error half of the response envelope; also the rejection every handler raises.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    /// Status Atlassian answered with, for `UpstreamError`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> ApiError {
        ApiError {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn code(code: ApiErrorCode) -> ApiError {
        ApiError::new(code, code.to_string())
    }

    pub fn upstream(status: u16) -> ApiError {
        ApiError {
            code: ApiErrorCode::UpstreamError,
            message: format!("Atlassian returned HTTP {}", status),
            status: Some(status),
        }
    }

    pub fn internal<E: std::fmt::Display>(error: E) -> ApiError {
        warn!("Internal error: {}", error);
        ApiError::code(ApiErrorCode::InternalError)
    }

    pub fn http_status(&self) -> StatusCode {
        match self.code {
            ApiErrorCode::InvalidState
            | ApiErrorCode::TokenExchangeFailed
            | ApiErrorCode::BadRequest => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials | ApiErrorCode::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::WrongService => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::UpstreamError => match self.status {
                Some(status @ (401 | 403 | 404 | 429)) => {
                    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            ApiErrorCode::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            ApiErrorCode::OAuthNotConfigured | ApiErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl reject::Reject for ApiError {}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidState => ApiError::code(ApiErrorCode::InvalidState),
            AuthError::TokenExchange { status } => ApiError::new(
                ApiErrorCode::TokenExchangeFailed,
                format!("Authorization code exchange failed with HTTP {}", status),
            ),
            AuthError::InvalidCredentials => ApiError::code(ApiErrorCode::InvalidCredentials),
            AuthError::Unauthenticated => ApiError::code(ApiErrorCode::Unauthenticated),
            AuthError::WrongService { expected } => ApiError::new(
                ApiErrorCode::WrongService,
                format!("Session is not authenticated for {}", expected.display_name()),
            ),
            AuthError::OAuthNotConfigured(service) => {
                warn!(%service, "OAuth requested but not configured");
                ApiError::new(
                    ApiErrorCode::OAuthNotConfigured,
                    format!("OAuth is not configured for {}", service.display_name()),
                )
            }
            AuthError::BadRequest(e) => ApiError::new(ApiErrorCode::BadRequest, e),
            AuthError::UpstreamUnavailable(e) => {
                warn!("Atlassian unreachable: {}", e);
                ApiError::code(ApiErrorCode::UpstreamUnavailable)
            }
            AuthError::UpstreamError { status } => ApiError::upstream(status),
            AuthError::Store(e) => ApiError::internal(e),
            AuthError::InternalError(e) => ApiError::internal(e),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::UpstreamUnavailable(e) => {
                warn!("Atlassian unreachable: {}", e);
                ApiError::code(ApiErrorCode::UpstreamUnavailable)
            }
            ServiceError::UpstreamError { status } => ApiError::upstream(status),
            ServiceError::NotFound(what) => {
                ApiError::new(ApiErrorCode::NotFound, format!("{} not found", what))
            }
            ServiceError::BadRequest(e) => ApiError::new(ApiErrorCode::BadRequest, e),
            ServiceError::InvalidResponse(e) | ServiceError::Internal(e) => ApiError::internal(e),
        }
    }
}
