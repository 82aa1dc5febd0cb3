mod auth;
mod confluence;
mod jira;

pub use auth::*;
pub use confluence::*;
pub use jira::*;

use serde::Serialize;
use std::str::FromStr;
use std::string::FromUtf8Error;

#[derive(Debug, Serialize)]
pub struct Health {
    pub message: &'static str,
    pub status: &'static str,
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&Health {
        message: "Healthy",
        status: "ok",
    }))
}

/// Outcome of a connection check; a failed check is still a 200.
#[derive(Debug, Serialize)]
pub struct ConnectionStatus {
    pub valid: bool,
    pub message: String,
}

/// A resource key taken from the request path. warp hands path parameters
/// over still percent-encoded, so they are decoded here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathKey(pub String);

impl FromStr for PathKey {
    type Err = FromUtf8Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Ok(PathKey(urlencoding::decode(raw)?.into_owned()))
    }
}
