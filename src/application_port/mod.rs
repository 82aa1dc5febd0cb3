mod atlassian_service;
mod auth_service;

pub use atlassian_service::*;
pub use auth_service::*;
