mod auth_service_impl;
mod confluence_service_impl;
mod jira_service_impl;
mod session_signer;

pub use auth_service_impl::*;
pub use confluence_service_impl::*;
pub use jira_service_impl::*;
pub use session_signer::*;
