// store

mod oauth_state_store;
mod session_store;
mod store_error;

pub use oauth_state_store::*;
pub use session_store::*;
pub use store_error::*;

// upstream

mod atlassian_gateway;

pub use atlassian_gateway::*;
