mod oauth_state_store_memory;
mod session_store_memory;

pub use oauth_state_store_memory::*;
pub use session_store_memory::*;
