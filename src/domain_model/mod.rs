mod atlassian;
mod oauth;
mod service;
mod session;

pub use atlassian::*;
pub use oauth::*;
pub use service::*;
pub use session::*;
