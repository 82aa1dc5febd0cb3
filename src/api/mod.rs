mod cookie;
mod error;
mod handler;
mod response;
mod router;

pub use cookie::{SESSION_COOKIE, SESSION_HEADER};
pub use error::recover_error;
pub use router::{cors, routes};

#[cfg(test)]
mod tests;
