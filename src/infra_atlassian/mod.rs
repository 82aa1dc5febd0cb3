mod atlassian_gateway_fake;
mod atlassian_gateway_http;

pub use atlassian_gateway_fake::*;
pub use atlassian_gateway_http::*;
