use crate::domain_model::{CloudResource, Credential, OAuthTokens, ServiceKind};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("unexpected upstream response: {0}")]
    Decode(String),
    #[error("no Atlassian site available for this credential")]
    NoSite,
    /// The configured endpoint could not be turned into a request URL.
    #[error("bad endpoint configuration: {0}")]
    Config(String),
}

#[derive(Clone)]
pub struct TokenExchangeRequest {
    pub client_id: String,
    pub client_secret: String,
    pub code: String,
    pub redirect_uri: String,
}

/// Every call that leaves the process for Atlassian goes through here.
#[async_trait::async_trait]
pub trait AtlassianGateway: Send + Sync {
    async fn exchange_code(&self, request: &TokenExchangeRequest)
    -> Result<OAuthTokens, GatewayError>;

    async fn accessible_resources(
        &self,
        access_token: &str,
    ) -> Result<Vec<CloudResource>, GatewayError>;

    async fn current_user(&self, access_token: &str) -> Result<Value, GatewayError>;

    /// GET the path made of `segments` on the product API the credential
    /// points at. Segments are percent-encoded by the gateway.
    async fn get_json(
        &self,
        service: ServiceKind,
        credential: &Credential,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, GatewayError>;
}
