use crate::domain_model::{OAuthState, ServiceKind, Session, SessionToken};
use crate::domain_port::{GatewayError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("OAuth state is unknown, expired or for another service")]
    InvalidState,
    #[error("token exchange rejected with HTTP {status}")]
    TokenExchange { status: u16 },
    #[error("invalid API token credentials")]
    InvalidCredentials,
    #[error("authentication required")]
    Unauthenticated,
    #[error("session is not authenticated for {expected}")]
    WrongService { expected: ServiceKind },
    #[error("OAuth is not configured for {0}")]
    OAuthNotConfigured(ServiceKind),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("upstream returned HTTP {status}")]
    UpstreamError { status: u16 },
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err.to_string())
    }
}

impl From<GatewayError> for AuthError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(e) => AuthError::UpstreamUnavailable(e),
            GatewayError::Status { status, .. } => AuthError::UpstreamError { status },
            GatewayError::Decode(e) => AuthError::InternalError(e),
            GatewayError::NoSite => AuthError::InternalError("no Atlassian site".to_string()),
            GatewayError::Config(e) => AuthError::InternalError(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthStart {
    pub auth_url: String,
    pub state: OAuthState,
}

#[derive(Clone)]
pub struct ApiTokenInput {
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: SessionToken,
    pub session: Session,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn start_oauth(&self, service: ServiceKind) -> Result<OAuthStart, AuthError>;
    async fn handle_oauth_callback(
        &self,
        service: ServiceKind,
        code: &str,
        state: &str,
    ) -> Result<AuthOutcome, AuthError>;
    async fn authenticate_api_token(
        &self,
        service: ServiceKind,
        input: ApiTokenInput,
    ) -> Result<AuthOutcome, AuthError>;
    /// Resolve a client token to its session, requiring it to belong to `service`.
    async fn authorize(&self, token: &str, service: ServiceKind) -> Result<Session, AuthError>;
    /// Succeeds for unknown or malformed tokens too.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
}
