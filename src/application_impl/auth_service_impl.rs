use super::SessionSigner;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};
use std::sync::Arc;
use std::time::Duration;

/// Random bytes behind each state value (43 url-safe characters).
const STATE_BYTES: u32 = 32;

/// 3LO client registration plus where the browser is sent.
#[derive(Clone)]
pub struct OAuthClientConfig {
    pub authorize_url: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub jira_redirect_uri: Option<String>,
    pub confluence_redirect_uri: Option<String>,
    pub state_ttl: Duration,
}

impl OAuthClientConfig {
    fn redirect_uri(&self, service: ServiceKind) -> Option<&str> {
        match service {
            ServiceKind::Jira => self.jira_redirect_uri.as_deref(),
            ServiceKind::Confluence => self.confluence_redirect_uri.as_deref(),
        }
    }
}

pub struct RealAuthService {
    sessions: Arc<dyn SessionStore>,
    states: Arc<dyn OAuthStateStore>,
    gateway: Arc<dyn AtlassianGateway>,
    signer: SessionSigner,
    oauth: OAuthClientConfig,
}

impl RealAuthService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        states: Arc<dyn OAuthStateStore>,
        gateway: Arc<dyn AtlassianGateway>,
        signer: SessionSigner,
        oauth: OAuthClientConfig,
    ) -> Self {
        Self {
            sessions,
            states,
            gateway,
            signer,
            oauth,
        }
    }

    async fn open_session(&self, session: Session) -> Result<AuthOutcome, AuthError> {
        let token = self.signer.sign(&session.id)?;
        self.sessions.set(session.clone()).await?;
        info!(
            session = %session.id,
            service = %session.service,
            method = ?session.auth_method(),
            "session created"
        );
        Ok(AuthOutcome { token, session })
    }

    /// Prefer a site that granted this product's scopes, else the first one.
    async fn resolve_cloud_id(&self, service: ServiceKind, access_token: &str) -> Option<String> {
        match self.gateway.accessible_resources(access_token).await {
            Ok(resources) => resources
                .iter()
                .find(|resource| resource.serves(service))
                .or_else(|| resources.first())
                .map(|resource| resource.id.clone()),
            Err(e) => {
                warn!("accessible resources lookup failed: {}", e);
                None
            }
        }
    }
}

fn normalize_domain(raw: &str) -> Result<String, AuthError> {
    let trimmed = raw.trim();
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed)
        .trim_end_matches('/');
    if host.is_empty() || host.contains(['/', '?', '#', '@']) || host.contains(char::is_whitespace)
    {
        return Err(AuthError::BadRequest(format!("invalid domain: {raw:?}")));
    }
    Ok(host.to_ascii_lowercase())
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn start_oauth(&self, service: ServiceKind) -> Result<OAuthStart, AuthError> {
        let client_id = self
            .oauth
            .client_id
            .as_deref()
            .ok_or(AuthError::OAuthNotConfigured(service))?;
        let redirect_uri = self
            .oauth
            .redirect_uri(service)
            .ok_or(AuthError::OAuthNotConfigured(service))?;

        let client = BasicClient::new(ClientId::new(client_id.to_string()))
            .set_auth_uri(
                AuthUrl::new(self.oauth.authorize_url.clone())
                    .map_err(|e| AuthError::InternalError(format!("authorize url: {e}")))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(redirect_uri.to_string())
                    .map_err(|e| AuthError::InternalError(format!("redirect uri: {e}")))?,
            );
        let (auth_url, csrf) = client
            .authorize_url(|| CsrfToken::new_random_len(STATE_BYTES))
            .add_scopes(
                service
                    .oauth_scopes()
                    .split_whitespace()
                    .map(|scope| Scope::new(scope.to_string())),
            )
            .add_extra_param("audience", "api.atlassian.com")
            .add_extra_param("prompt", "consent")
            .url();
        let state = OAuthState(csrf.secret().clone());

        let ttl = chrono::Duration::from_std(self.oauth.state_ttl)
            .map_err(|e| AuthError::InternalError(format!("state ttl: {e}")))?;
        let pending = PendingAuthorization {
            service,
            redirect_uri: redirect_uri.to_string(),
            expires_at: Utc::now() + ttl,
        };
        self.states.save(&state, pending).await?;
        debug!(%service, "oauth flow started");

        Ok(OAuthStart {
            auth_url: auth_url.into(),
            state,
        })
    }

    async fn handle_oauth_callback(
        &self,
        service: ServiceKind,
        code: &str,
        state: &str,
    ) -> Result<AuthOutcome, AuthError> {
        let pending = self
            .states
            .take(&OAuthState(state.to_string()), Utc::now())
            .await?
            .ok_or(AuthError::InvalidState)?;
        if pending.service != service {
            warn!(expected = %service, actual = %pending.service, "oauth state for another service");
            return Err(AuthError::InvalidState);
        }
        if code.trim().is_empty() {
            return Err(AuthError::BadRequest("missing authorization code".to_string()));
        }

        let (Some(client_id), Some(client_secret)) =
            (&self.oauth.client_id, &self.oauth.client_secret)
        else {
            return Err(AuthError::OAuthNotConfigured(service));
        };
        let request = TokenExchangeRequest {
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
            code: code.to_string(),
            redirect_uri: pending.redirect_uri,
        };
        let tokens = self
            .gateway
            .exchange_code(&request)
            .await
            .map_err(|e| match e {
                GatewayError::Status { status, .. } => AuthError::TokenExchange { status },
                other => AuthError::from(other),
            })?;

        let user_info = match self.gateway.current_user(&tokens.access_token).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("user profile lookup failed: {}", e);
                None
            }
        };
        let cloud_id = self.resolve_cloud_id(service, &tokens.access_token).await;

        let credential = Credential::OAuth {
            expires_at: tokens
                .expires_in
                .map(|secs| Utc::now() + chrono::Duration::seconds(secs)),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            cloud_id,
        };
        self.open_session(Session::new(service, credential, user_info))
            .await
    }

    async fn authenticate_api_token(
        &self,
        service: ServiceKind,
        input: ApiTokenInput,
    ) -> Result<AuthOutcome, AuthError> {
        let domain = normalize_domain(&input.domain)?;
        let email = input.email.trim().to_string();
        if email.is_empty() || input.api_token.is_empty() {
            return Err(AuthError::BadRequest(
                "email and api_token are required".to_string(),
            ));
        }

        let credential = Credential::ApiToken {
            domain,
            email,
            api_token: input.api_token,
        };
        let profile = self
            .gateway
            .get_json(service, &credential, service.whoami_path(), &[])
            .await
            .map_err(|e| match e {
                GatewayError::Status {
                    status: 401 | 403, ..
                } => AuthError::InvalidCredentials,
                other => AuthError::from(other),
            })?;

        self.open_session(Session::new(service, credential, Some(profile)))
            .await
    }

    async fn authorize(&self, token: &str, service: ServiceKind) -> Result<Session, AuthError> {
        let id = self.signer.verify(token).ok_or(AuthError::Unauthenticated)?;
        let session = self
            .sessions
            .get(&id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        if session.service != service {
            return Err(AuthError::WrongService { expected: service });
        }
        Ok(session)
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        if let Some(id) = self.signer.verify(token) {
            if self.sessions.delete(&id).await? {
                info!(session = %id, "session closed");
            }
        }
        Ok(())
    }
}
