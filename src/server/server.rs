use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_atlassian::*;
use crate::infra_memory::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;
use std::time::Duration;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub jira_service: Arc<dyn JiraService>,
    pub confluence_service: Arc<dyn ConfluenceService>,
    pub cookie_secure: bool,
    session_store: Arc<MemorySessionStore>,
}

impl Server {
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let gateway: Arc<dyn AtlassianGateway> = match settings.atlassian.backend.as_str() {
            "fake" => Arc::new(FakeAtlassianGateway::new()),
            "real" => Arc::new(HttpAtlassianGateway::try_new(AtlassianEndpoints {
                token_url: settings.atlassian.token_url.clone(),
                api_base: settings.atlassian.api_base.clone(),
                site_scheme: settings.atlassian.site_scheme.clone(),
            })?),
            other => return Err(anyhow::anyhow!("Unknown atlassian backend: {}", other)),
        };
        info!(backend = %settings.atlassian.backend, "atlassian gateway ready");

        Ok(Self::with_gateway(settings, gateway))
    }

    /// Wires the services around an already-built gateway.
    pub fn with_gateway(settings: &Settings, gateway: Arc<dyn AtlassianGateway>) -> Self {
        let session_store = Arc::new(MemorySessionStore::new());
        let state_store: Arc<dyn OAuthStateStore> = Arc::new(MemoryOAuthStateStore::new());

        let oauth = OAuthClientConfig {
            authorize_url: settings.atlassian.auth_url.clone(),
            client_id: settings.oauth.client_id.clone(),
            client_secret: settings.oauth.client_secret.clone(),
            jira_redirect_uri: settings.oauth.jira_redirect_uri.clone(),
            confluence_redirect_uri: settings.oauth.confluence_redirect_uri.clone(),
            state_ttl: Duration::from_secs(settings.oauth.state_ttl_secs),
        };
        if oauth.client_id.is_none() {
            warn!("ATLASSIAN_CLIENT_ID not set, OAuth login is disabled");
        }

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            session_store.clone(),
            state_store,
            gateway.clone(),
            SessionSigner::new(settings.session.secret_key.as_str()),
            oauth,
        ));
        let jira_service: Arc<dyn JiraService> = Arc::new(RealJiraService::new(gateway.clone()));
        let confluence_service: Arc<dyn ConfluenceService> =
            Arc::new(RealConfluenceService::new(gateway));

        info!("server started");

        Self {
            auth_service,
            jira_service,
            confluence_service,
            cookie_secure: settings.http.cookie_secure,
            session_store,
        }
    }

    pub async fn shutdown(&self) {
        info!(
            sessions = self.session_store.len(),
            "server shutting down, dropping in-memory sessions"
        );
        self.session_store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_model::ServiceKind;

    #[tokio::test]
    async fn fake_backend_wires_every_service() {
        let server = Server::try_new(&Settings::for_tests()).unwrap();
        let start = server
            .auth_service
            .start_oauth(ServiceKind::Confluence)
            .await
            .unwrap();
        assert!(start.auth_url.contains("read%3Aconfluence-user"));

        server.shutdown().await;
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let mut settings = Settings::for_tests();
        settings.atlassian.backend = "mock".to_string();
        let err = Server::try_new(&settings).err().unwrap();
        assert!(err.to_string().contains("mock"));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut settings = Settings::for_tests();
        settings.session.secret_key = String::new();
        assert!(Server::try_new(&settings).is_err());
    }
}
