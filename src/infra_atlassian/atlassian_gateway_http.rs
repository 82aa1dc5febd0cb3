use crate::domain_model::{CloudResource, Credential, OAuthTokens, ServiceKind};
use crate::domain_port::*;
use crate::logger::*;
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenType};
use oauth2::{
    AsyncHttpClient, AuthType, AuthorizationCode, ClientId, ClientSecret, HttpRequest, RedirectUrl,
    RequestTokenError, TokenResponse, TokenUrl,
};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU16, Ordering};

/// Upper bound on how much of an error body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone)]
pub struct AtlassianEndpoints {
    pub token_url: String,
    pub api_base: String,
    /// Scheme used to reach `<domain>` for API-token credentials.
    pub site_scheme: String,
}

pub struct HttpAtlassianGateway {
    http: Client,
    /// Used for the token endpoint only; never follows redirects.
    oauth_http: Client,
    endpoints: AtlassianEndpoints,
}

impl HttpAtlassianGateway {
    pub fn try_new(endpoints: AtlassianEndpoints) -> anyhow::Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            oauth_http: Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()?,
            endpoints,
        })
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        with_segments(&self.endpoints.api_base, segments)
    }

    fn product_url(
        &self,
        service: ServiceKind,
        credential: &Credential,
        segments: &[&str],
    ) -> Result<Url, GatewayError> {
        match credential {
            Credential::OAuth { cloud_id, .. } => {
                let cloud_id = cloud_id.as_deref().ok_or(GatewayError::NoSite)?;
                let mut full = vec!["ex", service.as_str(), cloud_id];
                full.extend_from_slice(segments);
                self.api_url(&full)
            }
            Credential::ApiToken { domain, .. } => {
                let base = format!("{}://{}", self.endpoints.site_scheme, domain);
                with_segments(&base, segments)
            }
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        decode(response).await
    }
}

fn with_segments(base: &str, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url =
        Url::parse(base).map_err(|e| GatewayError::Config(format!("bad base url {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| GatewayError::Config(format!("base url cannot have a path: {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn truncate_body(mut body: String) -> String {
    if body.len() > ERROR_BODY_LIMIT {
        let mut cut = ERROR_BODY_LIMIT;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = truncate_body(response.text().await.unwrap_or_default());
        debug!(status = status.as_u16(), %body, "upstream error response");
        return Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

/// `status` is the HTTP status the token endpoint answered with, 0 if none.
fn token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>, status: u16) -> GatewayError
where
    RE: std::error::Error + 'static,
{
    let answered_with_error = status != 0 && status != 200;
    match err {
        RequestTokenError::Request(e) => GatewayError::Unavailable(e.to_string()),
        RequestTokenError::ServerResponse(e) => GatewayError::Status {
            status: if answered_with_error { status } else { 400 },
            body: truncate_body(e.to_string()),
        },
        RequestTokenError::Parse(_, body) if answered_with_error => GatewayError::Status {
            status,
            body: truncate_body(String::from_utf8_lossy(&body).into_owned()),
        },
        RequestTokenError::Other(message) if answered_with_error => GatewayError::Status {
            status,
            body: message,
        },
        RequestTokenError::Parse(e, _) => GatewayError::Decode(e.to_string()),
        RequestTokenError::Other(message) => GatewayError::Decode(message),
    }
}

fn token_type_name(token_type: &BasicTokenType) -> String {
    match token_type {
        BasicTokenType::Bearer => "Bearer".to_string(),
        BasicTokenType::Mac => "MAC".to_string(),
        BasicTokenType::Extension(other) => other.clone(),
    }
}

#[async_trait::async_trait]
impl AtlassianGateway for HttpAtlassianGateway {
    async fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<OAuthTokens, GatewayError> {
        let token_url = TokenUrl::new(self.endpoints.token_url.clone())
            .map_err(|e| GatewayError::Config(format!("token url: {e}")))?;
        let redirect_url = RedirectUrl::new(request.redirect_uri.clone())
            .map_err(|e| GatewayError::Config(format!("redirect uri: {e}")))?;
        let client = BasicClient::new(ClientId::new(request.client_id.clone()))
            .set_client_secret(ClientSecret::new(request.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        // oauth2 does not report the status of a failed exchange; record it.
        let status = std::sync::Arc::new(AtomicU16::new(0));
        let status_ref = status.clone();
        let oauth_http = self.oauth_http.clone();
        let http = move |http_request: HttpRequest| {
            let status = status_ref.clone();
            let oauth_http = oauth_http.clone();
            async move {
                let response = oauth_http.call(http_request).await;
                if let Ok(response) = &response {
                    status.store(response.status().as_u16(), Ordering::Relaxed);
                }
                response
            }
        };
        let token = client
            .exchange_code(AuthorizationCode::new(request.code.clone()))
            .request_async(&http)
            .await
            .map_err(|e| token_error(e, status.load(Ordering::Relaxed)))?;

        Ok(OAuthTokens {
            access_token: token.access_token().secret().clone(),
            refresh_token: token.refresh_token().map(|t| t.secret().clone()),
            token_type: token_type_name(token.token_type()),
            expires_in: token
                .expires_in()
                .and_then(|ttl| i64::try_from(ttl.as_secs()).ok()),
            scope: token.scopes().map(|scopes| {
                scopes
                    .iter()
                    .map(|scope| scope.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
        })
    }

    async fn accessible_resources(
        &self,
        access_token: &str,
    ) -> Result<Vec<CloudResource>, GatewayError> {
        let url = self.api_url(&["oauth", "token", "accessible-resources"])?;
        self.send(self.http.get(url).bearer_auth(access_token)).await
    }

    async fn current_user(&self, access_token: &str) -> Result<Value, GatewayError> {
        let url = self.api_url(&["me"])?;
        self.send(self.http.get(url).bearer_auth(access_token)).await
    }

    async fn get_json(
        &self,
        service: ServiceKind,
        credential: &Credential,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, GatewayError> {
        let url = self.product_url(service, credential, segments)?;
        trace!(%url, "atlassian GET");
        let request = self.http.get(url).query(query);
        let request = match credential {
            Credential::OAuth { access_token, .. } => request.bearer_auth(access_token),
            Credential::ApiToken {
                email, api_token, ..
            } => request.basic_auth(email, Some(api_token)),
        };
        self.send(request).await
    }
}
