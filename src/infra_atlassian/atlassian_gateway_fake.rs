use crate::domain_model::{CloudResource, Credential, OAuthTokens, ServiceKind};
use crate::domain_port::*;
use dashmap::DashMap;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const FAKE_SITE_ID: &str = "fake-site";

/// API token the fake backend refuses, to demo the failure path.
pub const FAKE_REJECTED_API_TOKEN: &str = "invalid";

/// Canned Atlassian backend for running the dashboard without an
/// Atlassian account. Counts every call and can be told to fail.
#[derive(Default)]
pub struct FakeAtlassianGateway {
    calls: AtomicUsize,
    unreachable: AtomicBool,
    // Operation name or joined path -> HTTP status to answer with.
    failures: DashMap<String, u16>,
}

impl FakeAtlassianGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Answer `status` for an operation (`exchange_code`,
    /// `accessible_resources`, `current_user`) or a product path such as
    /// `/rest/api/3/project`.
    pub fn fail_with(&self, operation: &str, status: u16) {
        self.failures.insert(operation.to_string(), status);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    fn enter(&self, operation: &str) -> Result<(), GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "connection refused (fake)".to_string(),
            ));
        }
        if let Some(status) = self.failures.get(operation) {
            return Err(GatewayError::Status {
                status: *status,
                body: format!("fake failure for {operation}"),
            });
        }
        Ok(())
    }
}

fn not_found() -> GatewayError {
    GatewayError::Status {
        status: 404,
        body: "not found (fake)".to_string(),
    }
}

fn projects() -> Value {
    json!([
        {
            "id": "10000",
            "key": "DASH",
            "name": "Dashboard",
            "projectTypeKey": "software",
            "simplified": true,
            "style": "next-gen",
            "isPrivate": false,
            "avatarUrls": {}
        },
        {
            "id": "10001",
            "key": "OPS",
            "name": "Operations",
            "projectTypeKey": "service_desk",
            "simplified": false,
            "style": "classic",
            "isPrivate": true,
            "avatarUrls": {}
        }
    ])
}

fn spaces() -> Value {
    json!([
        {
            "id": 98304,
            "key": "ENG",
            "name": "Engineering",
            "type": "global",
            "status": "current",
            "description": { "plain": { "value": "Engineering handbook", "representation": "plain" } },
            "icon": { "path": "/images/logo/default-space-logo.svg", "width": 48, "height": 48 },
            "_links": { "webui": "/spaces/ENG" }
        },
        {
            "id": 98305,
            "key": "HR",
            "name": "People",
            "type": "global",
            "status": "current",
            "_links": { "webui": "/spaces/HR" }
        }
    ])
}

fn content() -> Vec<Value> {
    vec![
        json!({
            "id": "65601",
            "type": "page",
            "status": "current",
            "title": "Onboarding",
            "space": { "key": "ENG" },
            "version": { "number": 3 },
            "_links": { "webui": "/spaces/ENG/pages/65601" }
        }),
        json!({
            "id": "65602",
            "type": "blogpost",
            "status": "current",
            "title": "Release notes",
            "space": { "key": "ENG" },
            "version": { "number": 1 },
            "_links": { "webui": "/spaces/ENG/blog/65602" }
        }),
        json!({
            "id": "65700",
            "type": "page",
            "status": "current",
            "title": "Benefits",
            "space": { "key": "HR" },
            "version": { "number": 7 },
            "_links": { "webui": "/spaces/HR/pages/65700" }
        }),
    ]
}

fn find_by_key(items: Value, key: &str) -> Result<Value, GatewayError> {
    items
        .as_array()
        .and_then(|items| items.iter().find(|item| item["key"] == key).cloned())
        .ok_or_else(not_found)
}

fn query_value<'a>(query: &'a [(&str, String)], name: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.as_str())
}

#[async_trait::async_trait]
impl AtlassianGateway for FakeAtlassianGateway {
    async fn exchange_code(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<OAuthTokens, GatewayError> {
        self.enter("exchange_code")?;
        Ok(OAuthTokens {
            access_token: format!("fake-access-token:{}", request.code),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            scope: None,
        })
    }

    async fn accessible_resources(
        &self,
        _access_token: &str,
    ) -> Result<Vec<CloudResource>, GatewayError> {
        self.enter("accessible_resources")?;
        Ok(vec![CloudResource {
            id: FAKE_SITE_ID.to_string(),
            name: "fake".to_string(),
            url: "https://fake.atlassian.net".to_string(),
            scopes: [ServiceKind::Jira, ServiceKind::Confluence]
                .iter()
                .flat_map(|service| service.oauth_scopes().split_whitespace())
                .map(String::from)
                .collect(),
        }])
    }

    async fn current_user(&self, _access_token: &str) -> Result<Value, GatewayError> {
        self.enter("current_user")?;
        Ok(json!({
            "account_id": "fake-account",
            "name": "Demo User",
            "email": "demo@fake.atlassian.net"
        }))
    }

    async fn get_json(
        &self,
        _service: ServiceKind,
        credential: &Credential,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Value, GatewayError> {
        let path = format!("/{}", segments.join("/"));
        self.enter(&path)?;

        let email = match credential {
            Credential::ApiToken { api_token, .. } if api_token == FAKE_REJECTED_API_TOKEN => {
                return Err(GatewayError::Status {
                    status: 401,
                    body: "bad credentials (fake)".to_string(),
                });
            }
            Credential::ApiToken { email, .. } => email.clone(),
            Credential::OAuth { cloud_id: None, .. } => return Err(GatewayError::NoSite),
            Credential::OAuth { .. } => "demo@fake.atlassian.net".to_string(),
        };

        match segments {
            ["rest", "api", "3", "myself"] => Ok(json!({
                "accountId": "fake-account",
                "emailAddress": email,
                "displayName": "Demo User"
            })),
            ["wiki", "rest", "api", "user", "current"] => Ok(json!({
                "accountId": "fake-account",
                "email": email,
                "displayName": "Demo User"
            })),
            ["rest", "api", "3", "project"] => Ok(projects()),
            ["rest", "api", "3", "project", key] => find_by_key(projects(), key),
            ["wiki", "rest", "api", "space"] => Ok(json!({ "results": spaces() })),
            ["wiki", "rest", "api", "space", key] => find_by_key(spaces(), key),
            ["wiki", "rest", "api", "content"] => {
                let space_key = query_value(query, "spaceKey").unwrap_or_default();
                let limit = query_value(query, "limit")
                    .and_then(|l| l.parse::<usize>().ok())
                    .unwrap_or(25);
                let results: Vec<Value> = content()
                    .into_iter()
                    .filter(|item| item["space"]["key"] == space_key)
                    .take(limit)
                    .collect();
                Ok(json!({ "results": results, "size": results.len() }))
            }
            _ => Err(not_found()),
        }
    }
}
