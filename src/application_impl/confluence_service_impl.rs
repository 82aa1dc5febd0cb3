use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

const SPACE_PATH: [&str; 4] = ["wiki", "rest", "api", "space"];
const CONTENT_PATH: [&str; 4] = ["wiki", "rest", "api", "content"];
const SPACE_LIST_LIMIT: u32 = 50;

// Upstream shapes, only the fields the dashboard shows.

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawSpace {
    id: Value,
    key: String,
    name: String,
    #[serde(rename = "type")]
    space_type: Option<String>,
    status: Option<String>,
    description: Option<RawDescription>,
    #[serde(default = "empty_object")]
    icon: Value,
    #[serde(rename = "_links", default = "empty_object")]
    links: Value,
}

#[derive(Debug, Deserialize)]
struct RawDescription {
    plain: Option<RawPlain>,
}

#[derive(Debug, Deserialize)]
struct RawPlain {
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    id: Value,
    #[serde(rename = "type")]
    content_type: String,
    title: String,
    status: Option<String>,
    version: Option<RawVersion>,
    #[serde(rename = "_links", default = "empty_object")]
    links: Value,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    number: u64,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

// Confluence ids arrive as numbers on some endpoints and strings on others.
fn id_string(id: Value) -> String {
    match id {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl From<RawSpace> for Space {
    fn from(raw: RawSpace) -> Self {
        Space {
            id: id_string(raw.id),
            key: raw.key,
            name: raw.name,
            space_type: raw.space_type,
            status: raw.status,
            description: raw
                .description
                .and_then(|d| d.plain)
                .map(|p| p.value)
                .unwrap_or_default(),
            icon: raw.icon,
            links: raw.links,
        }
    }
}

impl From<RawContent> for ContentItem {
    fn from(raw: RawContent) -> Self {
        ContentItem {
            id: id_string(raw.id),
            content_type: raw.content_type,
            title: raw.title,
            status: raw.status,
            version: raw.version.map(|v| v.number),
            links: raw.links,
        }
    }
}

fn decode_page<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>, ServiceError> {
    serde_json::from_value::<Page<T>>(value)
        .map(|page| page.results)
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}

fn space_not_found(key: &str) -> impl FnOnce(GatewayError) -> ServiceError + '_ {
    move |e| match e {
        GatewayError::Status { status: 404, .. } => ServiceError::NotFound(format!("space {key}")),
        other => other.into(),
    }
}

pub struct RealConfluenceService {
    gateway: Arc<dyn AtlassianGateway>,
}

impl RealConfluenceService {
    pub fn new(gateway: Arc<dyn AtlassianGateway>) -> Self {
        Self { gateway }
    }

    async fn fetch_spaces(&self, session: &Session) -> Result<Value, GatewayError> {
        let query = [
            ("expand", "description.plain,icon".to_string()),
            ("limit", SPACE_LIST_LIMIT.to_string()),
        ];
        self.gateway
            .get_json(ServiceKind::Confluence, &session.credential, &SPACE_PATH, &query)
            .await
    }
}

#[async_trait::async_trait]
impl ConfluenceService for RealConfluenceService {
    async fn list_spaces(&self, session: &Session) -> Result<Vec<Space>, ServiceError> {
        if !session.credential.has_site() {
            return Ok(Vec::new());
        }
        let value = self.fetch_spaces(session).await?;
        let spaces: Vec<RawSpace> = decode_page(value)?;
        Ok(spaces.into_iter().map(Space::from).collect())
    }

    async fn get_space(&self, session: &Session, key: &str) -> Result<Value, ServiceError> {
        if key.is_empty() {
            return Err(ServiceError::BadRequest("space key is empty".to_string()));
        }
        let segments = ["wiki", "rest", "api", "space", key];
        let query = [("expand", "description.plain,icon,permissions".to_string())];
        self.gateway
            .get_json(ServiceKind::Confluence, &session.credential, &segments, &query)
            .await
            .map_err(space_not_found(key))
    }

    async fn get_space_content(
        &self,
        session: &Session,
        key: &str,
        limit: u32,
    ) -> Result<Vec<ContentItem>, ServiceError> {
        if key.is_empty() {
            return Err(ServiceError::BadRequest("space key is empty".to_string()));
        }
        if !(1..=MAX_CONTENT_LIMIT).contains(&limit) {
            return Err(ServiceError::BadRequest(format!(
                "limit must be between 1 and {MAX_CONTENT_LIMIT}"
            )));
        }
        if !session.credential.has_site() {
            return Ok(Vec::new());
        }
        let query = [
            ("spaceKey", key.to_string()),
            ("expand", "version,space".to_string()),
            ("limit", limit.to_string()),
        ];
        let value = self
            .gateway
            .get_json(ServiceKind::Confluence, &session.credential, &CONTENT_PATH, &query)
            .await
            .map_err(space_not_found(key))?;
        let items: Vec<RawContent> = decode_page(value)?;
        Ok(items.into_iter().map(ContentItem::from).collect())
    }

    async fn validate_connection(&self, session: &Session) -> Result<(), ServiceError> {
        self.fetch_spaces(session).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_atlassian::FakeAtlassianGateway;
    use serde_json::json;

    fn session() -> Session {
        Session::new(
            ServiceKind::Confluence,
            Credential::ApiToken {
                domain: "acme.atlassian.net".into(),
                email: "dev@acme.io".into(),
                api_token: "token".into(),
            },
            None,
        )
    }

    fn siteless_oauth_session() -> Session {
        Session::new(
            ServiceKind::Confluence,
            Credential::OAuth {
                access_token: "at".into(),
                refresh_token: None,
                token_type: "Bearer".into(),
                cloud_id: None,
                expires_at: None,
            },
            None,
        )
    }

    fn service() -> (RealConfluenceService, Arc<FakeAtlassianGateway>) {
        let gateway = Arc::new(FakeAtlassianGateway::new());
        (RealConfluenceService::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn spaces_are_flattened() {
        let (service, gateway) = service();
        let spaces = service.list_spaces(&session()).await.unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].id, "98304");
        assert_eq!(spaces[0].description, "Engineering handbook");
        assert_eq!(spaces[1].description, "");
        assert_eq!(spaces[1].icon, json!({}));
    }

    #[tokio::test]
    async fn content_is_limited_and_mapped() {
        let (service, gateway) = service();
        let items = service
            .get_space_content(&session(), "ENG", 1)
            .await
            .unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content_type, "page");
        assert_eq!(items[0].version, Some(3));
    }

    #[tokio::test]
    async fn session_without_site_lists_nothing() {
        let (service, gateway) = service();
        let session = siteless_oauth_session();

        assert!(service.list_spaces(&session).await.unwrap().is_empty());
        let items = service
            .get_space_content(&session, "ENG", 10)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(gateway.calls(), 0);

        let err = service
            .get_space_content(&session, "ENG", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(_)));
    }

    #[tokio::test]
    async fn content_limit_out_of_range_makes_no_call() {
        let (service, gateway) = service();
        for limit in [0, MAX_CONTENT_LIMIT + 1] {
            let err = service
                .get_space_content(&session(), "ENG", limit)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::BadRequest(_)));
        }
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_space_is_not_found() {
        let (service, _) = service();
        let space = service.get_space(&session(), "ENG").await.unwrap();
        assert_eq!(space["name"], "Engineering");

        let err = service.get_space(&session(), "NOPE").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn validate_connection_reports_upstream_status() {
        let (service, gateway) = service();
        service.validate_connection(&session()).await.unwrap();

        gateway.fail_with("/wiki/rest/api/space", 403);
        let err = service.validate_connection(&session()).await.unwrap_err();
        assert!(matches!(err, ServiceError::UpstreamError { status: 403 }));
    }

    #[test]
    fn malformed_page_is_invalid_response() {
        let err = decode_page::<RawSpace>(json!({ "results": [{ "key": 1 }] })).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidResponse(_)));
    }
}
