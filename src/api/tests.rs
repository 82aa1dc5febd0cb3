use super::*;
use crate::domain_port::AtlassianGateway;
use crate::infra_atlassian::{FAKE_REJECTED_API_TOKEN, FakeAtlassianGateway};
use crate::server::Server;
use crate::settings::Settings;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;
use warp::http::header::SET_COOKIE;
use warp::test::request;

struct App {
    gateway: Arc<FakeAtlassianGateway>,
    server: Arc<Server>,
}

impl App {
    fn new() -> Self {
        let gateway = Arc::new(FakeAtlassianGateway::new());
        let shared: Arc<dyn AtlassianGateway> = gateway.clone();
        let server = Arc::new(Server::with_gateway(&Settings::for_tests(), shared));
        App { gateway, server }
    }

    fn filter(
        &self,
    ) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone + 'static
    {
        routes(self.server.clone()).recover(recover_error)
    }

    /// Logs in with an API token and returns the session token.
    async fn login(&self, service: &str) -> String {
        let response = request()
            .method("POST")
            .path(&format!("/auth/{}/api-token", service))
            .json(&json!({
                "domain": "acme.atlassian.net",
                "email": "dev@acme.io",
                "api_token": "good"
            }))
            .reply(&self.filter())
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body(response.body())["data"]["session_id"]
            .as_str()
            .expect("session id in body")
            .to_string()
    }
}

fn body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).expect("json body")
}

fn cookie(token: &str) -> String {
    format!("{}={}", SESSION_COOKIE, token)
}

#[tokio::test]
async fn health_probe_answers() {
    let app = App::new();
    let response = request().method("GET").path("/").reply(&app.filter()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body(response.body()),
        json!({ "message": "Healthy", "status": "ok" })
    );
}

#[tokio::test]
async fn data_routes_require_a_session_and_never_call_upstream() {
    let app = App::new();
    let paths = [
        "/jira/projects",
        "/jira/projects/DASH",
        "/jira/connection/validate",
        "/confluence/spaces",
        "/confluence/spaces/ENG",
        "/confluence/spaces/ENG/content?limit=5",
        "/confluence/connection/validate",
    ];
    for path in paths {
        let response = request().method("GET").path(path).reply(&app.filter()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let json = body(response.body());
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "Unauthenticated");
    }

    let response = request()
        .method("GET")
        .path("/jira/projects")
        .header("cookie", cookie("not-a-token"))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn api_token_login_sets_cookie_and_unlocks_data() {
    let app = App::new();
    let response = request()
        .method("POST")
        .path("/auth/jira/api-token")
        .json(&json!({
            "domain": "https://acme.atlassian.net",
            "email": "dev@acme.io",
            "api_token": "good"
        }))
        .reply(&app.filter())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("HttpOnly"));
    let json = body(response.body());
    assert_eq!(json["data"]["auth_method"], "api_token");
    assert_eq!(json["message"], "Successfully authenticated with Jira");

    let token = json["data"]["session_id"].as_str().unwrap();
    let response = request()
        .method("GET")
        .path("/jira/projects")
        .header("cookie", cookie(token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response.body());
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["data"][0]["key"], "DASH");
    assert_eq!(json["data"][0]["projectTypeKey"], "software");
}

#[tokio::test]
async fn session_header_is_accepted() {
    let app = App::new();
    let token = app.login("confluence").await;

    let response = request()
        .method("GET")
        .path("/confluence/spaces/ENG/content?limit=1")
        .header(SESSION_HEADER, token)
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response.body());
    assert_eq!(json["meta"]["total"], 1);
    assert_eq!(json["data"][0]["_links"]["webui"], "/spaces/ENG/pages/65601");
}

#[tokio::test]
async fn session_of_other_product_is_forbidden() {
    let app = App::new();
    let token = app.login("jira").await;
    let calls = app.gateway.calls();

    let response = request()
        .method("GET")
        .path("/confluence/spaces")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body(response.body())["error"]["code"], "WrongService");
    assert_eq!(app.gateway.calls(), calls);
}

#[tokio::test]
async fn rejected_api_token_is_unauthorized() {
    let app = App::new();
    let response = request()
        .method("POST")
        .path("/auth/confluence/api-token")
        .json(&json!({
            "domain": "acme.atlassian.net",
            "email": "dev@acme.io",
            "api_token": FAKE_REJECTED_API_TOKEN
        }))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    assert_eq!(body(response.body())["error"]["code"], "InvalidCredentials");
}

#[tokio::test]
async fn oauth_round_trip_through_redirect_query() {
    let app = App::new();
    let response = request()
        .method("GET")
        .path("/auth/jira/oauth/start")
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response.body());
    let state = json["data"]["state"].as_str().unwrap().to_string();
    assert!(
        json["data"]["auth_url"]
            .as_str()
            .unwrap()
            .starts_with("https://auth.atlassian.com/authorize?")
    );

    let callback = format!("/auth/jira/oauth/callback?code=abc&state={}", state);
    let response = request()
        .method("GET")
        .path(&callback)
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(SET_COOKIE));
    assert_eq!(body(response.body())["data"]["auth_method"], "oauth");

    let response = request()
        .method("GET")
        .path(&callback)
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response.body())["error"]["code"], "InvalidState");
}

#[tokio::test]
async fn oauth_callback_accepts_json_body() {
    let app = App::new();
    let response = request()
        .method("POST")
        .path("/auth/confluence/oauth/callback")
        .json(&json!({ "code": "abc", "state": "forged" }))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response.body())["error"]["code"], "InvalidState");
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn logout_clears_cookie_and_session() {
    let app = App::new();
    let token = app.login("jira").await;

    let response = request()
        .method("POST")
        .path("/auth/logout")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("Max-Age=0"));

    let response = request()
        .method("GET")
        .path("/jira/projects")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown sessions log out just as well.
    let response = request()
        .method("POST")
        .path("/auth/logout?session_id=unknown")
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upstream_status_is_reported() {
    let app = App::new();
    let token = app.login("jira").await;
    app.gateway.fail_with("/rest/api/3/project", 403);

    let response = request()
        .method("GET")
        .path("/jira/projects")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body(response.body());
    assert_eq!(json["error"]["code"], "UpstreamError");
    assert_eq!(json["error"]["status"], 403);

    let response = request()
        .method("GET")
        .path("/jira/connection/validate")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body(response.body())["data"]["valid"], false);
}

#[tokio::test]
async fn bad_input_is_a_client_error() {
    let app = App::new();
    let token = app.login("confluence").await;

    let response = request()
        .method("GET")
        .path("/confluence/spaces/ENG/content?limit=500")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = request()
        .method("POST")
        .path("/auth/jira/api-token")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(response.body())["error"]["code"], "BadRequest");
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
    let app = App::new();
    for path in ["/nope", "/auth/bitbucket/oauth/start", "/jira"] {
        let response = request().method("GET").path(path).reply(&app.filter()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(body(response.body())["error"]["code"], "NotFound");
    }
}

#[tokio::test]
async fn lists_carry_count_message_and_space_key() {
    let app = App::new();
    let token = app.login("confluence").await;

    let response = request()
        .method("GET")
        .path("/confluence/spaces")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response.body());
    assert_eq!(json["message"], "Retrieved 2 spaces");
    assert!(json["meta"].get("space_key").is_none());

    let response = request()
        .method("GET")
        .path("/confluence/spaces/ENG/content?limit=5")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body(response.body());
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["meta"]["space_key"], "ENG");
    assert_eq!(json["message"], "Retrieved 2 content items");

    let token = app.login("jira").await;
    let response = request()
        .method("GET")
        .path("/jira/projects")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(body(response.body())["message"], "Retrieved 2 projects");
}

#[tokio::test]
async fn path_keys_reach_upstream_decoded() {
    let app = App::new();
    let token = app.login("jira").await;
    app.gateway.fail_with("/rest/api/3/project/A B", 429);

    let response = request()
        .method("GET")
        .path("/jira/projects/A%20B")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body(response.body())["error"]["status"], 429);

    let token = app.login("confluence").await;
    app.gateway.fail_with("/wiki/rest/api/space/~dev user", 403);
    let response = request()
        .method("GET")
        .path("/confluence/spaces/%7Edev%20user")
        .header("cookie", cookie(&token))
        .reply(&app.filter())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
