use std::sync::Arc;

use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};

use super::*;
use crate::gateway::memory::MemoryGateway;
use crate::services::session::{ACCESS_COOKIE, REFRESH_COOKIE};
use crate::state::test_helpers::{seed_session, test_app_state};

struct TestServer {
    base: String,
    client: Client,
    gateway: Arc<MemoryGateway>,
}

impl TestServer {
    async fn start() -> Self {
        let (state, gateway) = test_app_state();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        let client = Client::builder().redirect(Policy::none()).build().unwrap();
        Self { base: format!("http://{addr}"), client, gateway }
    }

    async fn get(&self, path: &str, cookies: &str) -> Response {
        let mut request = self.client.get(format!("{}{path}", self.base));
        if !cookies.is_empty() {
            request = request.header(COOKIE, cookies);
        }
        request.send().await.unwrap()
    }
}

fn location(response: &Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

/// `name=value` pairs from `Set-Cookie` headers, ready for a `Cookie` header.
fn cookie_header(response: &Response) -> String {
    set_cookies(response)
        .iter()
        .filter_map(|c| c.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn healthz_is_ok() {
    let server = TestServer::start().await;
    let response = server.get("/healthz", "").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_pages_render_for_anonymous_visitors() {
    let server = TestServer::start().await;
    for path in ["/", "/products", "/login", "/register"] {
        let response = server.get(path, "").await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
}

#[tokio::test]
async fn anonymous_profile_request_redirects_to_login() {
    let server = TestServer::start().await;
    let response = server.get("/profile/general", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn login_then_profile_then_logout() {
    let server = TestServer::start().await;
    seed_session(&server.gateway, "alice@example.com", "secret1").await;

    let response = server
        .client
        .post(format!("{}/login", server.base))
        .form(&[("email", "alice@example.com"), ("password", "secret1")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let cookies = cookie_header(&response);
    assert!(cookies.contains(ACCESS_COOKIE));

    let profile = server.get("/profile/general", &cookies).await;
    assert_eq!(profile.status(), StatusCode::OK);
    assert!(profile.text().await.unwrap().contains("alice@example.com"));

    let login = server.get("/login", &cookies).await;
    assert_eq!(login.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&login), "/");

    let logout = server.get("/logout", &cookies).await;
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    let cleared = set_cookies(&logout);
    assert!(cleared.iter().any(|c| c.starts_with(&format!("{ACCESS_COOKIE}=")) && c.contains("Max-Age=0")));

    let after = server.get("/profile/general", &cookies).await;
    assert_eq!(after.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&after), "/login");
}

#[tokio::test]
async fn logout_twice_is_harmless() {
    let server = TestServer::start().await;
    let session = seed_session(&server.gateway, "alice@example.com", "secret1").await;
    let cookies = format!("{ACCESS_COOKIE}={}", session.tokens.access_token);

    for _ in 0..2 {
        let response = server.get("/logout", &cookies).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
    }
}

#[tokio::test]
async fn stale_access_token_is_refreshed_by_middleware() {
    let server = TestServer::start().await;
    let session = seed_session(&server.gateway, "alice@example.com", "secret1").await;
    let refresh = session.tokens.refresh_token.unwrap();
    let cookies = format!("{ACCESS_COOKIE}=expired; {REFRESH_COOKIE}={refresh}");

    let response = server.get("/profile/general", &cookies).await;
    assert_eq!(response.status(), StatusCode::OK);
    let issued = set_cookies(&response);
    assert!(issued.iter().any(|c| c.starts_with(&format!("{ACCESS_COOKIE}=")) && !c.contains("Max-Age=0")));
    assert!(issued.iter().any(|c| c.starts_with(&format!("{REFRESH_COOKIE}=")) && !c.contains(&refresh)));
}

#[tokio::test]
async fn revoked_session_is_cleared_and_guarded() {
    let server = TestServer::start().await;
    let cookies = format!("{ACCESS_COOKIE}=expired; {REFRESH_COOKIE}=revoked");

    let response = server.get("/profile/general", &cookies).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    let cleared = set_cookies(&response);
    assert!(cleared.iter().any(|c| c.starts_with(&format!("{ACCESS_COOKIE}=")) && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn unknown_oauth_provider_is_not_found() {
    let server = TestServer::start().await;
    let response = server.get("/auth/myspace", "").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
