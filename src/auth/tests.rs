use super::*;
use crate::claims::tests::{EMPLOYEE_ID, sample_token};
use crate::pipeline::CookieHandler;
use crate::request::Credentials;
use crate::request::mock::MockHttpClient;
use crate::session::AuthState;
use crate::storage::MemoryStorage;
use chrono::{TimeZone, Utc};
use serde_json::json;
use std::cell::RefCell;
use taskmanager_shared::{STORAGE_KEY_ACCESS_TOKEN, STORAGE_KEY_EXPIRES_AT};

// =========================================================
// Shared fixtures
// =========================================================

const LOGIN_URL: &str = "http://tm.local/api/v1/auth/login";
const REGISTER_URL: &str = "http://tm.local/api/v1/auth/register";
const REFRESH_URL: &str = "http://tm.local/api/v1/auth/refresh";
const LOGOUT_URL: &str = "http://tm.local/api/v1/auth/logout";

type TestAuthClient = AuthClient<CookieHandler<Rc<MockHttpClient>>, MemoryStorage>;

struct Harness {
    http: Rc<MockHttpClient>,
    storage: Rc<MemoryStorage>,
    tokens: TokenStore<MemoryStorage>,
    session: Rc<SessionNotifier<MemoryStorage>>,
    seen: Rc<RefCell<Vec<AuthState>>>,
    client: TestAuthClient,
}

fn setup() -> Harness {
    let http = Rc::new(MockHttpClient::new());
    let storage = Rc::new(MemoryStorage::new());
    let tokens = TokenStore::new(storage.clone());
    let session = Rc::new(SessionNotifier::new(tokens.clone()));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    session.subscribe(move |s| sink.borrow_mut().push(s.clone()));

    let config = ClientConfig::resolve("http://tm.local", "/api/v1").unwrap();
    let client = AuthClient::new(
        CookieHandler::new(http.clone()),
        config,
        tokens.clone(),
        session.clone(),
    );

    Harness {
        http,
        storage,
        tokens,
        session,
        seen,
        client,
    }
}

fn employee_json() -> serde_json::Value {
    json!({
        "id": EMPLOYEE_ID,
        "name": "A",
        "email": "a@b.com",
        "department": "QA",
        "position": "Lead",
        "created_at": "2024-06-01T10:00:00Z",
        "updated_at": "2024-06-01T10:00:00Z"
    })
}

fn auth_ok(token: &str) -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "access_token": token,
            "expires_at": "2025-01-01T00:00:00Z",
            "employee": employee_json()
        }
    })
}

fn login_request() -> LoginRequest {
    LoginRequest {
        email: "a@b.com".into(),
        password: "12345678".into(),
    }
}

async fn stored_token(h: &Harness) -> Option<String> {
    h.tokens.load().await.unwrap().map(|t| t.access_token)
}

// =========================================================
// Login / register
// =========================================================

#[tokio::test]
async fn login_persists_token_and_announces_identity() {
    let h = setup();
    h.http
        .mock_response(HttpMethod::Post, LOGIN_URL, 200, auth_ok("h.e.s"));

    let auth = h.client.login(&login_request()).await.unwrap();
    assert_eq!(auth.access_token, "h.e.s");

    let token = h.tokens.load().await.unwrap().unwrap();
    assert_eq!(token.access_token, "h.e.s");
    assert_eq!(
        token.expires_at,
        Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    );

    let state = h.session.current();
    let identity = state.identity().unwrap();
    assert_eq!(identity.name, "A");
    assert_eq!(identity.email, "a@b.com");
    assert_eq!(identity.employee_id.to_string(), EMPLOYEE_ID);
    assert_eq!(h.seen.borrow().len(), 1);
}

#[tokio::test]
async fn login_sends_credentials_but_never_a_bearer_header() {
    let h = setup();
    h.storage
        .set_item(STORAGE_KEY_ACCESS_TOKEN, "stale.token.value")
        .await
        .unwrap();
    h.http
        .mock_response(HttpMethod::Post, LOGIN_URL, 200, auth_ok("h.e.s"));

    h.client.login(&login_request()).await.unwrap();

    let sent = h.http.last_request().unwrap();
    assert_eq!(sent.credentials, Credentials::Include);
    assert!(sent.header("authorization").is_none());
    let body: serde_json::Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"email": "a@b.com", "password": "12345678"}));
}

#[tokio::test]
async fn login_http_failure_carries_raw_body() {
    let h = setup();
    h.http
        .mock_raw(HttpMethod::Post, LOGIN_URL, 401, "invalid credentials");

    let err = h.client.login(&login_request()).await.unwrap_err();
    assert_eq!(err.status, crate::error::ClientErrorStatus::Transport);
    assert_eq!(err.message(), "invalid credentials");
    assert!(err.is_unauthorized());
    assert_eq!(stored_token(&h).await, None);
    assert_eq!(h.session.current(), AuthState::Anonymous);
    assert!(h.seen.borrow().is_empty());
}

#[tokio::test]
async fn login_envelope_failure_uses_server_message() {
    let h = setup();
    h.http.mock_response(
        HttpMethod::Post,
        LOGIN_URL,
        200,
        json!({"success": false, "error": {"code": "UNAUTHORIZED", "message": "wrong password"}}),
    );

    let err = h.client.login(&login_request()).await.unwrap_err();
    assert_eq!(err.status, crate::error::ClientErrorStatus::Application);
    assert_eq!(err.message(), "wrong password");
    assert_eq!(err.api_code(), Some("UNAUTHORIZED"));
    assert_eq!(stored_token(&h).await, None);
}

#[tokio::test]
async fn login_without_data_uses_fallback_message() {
    let h = setup();
    h.http.mock_response(
        HttpMethod::Post,
        LOGIN_URL,
        200,
        json!({"success": true, "data": null}),
    );

    let err = h.client.login(&login_request()).await.unwrap_err();
    assert_eq!(err.message(), LOGIN_FAILED);
    assert_eq!(h.session.current(), AuthState::Anonymous);
}

#[tokio::test]
async fn register_omits_confirmation_and_authenticates() {
    let h = setup();
    h.http
        .mock_response(HttpMethod::Post, REGISTER_URL, 201, auth_ok("r.e.g"));

    let req = RegisterRequest {
        name: "A".into(),
        department: "QA".into(),
        position: "Lead".into(),
        email: "a@b.com".into(),
        password: "12345678".into(),
        confirm_password: "12345678".into(),
    };
    h.client.register(&req).await.unwrap();

    let body = h.http.last_request().unwrap().body.unwrap();
    assert!(!body.contains("confirm_password"));
    assert_eq!(stored_token(&h).await.as_deref(), Some("r.e.g"));
    assert!(h.session.current().is_authenticated());
}

#[tokio::test]
async fn register_failure_message_falls_back_when_server_is_silent() {
    let h = setup();
    h.http.mock_response(
        HttpMethod::Post,
        REGISTER_URL,
        200,
        json!({"success": false}),
    );
    let err = h.client.register(&RegisterRequest::default()).await.unwrap_err();
    assert_eq!(err.message(), REGISTER_FAILED);
}

// =========================================================
// Logout
// =========================================================

async fn signed_in() -> Harness {
    let h = setup();
    h.http
        .mock_response(HttpMethod::Post, LOGIN_URL, 200, auth_ok("h.e.s"));
    h.client.login(&login_request()).await.unwrap();
    h
}

async fn assert_logged_out(h: &Harness) {
    assert_eq!(stored_token(h).await, None);
    assert_eq!(h.storage.get_item(STORAGE_KEY_EXPIRES_AT).await.unwrap(), None);
    assert_eq!(h.session.current(), AuthState::Anonymous);
    assert_eq!(h.seen.borrow().last(), Some(&AuthState::Anonymous));
}

#[tokio::test]
async fn logout_clears_everything() {
    let h = signed_in().await;
    h.http
        .mock_response(HttpMethod::Post, LOGOUT_URL, 200, json!({"success": true}));

    h.client.logout().await;

    assert_logged_out(&h).await;
    let sent = h.http.last_request().unwrap();
    assert_eq!(sent.url, LOGOUT_URL);
    assert_eq!(sent.credentials, Credentials::Include);
}

#[tokio::test]
async fn logout_survives_network_failure() {
    let h = signed_in().await;
    h.http.mock_network_failure(HttpMethod::Post, LOGOUT_URL);

    h.client.logout().await;

    assert_logged_out(&h).await;
}

#[tokio::test]
async fn logout_survives_server_error() {
    let h = signed_in().await;
    h.http.mock_raw(HttpMethod::Post, LOGOUT_URL, 500, "oops");

    h.client.logout().await;

    assert_logged_out(&h).await;
}

#[tokio::test]
async fn logout_still_notifies_when_storage_is_broken() {
    let h = signed_in().await;
    h.storage.set_failing(true);

    h.client.logout().await;

    assert_eq!(h.session.current(), AuthState::Anonymous);
}

// =========================================================
// Refresh
// =========================================================

#[tokio::test]
async fn refresh_replaces_stored_token() {
    let h = signed_in().await;
    h.http.mock_response(
        HttpMethod::Post,
        REFRESH_URL,
        200,
        json!({"success": true, "data": {"access_token": "n.e.w", "expires_at": "2025-02-01T00:00:00Z"}}),
    );

    let token = h.client.refresh().await.unwrap();
    assert_eq!(token.access_token, "n.e.w");
    assert_eq!(stored_token(&h).await.as_deref(), Some("n.e.w"));
    assert!(h.session.current().is_authenticated());

    let sent = h.http.last_request().unwrap();
    assert_eq!(sent.body.as_deref(), Some("{}"));
    assert_eq!(sent.credentials, Credentials::Include);
}

#[tokio::test]
async fn refresh_http_failure_behaves_like_logout() {
    let h = signed_in().await;
    h.http
        .mock_raw(HttpMethod::Post, REFRESH_URL, 401, "refresh token expired");

    let err = h.client.refresh().await.unwrap_err();
    assert_eq!(err.message(), "refresh token expired");

    assert_logged_out(&h).await;
    let urls: Vec<String> = h.http.requests.borrow().iter().map(|r| r.url.clone()).collect();
    assert_eq!(urls.last().map(String::as_str), Some(LOGOUT_URL));
}

#[tokio::test]
async fn refresh_envelope_failure_behaves_like_logout() {
    let h = signed_in().await;
    h.http.mock_response(
        HttpMethod::Post,
        REFRESH_URL,
        200,
        json!({"success": false, "error": {"code": "UNAUTHORIZED", "message": "revoked"}}),
    );

    let err = h.client.refresh().await.unwrap_err();
    assert_eq!(err.message(), "revoked");
    assert_logged_out(&h).await;
}

#[tokio::test]
async fn refresh_network_failure_behaves_like_logout() {
    let h = signed_in().await;
    h.http.mock_network_failure(HttpMethod::Post, REFRESH_URL);

    assert!(h.client.refresh().await.is_err());
    assert_logged_out(&h).await;
}

// =========================================================
// Current user / health
// =========================================================

#[tokio::test]
async fn current_user_is_decoded_from_stored_token() {
    let h = setup();
    assert_eq!(h.client.current_user().await, None);

    h.tokens
        .save(&sample_token(4_000_000_000), Utc::now())
        .await
        .unwrap();
    let identity = h.client.current_user().await.unwrap();
    assert_eq!(identity.name, "A");
    assert_eq!(identity.employee_id.to_string(), EMPLOYEE_ID);
    assert_eq!(h.http.request_count(), 0);
}

#[tokio::test]
async fn current_user_swallows_decode_failure() {
    let h = setup();
    h.tokens.save("h.e.s", Utc::now()).await.unwrap();
    assert_eq!(h.client.current_user().await, None);
}

#[tokio::test]
async fn health_reads_plain_body() {
    let h = setup();
    h.http.mock_response(
        HttpMethod::Get,
        "http://tm.local/api/v1/health",
        200,
        json!({"status": "ok", "service": "taskmanager"}),
    );
    assert!(h.client.health().await.unwrap().is_ok());
}

// =========================================================
// Storage failures during login
// =========================================================

#[tokio::test]
async fn login_with_failed_expiry_write_leaves_no_token_behind() {
    use crate::pipeline::BearerHandler;
    use crate::storage::tests::RejectingStorage;

    let http = Rc::new(MockHttpClient::new());
    let storage = Rc::new(RejectingStorage::new(STORAGE_KEY_EXPIRES_AT));
    let tokens = TokenStore::new(storage.clone());
    let session = Rc::new(SessionNotifier::new(tokens.clone()));
    let config = ClientConfig::resolve("http://tm.local", "/api/v1").unwrap();
    let client = AuthClient::new(
        CookieHandler::new(http.clone()),
        config,
        tokens.clone(),
        session.clone(),
    );
    http.mock_response(HttpMethod::Post, LOGIN_URL, 200, auth_ok("h.e.s"));

    let err = client.login(&login_request()).await.unwrap_err();
    assert_eq!(err.status, crate::error::ClientErrorStatus::Storage);
    assert_eq!(session.current(), AuthState::Anonymous);
    assert_eq!(tokens.load_access_token().await.unwrap(), None);
    assert_eq!(session.restore_from_storage().await, AuthState::Anonymous);

    // later resource calls go out without a bearer header
    http.mock_response(HttpMethod::Get, "http://tm.local/api/v1/tasks", 200, json!({"success": true}));
    let bearer = BearerHandler::new(CookieHandler::new(http.clone()), tokens);
    bearer
        .send(HttpRequest::new("http://tm.local/api/v1/tasks", HttpMethod::Get))
        .await
        .unwrap();
    assert!(http.last_request().unwrap().header("authorization").is_none());
}
