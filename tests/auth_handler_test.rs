//! Integration tests for sign-in, registration and the route guards
//!
//! Covers:
//! - Anonymous visitors are sent to /login
//! - Non-admins are sent away from /admin
//! - Registration validation and the session cookie
//! - Login failures and logout

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use pretty_assertions::assert_eq;
use tower::util::ServiceExt;

use music_catalog::db::models::Role;
use music_catalog::handlers;
use music_catalog::state::AppState;
use music_catalog::test_utils::*;

fn create_test_router(state: &AppState) -> Router {
    handlers::routes().with_state(state.clone())
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session_token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session_token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix("session_token="))
        .map(|v| v.split(';').next().unwrap_or_default().to_string())
}

async fn body_text(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_anonymous_visitor_is_sent_to_login() {
    let state = setup_test_app_state().await;

    for uri in ["/", "/genre/g1", "/artist/a1", "/admin"] {
        let response = create_test_router(&state)
            .oneshot(get(uri, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(location(&response), "/login", "{uri}");
    }
}

#[tokio::test]
async fn test_unknown_token_is_anonymous() {
    let state = setup_test_app_state().await;

    let response = create_test_router(&state)
        .oneshot(get("/", Some("not-a-session")))
        .await
        .unwrap();

    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_non_admin_is_sent_home_from_admin() {
    let state = setup_test_app_state().await;
    let (token, _) = sign_in_as(&state, "listener@example.com", Role::User).await;

    let response = create_test_router(&state)
        .oneshot(get("/admin", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_admin_reaches_admin_panel() {
    let state = setup_test_app_state().await;
    let (token, _) = sign_in_as(&state, "boss@example.com", Role::Admin).await;

    let response = create_test_router(&state)
        .oneshot(get("/admin?tab=artists", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Catalog administration"));
    assert!(html.contains(r#"action="/admin/artists""#));
}

#[tokio::test]
async fn test_home_shows_nav_for_signed_in_user() {
    let state = setup_test_app_state().await;
    let (token, user) = sign_in_as(&state, "fan@example.com", Role::User).await;
    create_test_genre(&state, "Jazz").await;

    let response = create_test_router(&state)
        .oneshot(get("/", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Jazz"));
    assert!(html.contains(&user.display_name));
    assert!(html.contains(r#"action="/logout""#));
    assert!(!html.contains(r#"href="/admin""#));
}

#[tokio::test]
async fn test_register_creates_user_and_session() {
    let app = setup_test_app().await;
    let email: String = SafeEmail().fake();
    let body = format!(
        "display_name=DJ+Test&email={}&password=secret1&confirm_password=secret1",
        urlencoding::encode(&email)
    );

    let response = create_test_router(&app.state)
        .oneshot(post_form("/register", &body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let token = session_cookie(&response).expect("session cookie set");

    let user = app.state.sessions.resolve(Some(&token)).await.into_user().unwrap();
    assert_eq!(user.display_name, "DJ Test");
    assert_eq!(user.role, Role::User);
    assert_eq!(user.email, email.to_lowercase());
    assert_eq!(app.store.len("users").await, 1);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = setup_test_app().await;
    let body = "display_name=X&email=x%40example.com&password=secret1&confirm_password=secret2";

    let response = create_test_router(&app.state)
        .oneshot(post_form("/register", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains("Passwords do not match"));
    assert_eq!(app.sessions.len().await, 0);
    assert_eq!(app.store.len("users").await, 0);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let state = setup_test_app_state().await;
    let body = "display_name=X&email=x%40example.com&password=12345&confirm_password=12345";

    let response = create_test_router(&state)
        .oneshot(post_form("/register", body, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_text(response).await.contains("at least 6 characters"));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let state = setup_test_app_state().await;
    sign_in_as(&state, "someone@example.com", Role::User).await;

    let response = create_test_router(&state)
        .oneshot(post_form(
            "/login",
            "email=someone%40example.com&password=wrong-password",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());
    assert!(body_text(response).await.contains("Invalid email or password"));
}

#[tokio::test]
async fn test_login_sets_cookie() {
    let state = setup_test_app_state().await;
    sign_in_as(&state, "someone@example.com", Role::User).await;

    let response = create_test_router(&state)
        .oneshot(post_form(
            "/login",
            "email=someone%40example.com&password=secret123",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let token = session_cookie(&response).expect("session cookie set");
    assert!(state.sessions.resolve(Some(&token)).await.user().is_some());
}

#[tokio::test]
async fn test_login_page_redirects_signed_in_user() {
    let state = setup_test_app_state().await;
    let (token, _) = sign_in_as(&state, "someone@example.com", Role::User).await;

    let response = create_test_router(&state)
        .oneshot(get("/login", Some(&token)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/");

    let response = create_test_router(&state)
        .oneshot(get("/register", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_closes_session() {
    let app = setup_test_app().await;
    let (token, _) = sign_in_as(&app.state, "leaving@example.com", Role::User).await;

    let response = create_test_router(&app.state)
        .oneshot(post_form("/logout", "", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert_eq!(session_cookie(&response).as_deref(), Some(""));
    assert_eq!(app.sessions.len().await, 0);

    let response = create_test_router(&app.state)
        .oneshot(get("/", Some(&token)))
        .await
        .unwrap();
    assert_eq!(location(&response), "/login");
}
