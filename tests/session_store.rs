//! End-to-end behaviour with the default session-backed store.
//!
//! The session layer owns the session cookie (`id`); the handler on `/token`
//! echoes the token so the client can put it in `X-CSRF-Token`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use axum::routing::{any, get};
use axum::{Extension, Router};
use axum_extra::extract::cookie::Cookie;
use csrf_header::{CsrfConfig, CsrfProtection, CsrfToken, apply};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_sessions::{MemoryStore, SessionManagerLayer};

fn app() -> Router {
    let routes = Router::new()
        .route("/", any(|| async { "hello" }))
        .route(
            "/token",
            get(|Extension(token): Extension<CsrfToken>| async move { token.into_inner() }),
        );

    let sessions = SessionManagerLayer::new(MemoryStore::default()).with_secure(false);
    apply(routes, CsrfProtection::new(CsrfConfig::default())).layer(sessions)
}

async fn body_string(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_cookie(res: &Response<Body>) -> String {
    let value = res
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap();
    let cookie = Cookie::parse(value.to_owned()).unwrap();
    format!("{}={}", cookie.name(), cookie.value())
}

/// Start a session and return (session cookie pair, csrf token).
async fn start_session(app: &Router) -> (String, String) {
    let req = Request::builder()
        .uri("/token")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = session_cookie(&res);
    let token = body_string(res).await;
    assert!(!token.is_empty());
    (cookie, token)
}

fn post(cookie: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header(header::COOKIE, cookie);
    if let Some(token) = token {
        builder = builder.header("X-CSRF-Token", token);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn matching_header_passes() {
    let app = app();
    let (cookie, token) = start_session(&app).await;

    let res = app.oneshot(post(&cookie, Some(&token))).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_string(res).await, "hello");
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let app = app();
    let (cookie, _) = start_session(&app).await;

    let res = app.oneshot(post(&cookie, None)).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(res).await, "Invalid CSRF Token");
}

#[tokio::test]
async fn token_is_stable_within_a_session() {
    let app = app();
    let (cookie, token) = start_session(&app).await;

    let req = Request::builder()
        .uri("/token")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();

    assert_eq!(body_string(res).await, token);
}

#[tokio::test]
async fn token_from_another_session_is_rejected() {
    let app = app();
    let (cookie, _) = start_session(&app).await;
    let (_, other_token) = start_session(&app).await;

    let res = app.oneshot(post(&cookie, Some(&other_token))).await.unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn post_without_session_is_rejected() {
    let res = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}
