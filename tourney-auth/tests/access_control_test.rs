mod common;

use axum::http::{header, Method, Request, StatusCode};
use axum::body::Body;
use chrono::Utc;
use common::{TestApp, COOKIE_NAME, JWT_SECRET};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tourney_auth::models::{AccountStatus, Role};
use tourney_auth::services::{AccountStore, Claims};
use uuid::Uuid;

async fn player_token(app: &TestApp) -> String {
    let res = app.register("player", "p@x.com", "secret1").await;
    res.body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::spawn();
    let res = app.get("/auth/profile", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Missing authentication token");
}

#[tokio::test]
async fn test_garbage_token_is_invalid() {
    let app = TestApp::spawn();
    let res = app.get("/auth/profile", Some("not-a-jwt")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Invalid token");
}

#[tokio::test]
async fn test_expired_token_is_reported_as_expired() {
    let app = TestApp::spawn();
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4(),
        role: Role::Player,
        email: "p@x.com".to_string(),
        organization_id: None,
        status: AccountStatus::Verified,
        iat: now - 7200,
        exp: Some(now - 3600),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let res = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body["error"], "Token expired");
}

#[tokio::test]
async fn test_profile_is_sanitized() {
    let app = TestApp::spawn();
    let token = player_token(&app).await;

    let res = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);

    let user = &res.body["user"];
    assert_eq!(user["email"], "p@x.com");
    assert_eq!(user["fullName"], "Test User");
    assert_eq!(user["role"], "player");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password").is_none());
    assert!(user.get("verificationToken").is_none());
}

#[tokio::test]
async fn test_profile_of_vanished_account_is_not_found() {
    let app = TestApp::spawn();
    let ghost = tourney_auth::models::Account::new(
        "Ghost".to_string(),
        "ghost@x.com".to_string(),
        "$argon2id$fake".to_string(),
        Role::Player,
        AccountStatus::Verified,
    );
    let token = app.state.tokens.issue(&ghost).unwrap();

    let res = app.get("/auth/profile", Some(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_owner_route_rejects_player() {
    let app = TestApp::spawn();
    let token = player_token(&app).await;

    let res = app.get("/auth/organization", Some(&token)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["error"], "Insufficient permissions");
}

#[tokio::test]
async fn test_owner_route_requires_token() {
    let app = TestApp::spawn();
    let res = app.get("/auth/organization", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_route_returns_organization() {
    let app = TestApp::spawn();
    let res = app
        .post_json(
            "/auth/register/organization",
            json!({
                "fullName": "Olga",
                "email": "olga@x.com",
                "password": "secret1",
                "organizationName": "Chess Club",
            }),
        )
        .await;
    let token = res.body["token"].as_str().unwrap().to_string();

    let res = app.get("/auth/organization", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["organization"]["name"], "Chess Club");
}

#[tokio::test]
async fn test_owner_without_organization_gets_not_found() {
    let app = TestApp::spawn();
    let res = app.register("owner", "a@x.com", "secret1").await;
    let token = res.body["token"].as_str().unwrap().to_string();

    let res = app.get("/auth/organization", Some(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.body["error"], "Organization not found");
}

#[tokio::test]
async fn test_admin_route_rejects_owner() {
    let app = TestApp::spawn();
    let res = app.register("owner", "a@x.com", "secret1").await;
    let token = res.body["token"].as_str().unwrap().to_string();
    let account = app.store.find_account_by_email("a@x.com").await.unwrap().unwrap();

    let res = app
        .get(&format!("/auth/admin/accounts/{}", account.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_can_read_any_account() {
    let app = TestApp::spawn();
    app.register("player", "p@x.com", "secret1").await;
    let player = app.store.find_account_by_email("p@x.com").await.unwrap().unwrap();
    let admin_token = app.admin_token().await;

    let res = app
        .get(&format!("/auth/admin/accounts/{}", player.id), Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["user"]["id"], player.id.to_string());
    assert!(res.body["user"].get("passwordHash").is_none());

    let res = app
        .get(&format!("/auth/admin/accounts/{}", Uuid::new_v4()), Some(&admin_token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_passes_owner_policy() {
    let app = TestApp::spawn();
    let admin_token = app.admin_token().await;

    // Admin has no organization, but the role check itself must pass.
    let res = app.get("/auth/organization", Some(&admin_token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let app = TestApp::spawn();
    let token = player_token(&app).await;

    let res = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "User logged out successfully");
    let cookie = res.header("set-cookie").expect("removal cookie");
    assert!(cookie.starts_with(&format!("{}=", COOKIE_NAME)));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_requires_token() {
    let app = TestApp::spawn();
    let res = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri("/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}
