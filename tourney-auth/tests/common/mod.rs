//! Shared setup for the HTTP integration tests: the full router over the
//! in-memory store and a recording mailer.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use secrecy::SecretString;
use serde_json::Value;
use std::sync::Arc;
use tourney_auth::{
    build_router,
    config::{
        AuthConfig, CookieConfig, DatabaseConfig, Environment, JwtConfig, MailConfig,
        MailTransport, PasswordHashConfig, SecurityConfig, UrlConfig,
    },
    services::{InMemoryAccountStore, MockEmailProvider, TokenExpiry},
    utils::Password,
    AppState,
};
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const FRONTEND_URL: &str = "http://app.test";
pub const PUBLIC_URL: &str = "http://api.test";
pub const COOKIE_NAME: &str = "tourney_session";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "tourney-auth-test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: SecretString::new("postgres://unused".to_string()),
            max_connections: 1,
            min_connections: 0,
        },
        jwt: JwtConfig {
            secret: SecretString::new(JWT_SECRET.to_string()),
            expiration: TokenExpiry::After(chrono::Duration::hours(1)),
        },
        password_hash: PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        urls: UrlConfig {
            public_url: PUBLIC_URL.to_string(),
            frontend_url: FRONTEND_URL.to_string(),
        },
        mail: MailConfig {
            transport: MailTransport::Log,
            from: "no-reply@tourney.test".to_string(),
            smtp: None,
        },
        cookie: CookieConfig {
            name: COOKIE_NAME.to_string(),
            domain: None,
            secure: false,
        },
        security: SecurityConfig {
            allowed_origins: vec![FRONTEND_URL.to_string()],
        },
        bootstrap_admin: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryAccountStore>,
    pub mailbox: Arc<MockEmailProvider>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(test_config())
    }

    pub fn spawn_with(config: AuthConfig) -> Self {
        let store = Arc::new(InMemoryAccountStore::new());
        let mailbox = Arc::new(MockEmailProvider::new());
        let metrics = PrometheusBuilder::new().build_recorder().handle();

        let state = AppState::new(config, store.clone(), mailbox.clone(), metrics)
            .expect("Failed to build app state");

        Self {
            router: build_router(state.clone()),
            state,
            store,
            mailbox,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn register(&self, kind: &str, email: &str, password: &str) -> TestResponse {
        self.post_json(
            &format!("/auth/register/{}", kind),
            serde_json::json!({
                "fullName": "Test User",
                "email": email,
                "password": password,
            }),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json(
            "/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Token from the most recent verification link mailed to `email`.
    pub fn verification_token_for(&self, email: &str) -> String {
        let mail = self
            .mailbox
            .last_to(email)
            .expect("no verification email sent");
        let marker = format!("{}/auth/verify/", PUBLIC_URL);
        mail.text_body
            .split(&marker)
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("verification link missing from email")
            .to_string()
    }

    /// Token from the most recent password reset link mailed to `email`.
    pub fn reset_token_for(&self, email: &str) -> String {
        let mail = self.mailbox.last_to(email).expect("no reset email sent");
        mail.text_body
            .split("token=")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .expect("reset link missing from email")
            .to_string()
    }

    /// Verified admin created through the startup bootstrap path, logged in.
    pub async fn admin_token(&self) -> String {
        self.state
            .auth_service
            .bootstrap_admin("admin@x.com", Password::new("admin-pass".to_string()))
            .await
            .expect("bootstrap admin");
        let res = self.login("admin@x.com", "admin-pass").await;
        assert_eq!(res.status, StatusCode::OK);
        res.body["token"].as_str().unwrap().to_string()
    }
}
