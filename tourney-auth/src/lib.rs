pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::MatchedPath,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AuthConfig;
use crate::middleware::{auth_middleware, require_role, RolePolicy};
use crate::services::{AccountStore, AuthService, EmailProvider, TokenService};
use crate::utils::CredentialHasher;

#[derive(Clone)]
pub struct AppState {
    pub config: AuthConfig,
    pub tokens: TokenService,
    pub auth_service: AuthService,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn AccountStore>,
        email: Arc<dyn EmailProvider>,
        metrics: PrometheusHandle,
    ) -> Result<Self, AppError> {
        let tokens = TokenService::new(&config.jwt);
        let hasher = CredentialHasher::new(&config.password_hash).map_err(AppError::ConfigError)?;
        let auth_service = AuthService::new(
            store,
            email,
            tokens.clone(),
            hasher,
            config.urls.clone(),
        );

        Ok(Self {
            config,
            tokens,
            auth_service,
            metrics,
        })
    }
}

fn cors_layer(config: &AuthConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ]);

    // Credentialed CORS cannot be combined with a wildcard origin.
    if config.security.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(origins).allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    let authenticated = from_fn_with_state(state.clone(), auth_middleware);

    let owner_routes = Router::new()
        .route(
            "/auth/organization",
            get(handlers::organization::get_organization),
        )
        .route_layer(from_fn_with_state(RolePolicy::OWNER_OR_ADMIN, require_role))
        .route_layer(authenticated.clone());

    let admin_routes = Router::new()
        .route(
            "/auth/admin/accounts/:account_id",
            get(handlers::admin::get_account),
        )
        .route_layer(from_fn_with_state(RolePolicy::ADMIN_ONLY, require_role))
        .route_layer(authenticated.clone());

    let session_routes = Router::new()
        .route("/auth/profile", get(handlers::profile::get_profile))
        .route("/auth/logout", post(handlers::auth::logout))
        .route_layer(authenticated);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .route("/auth/register/owner", post(handlers::auth::register_owner))
        .route("/auth/register/player", post(handlers::auth::register_player))
        .route(
            "/auth/register/organization",
            post(handlers::auth::register_organization),
        )
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/verify/:token", get(handlers::auth::verify_email))
        .route(
            "/auth/password-reset/request",
            post(handlers::auth::request_password_reset),
        )
        .route(
            "/auth/password-reset/confirm",
            post(handlers::auth::confirm_password_reset),
        )
        .merge(session_routes)
        .merge(owner_routes)
        .merge(admin_routes)
        .with_state(state.clone())
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                // Route template, not the raw URI: verification links carry tokens.
                let route = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    route = %route,
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&state.config))
}
