use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use super::cookie::removal_cookie;
use crate::{
    dtos::{
        auth::{LoginRequest, LoginResponse},
        MessageResponse,
    },
    middleware::AuthUser,
    utils::{Password, ValidatedJson},
    AppState,
};

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .auth_service
        .login(&req.email, Password::new(req.password))
        .await?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token: session.token,
            role: session.account.role,
        }),
    ))
}

/// Logout. Tokens are stateless, so this only clears the session cookie.
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    jar: CookieJar,
) -> impl IntoResponse {
    tracing::info!(account_id = %claims.sub, "Logged out");
    (
        jar.add(removal_cookie(&state.config.cookie)),
        Json(MessageResponse::new("User logged out successfully")),
    )
}
