use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::{
        auth::{PasswordResetConfirm, PasswordResetRequest},
        MessageResponse,
    },
    utils::{Password, ValidatedJson},
    AppState,
};

/// Request a password reset email. The answer is the same whether or not
/// the email is registered.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_password_reset(&req.email).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new(
            "If that email is registered, a reset link has been sent",
        )),
    ))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> Result<impl IntoResponse, AppError> {
    state
        .auth_service
        .confirm_password_reset(&req.token, Password::new(req.new_password))
        .await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse::new("Password has been reset")),
    ))
}
