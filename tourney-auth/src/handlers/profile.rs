use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{dtos::UserResponse, middleware::AuthUser, AppState};

/// Current account, without password or token fields.
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let account = state.auth_service.account(claims.sub).await?;
    Ok(Json(UserResponse {
        user: account.sanitized(),
    }))
}
