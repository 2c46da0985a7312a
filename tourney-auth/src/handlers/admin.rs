use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{dtos::UserResponse, middleware::AuthUser, AppState};

/// Look up any account by id. Admin only.
pub async fn get_account(
    State(state): State<AppState>,
    AuthUser(admin): AuthUser,
    Path(account_id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    tracing::info!(admin_id = %admin.sub, account_id = %account_id, "Admin account lookup");
    let account = state.auth_service.account(account_id).await?;
    Ok(Json(UserResponse {
        user: account.sanitized(),
    }))
}
