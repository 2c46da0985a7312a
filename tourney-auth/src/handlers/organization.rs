use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{dtos::OrganizationResponse, middleware::AuthUser, AppState};

/// Organization the caller belongs to. Gated to owners and admins.
pub async fn get_organization(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<OrganizationResponse>, AppError> {
    let organization = state.auth_service.organization_of(claims.sub).await?;
    Ok(Json(OrganizationResponse { organization }))
}
