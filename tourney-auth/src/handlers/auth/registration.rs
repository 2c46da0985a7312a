use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::{
    dtos::auth::{RegisterOrganizationRequest, RegisterRequest, RegisterResponse},
    services::Registration,
    utils::{Password, ValidatedJson},
    AppState,
};

impl From<RegisterRequest> for Registration {
    fn from(req: RegisterRequest) -> Self {
        Registration {
            full_name: req.full_name,
            email: req.email,
            password: Password::new(req.password),
        }
    }
}

/// Register a tournament owner (pending until the emailed link is followed)
pub async fn register_owner(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth_service.register_owner(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Tournament Owner registered successfully!".to_string(),
            token: session.token,
        }),
    ))
}

/// Register a player (verified immediately)
pub async fn register_player(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth_service.register_player(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Player registered successfully!".to_string(),
            token: session.token,
        }),
    ))
}

/// Register an organization together with its owning account
pub async fn register_organization(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterOrganizationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let registration = Registration {
        full_name: req.full_name,
        email: req.email,
        password: Password::new(req.password),
    };
    let session = state
        .auth_service
        .register_organization(registration, req.organization_name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Organization registered successfully!".to_string(),
            token: session.token,
        }),
    ))
}
