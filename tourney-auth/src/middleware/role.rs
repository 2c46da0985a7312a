use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::services::Claims;

/// Set of roles allowed through a `require_role` layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    allowed: &'static [Role],
}

impl RolePolicy {
    pub const OWNER_OR_ADMIN: RolePolicy = RolePolicy::new(&[Role::TournamentOwner, Role::Admin]);
    pub const ADMIN_ONLY: RolePolicy = RolePolicy::new(&[Role::Admin]);

    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed.contains(&role)
    }
}

/// Rejects with 403 unless the authenticated role is in `policy`.
///
/// Must run inside `auth_middleware`, which places the claims in extensions.
pub async fn require_role(
    State(policy): State<RolePolicy>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = req.extensions().get::<Claims>().ok_or_else(|| {
        AppError::Unauthorized(anyhow::anyhow!("Missing authentication token"))
    })?;

    if !policy.allows(claims.role) {
        tracing::warn!(
            account_id = %claims.sub,
            role = %claims.role,
            "Role not permitted for route"
        );
        return Err(AppError::Forbidden(anyhow::anyhow!("Insufficient permissions")));
    }

    Ok(next.run(req).await)
}
