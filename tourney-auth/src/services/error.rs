use service_core::error::AppError;
use thiserror::Error;

use super::jwt::TokenError;
use super::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("User not found")]
    AccountNotFound,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account not verified")]
    AccountNotVerified,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(StoreError::Conflict(field)) => {
                AppError::Conflict(anyhow::anyhow!("{} is already in use", field))
            }
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Token(TokenError::Invalid) => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid token"))
            }
            ServiceError::Token(TokenError::Expired) => {
                AppError::Unauthorized(anyhow::anyhow!("Token expired"))
            }
            ServiceError::Token(e @ TokenError::Signing(_)) => {
                AppError::InternalError(anyhow::Error::new(e))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::AccountNotFound => {
                AppError::NotFound(anyhow::anyhow!("User not found"))
            }
            ServiceError::OrganizationNotFound => {
                AppError::NotFound(anyhow::anyhow!("Organization not found"))
            }
            ServiceError::InvalidCredentials => {
                AppError::Unauthorized(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::AccountNotVerified => {
                AppError::Forbidden(anyhow::anyhow!("Account not verified"))
            }
            ServiceError::InvalidResetToken => {
                AppError::BadRequest(anyhow::anyhow!("Invalid or expired reset token"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::Store(StoreError::Conflict("Email")), StatusCode::BAD_REQUEST),
            (ServiceError::AccountNotFound, StatusCode::NOT_FOUND),
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::AccountNotVerified, StatusCode::FORBIDDEN),
            (ServiceError::Token(TokenError::Expired), StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidResetToken, StatusCode::BAD_REQUEST),
            (
                ServiceError::Store(StoreError::Internal("poisoned".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_conflict_message_names_field() {
        let app_err = AppError::from(ServiceError::Store(StoreError::Conflict("Email")));
        assert_eq!(app_err.to_string(), "Conflict: Email is already in use");
    }
}
