//! Request and response bodies for `/auth`. Missing fields deserialize as
//! empty so they surface as field-level validation messages.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::Role;

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterOrganizationRequest {
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,

    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(
        length(min = 1, message = "Organization name is required"),
        custom(function = "organization_name_length")
    )]
    pub organization_name: String,
}

const ORGANIZATION_NAME_MAX_CHARS: usize = 200;

fn organization_name_length(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > ORGANIZATION_NAME_MAX_CHARS {
        let mut err = ValidationError::new("length");
        err.message = Some("Organization name must be at most 200 characters".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub token: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub role: Role,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct PasswordResetRequest {
    #[validate(email(message = "Valid email is required"))]
    pub email: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordResetConfirm {
    #[validate(length(min = 1, message = "Reset token is required"))]
    pub token: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}
