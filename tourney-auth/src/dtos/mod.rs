pub mod auth;

use serde::Serialize;

use crate::models::{Organization, SanitizedAccount};

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: SanitizedAccount,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub organization: Organization,
}
