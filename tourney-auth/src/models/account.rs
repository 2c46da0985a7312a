//! Account entity: one per email, optionally linked to an organization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::role::{AccountStatus, Role};

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: AccountStatus,
    pub verification_token: Option<String>,
    /// SHA-256 hex digest of the outstanding reset token.
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        full_name: String,
        email: String,
        password_hash: String,
        role: Role,
        status: AccountStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name,
            email,
            password_hash,
            role,
            status,
            verification_token: None,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            organization_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_verification_token(mut self, token: String) -> Self {
        self.verification_token = Some(token);
        self
    }

    pub fn with_organization(mut self, organization_id: Uuid) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    pub fn is_verified(&self) -> bool {
        self.status == AccountStatus::Verified
    }

    /// Convert to sanitized response (no hash or token fields).
    pub fn sanitized(&self) -> SanitizedAccount {
        SanitizedAccount::from(self)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedAccount {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub organization_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for SanitizedAccount {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            full_name: a.full_name.clone(),
            email: a.email.clone(),
            role: a.role,
            status: a.status,
            organization_id: a.organization_id,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitized_json_omits_secrets() {
        let account = Account::new(
            "Ada Lovelace".to_string(),
            "ada@example.com".to_string(),
            "$argon2id$fake".to_string(),
            Role::TournamentOwner,
            AccountStatus::Pending,
        )
        .with_verification_token("abc".to_string());

        let json = serde_json::to_value(account.sanitized()).unwrap();
        assert_eq!(json["fullName"], "Ada Lovelace");
        assert_eq!(json["role"], "tournament_owner");
        assert_eq!(json["status"], "pending");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("verificationToken").is_none());
        assert!(json.get("passwordResetTokenHash").is_none());
    }
}
