//! Durable account and organization records.

mod memory;
mod postgres;

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, Organization};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write; the payload names the field.
    #[error("{0} is already in use")]
    Conflict(&'static str),

    #[error("Stored record is malformed: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Fails with `Conflict("Email")` when the email is taken.
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Inserts both records or neither.
    async fn insert_organization_with_owner(
        &self,
        organization: &Organization,
        owner: &Account,
    ) -> Result<(), StoreError>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    async fn find_organization_by_id(&self, id: Uuid)
        -> Result<Option<Organization>, StoreError>;

    /// Atomically marks the holder of `token` verified and clears the token.
    ///
    /// Returns the updated account, or `None` if no account holds the token.
    async fn consume_verification_token(&self, token: &str)
        -> Result<Option<Account>, StoreError>;

    async fn set_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Replaces the password hash and clears the reset fields, but only when
    /// `token_hash` matches and the reset has not expired at `now`.
    async fn complete_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;
}
