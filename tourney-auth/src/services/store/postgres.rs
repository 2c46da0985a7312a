use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::{Account, Organization};

const ACCOUNT_COLUMNS: &str = "id, full_name, email, password_hash, role, status, \
     verification_token, password_reset_token_hash, password_reset_expires_at, \
     organization_id, created_at, updated_at";

/// Raw `accounts` row; role and status are stored as text codes.
#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    full_name: String,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    verification_token: Option<String>,
    password_reset_token_hash: Option<String>,
    password_reset_expires_at: Option<DateTime<Utc>>,
    organization_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(StoreError::Corrupt)?,
            status: row.status.parse().map_err(StoreError::Corrupt)?,
            verification_token: row.verification_token,
            password_reset_token_hash: row.password_reset_token_hash,
            password_reset_expires_at: row.password_reset_expires_at,
            organization_id: row.organization_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_account(row: Option<AccountRow>) -> Result<Option<Account>, StoreError> {
    row.map(Account::try_from).transpose()
}

/// Maps unique violations onto `Conflict`, naming the offending field.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some("organizations_name_key") => StoreError::Conflict("Organization name"),
                _ => StoreError::Conflict("Email"),
            };
        }
    }
    StoreError::Database(err)
}

#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const INSERT_ACCOUNT: &str = r#"
    INSERT INTO accounts (id, full_name, email, password_hash, role, status,
                          verification_token, organization_id, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

fn bind_account<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    account: &'q Account,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(account.id)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.status.as_str())
        .bind(&account.verification_token)
        .bind(account.organization_id)
        .bind(account.created_at)
        .bind(account.updated_at)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        crate::db::health_check(&self.pool).await.map_err(|e| {
            tracing::error!(error = %e, "Database health check failed");
            StoreError::Database(e)
        })
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        bind_account(sqlx::query(INSERT_ACCOUNT), account)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn insert_organization_with_owner(
        &self,
        organization: &Organization,
        owner: &Account,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO organizations (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(organization.id)
            .bind(&organization.name)
            .bind(organization.created_at)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        bind_account(sqlx::query(INSERT_ACCOUNT), owner)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        // Dropping `tx` on the error paths above rolls back.
        tx.commit().await?;
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        into_account(row)
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        into_account(row)
    }

    async fn find_organization_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Organization>, StoreError> {
        let org = sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at FROM organizations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(org)
    }

    async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET status = 'verified', verification_token = NULL, updated_at = NOW()
            WHERE verification_token = $1 AND status = 'pending'
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        into_account(row)
    }

    async fn set_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET password_reset_token_hash = $2, password_reset_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            UPDATE accounts
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = NOW()
            WHERE password_reset_token_hash = $1 AND password_reset_expires_at > $3
            RETURNING {}
            "#,
            ACCOUNT_COLUMNS
        ))
        .bind(token_hash)
        .bind(new_password_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        into_account(row)
    }
}
