use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::email::{password_reset_email, verification_email, EmailContent, EmailProvider};
use super::error::ServiceError;
use super::jwt::TokenService;
use super::store::AccountStore;
use crate::config::UrlConfig;
use crate::models::{Account, AccountStatus, Organization, Role};
use crate::utils::{generate_random_token, hash_token, CredentialHasher, Password};

const PASSWORD_RESET_TTL_HOURS: i64 = 1;

/// Account plus the session token issued for it.
#[derive(Debug, Clone)]
pub struct Session {
    pub account: Account,
    pub token: String,
}

/// New-account input shared by every registration path.
#[derive(Debug, Clone)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: Password,
}

/// Account lifecycle: registration, verification, login and password reset.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn AccountStore>,
    email: Arc<dyn EmailProvider>,
    tokens: TokenService,
    hasher: CredentialHasher,
    urls: UrlConfig,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        email: Arc<dyn EmailProvider>,
        tokens: TokenService,
        hasher: CredentialHasher,
        urls: UrlConfig,
    ) -> Self {
        Self {
            store,
            email,
            tokens,
            hasher,
            urls,
        }
    }

    /// Tournament owner: pending until the emailed link is followed.
    pub async fn register_owner(&self, reg: Registration) -> Result<Session, ServiceError> {
        let password_hash = self.hash_password(reg.password).await?;
        let account = Account::new(
            reg.full_name,
            reg.email,
            password_hash,
            Role::TournamentOwner,
            AccountStatus::Pending,
        )
        .with_verification_token(generate_random_token());

        self.store.insert_account(&account).await?;
        tracing::info!(account_id = %account.id, role = %account.role, "Account registered");

        self.send_verification(&account).await;
        self.session(account)
    }

    /// Player: verified immediately, no email.
    pub async fn register_player(&self, reg: Registration) -> Result<Session, ServiceError> {
        let password_hash = self.hash_password(reg.password).await?;
        let account = Account::new(
            reg.full_name,
            reg.email,
            password_hash,
            Role::Player,
            AccountStatus::Verified,
        );

        self.store.insert_account(&account).await?;
        tracing::info!(account_id = %account.id, role = %account.role, "Account registered");

        self.session(account)
    }

    /// Creates the organization and its pending owner in one store write.
    pub async fn register_organization(
        &self,
        reg: Registration,
        organization_name: String,
    ) -> Result<Session, ServiceError> {
        let password_hash = self.hash_password(reg.password).await?;
        let organization = Organization::new(organization_name);
        let account = Account::new(
            reg.full_name,
            reg.email,
            password_hash,
            Role::TournamentOwner,
            AccountStatus::Pending,
        )
        .with_organization(organization.id)
        .with_verification_token(generate_random_token());

        self.store
            .insert_organization_with_owner(&organization, &account)
            .await?;
        tracing::info!(
            account_id = %account.id,
            organization_id = %organization.id,
            "Organization registered"
        );

        self.send_verification(&account).await;
        self.session(account)
    }

    pub async fn login(&self, email: &str, password: Password) -> Result<Session, ServiceError> {
        let account = self
            .store
            .find_account_by_email(email)
            .await?
            .ok_or(ServiceError::AccountNotFound)?;

        if !self.check_password(password, &account.password_hash).await? {
            tracing::info!(account_id = %account.id, "Login rejected: bad password");
            return Err(ServiceError::InvalidCredentials);
        }

        if !account.is_verified() {
            return Err(ServiceError::AccountNotVerified);
        }

        tracing::info!(account_id = %account.id, "Login succeeded");
        self.session(account)
    }

    /// Consumes a verification token. `None` means no account holds it.
    pub async fn verify_email(&self, token: &str) -> Result<Option<Session>, ServiceError> {
        match self.store.consume_verification_token(token).await? {
            Some(account) => {
                tracing::info!(account_id = %account.id, "Email verified");
                self.session(account).map(Some)
            }
            None => {
                tracing::info!("Verification token not found");
                Ok(None)
            }
        }
    }

    pub async fn account(&self, account_id: Uuid) -> Result<Account, ServiceError> {
        self.store
            .find_account_by_id(account_id)
            .await?
            .ok_or(ServiceError::AccountNotFound)
    }

    pub async fn organization_of(&self, account_id: Uuid) -> Result<Organization, ServiceError> {
        let organization_id = self
            .account(account_id)
            .await?
            .organization_id
            .ok_or(ServiceError::OrganizationNotFound)?;

        self.store
            .find_organization_by_id(organization_id)
            .await?
            .ok_or(ServiceError::OrganizationNotFound)
    }

    /// Always succeeds from the caller's point of view so the endpoint does
    /// not reveal which emails are registered.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let account = match self.store.find_account_by_email(email).await? {
            Some(account) => account,
            None => {
                tracing::info!("Password reset requested for unknown email");
                return Ok(());
            }
        };

        let token = generate_random_token();
        let expires_at = Utc::now() + Duration::hours(PASSWORD_RESET_TTL_HOURS);
        self.store
            .set_password_reset(account.id, &hash_token(&token), expires_at)
            .await?;

        let link = format!("{}/reset-password?token={}", self.urls.frontend_url, token);
        self.deliver(&account.email, password_reset_email(&link)).await;

        tracing::info!(account_id = %account.id, "Password reset issued");
        Ok(())
    }

    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: Password,
    ) -> Result<(), ServiceError> {
        let password_hash = self.hash_password(new_password).await?;

        let account = self
            .store
            .complete_password_reset(&hash_token(token), &password_hash, Utc::now())
            .await?
            .ok_or(ServiceError::InvalidResetToken)?;

        tracing::info!(account_id = %account.id, "Password reset completed");
        Ok(())
    }

    /// Creates a verified admin unless the email is already registered.
    /// Returns whether an account was created.
    pub async fn bootstrap_admin(
        &self,
        email: &str,
        password: Password,
    ) -> Result<bool, ServiceError> {
        if self.store.find_account_by_email(email).await?.is_some() {
            tracing::debug!("Bootstrap admin already present");
            return Ok(false);
        }

        let password_hash = self.hash_password(password).await?;
        let account = Account::new(
            "Administrator".to_string(),
            email.to_string(),
            password_hash,
            Role::Admin,
            AccountStatus::Verified,
        );

        self.store.insert_account(&account).await?;
        tracing::info!(account_id = %account.id, "Bootstrap admin created");
        Ok(true)
    }

    pub async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(self.store.health_check().await?)
    }

    fn session(&self, account: Account) -> Result<Session, ServiceError> {
        let token = self.tokens.issue(&account)?;
        Ok(Session { account, token })
    }

    /// The account already exists at this point; a mail failure is logged
    /// rather than failing the registration.
    async fn send_verification(&self, account: &Account) {
        let Some(token) = account.verification_token.as_deref() else {
            return;
        };
        let link = format!("{}/auth/verify/{}", self.urls.public_url, token);
        self.deliver(&account.email, verification_email(&account.full_name, &link))
            .await;
    }

    async fn deliver(&self, to: &str, content: EmailContent) {
        if let Err(e) = self
            .email
            .send_email(to, &content.subject, &content.html_body, &content.text_body)
            .await
        {
            tracing::error!(error = %e, subject = %content.subject, "Email delivery failed");
        }
    }

    // Argon2 is CPU-bound; keep it off the async workers.
    async fn hash_password(&self, password: Password) -> Result<String, ServiceError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(anyhow::Error::from)??;
        Ok(hash.into_string())
    }

    async fn check_password(
        &self,
        password: Password,
        password_hash: &str,
    ) -> Result<bool, ServiceError> {
        let hasher = self.hasher.clone();
        let stored = crate::utils::PasswordHashString::new(password_hash.to_string());
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored))
            .await
            .map_err(anyhow::Error::from)?;
        Ok(matches)
    }
}
