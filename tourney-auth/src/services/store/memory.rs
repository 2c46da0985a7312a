use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::models::{Account, AccountStatus, Organization};

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    organizations: HashMap<Uuid, Organization>,
}

impl State {
    fn email_taken(&self, email: &str) -> bool {
        self.accounts.values().any(|a| a.email == email)
    }

    fn organization_name_taken(&self, name: &str) -> bool {
        self.organizations.values().any(|o| o.name == name)
    }
}

/// Process-local store; every check-and-write happens under one lock.
#[derive(Default)]
pub struct InMemoryAccountStore {
    state: Mutex<State>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|e| StoreError::Internal(format!("In-memory store mutex poisoned: {}", e)))
    }

    pub fn account_count(&self) -> usize {
        self.lock().map(|s| s.accounts.len()).unwrap_or(0)
    }

    pub fn organization_count(&self) -> usize {
        self.lock().map(|s| s.organizations.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.email_taken(&account.email) {
            return Err(StoreError::Conflict("Email"));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn insert_organization_with_owner(
        &self,
        organization: &Organization,
        owner: &Account,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if state.organization_name_taken(&organization.name) {
            return Err(StoreError::Conflict("Organization name"));
        }
        if state.email_taken(&owner.email) {
            return Err(StoreError::Conflict("Email"));
        }
        state
            .organizations
            .insert(organization.id, organization.clone());
        state.accounts.insert(owner.id, owner.clone());
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let state = self.lock()?;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.lock()?.accounts.get(&id).cloned())
    }

    async fn find_organization_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Organization>, StoreError> {
        Ok(self.lock()?.organizations.get(&id).cloned())
    }

    async fn consume_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<Account>, StoreError> {
        let mut state = self.lock()?;
        let account = state
            .accounts
            .values_mut()
            .find(|a| {
                a.status == AccountStatus::Pending && a.verification_token.as_deref() == Some(token)
            });

        Ok(account.map(|account| {
            account.status = AccountStatus::Verified;
            account.verification_token = None;
            account.updated_at = Utc::now();
            account.clone()
        }))
    }

    async fn set_password_reset(
        &self,
        account_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        if let Some(account) = state.accounts.get_mut(&account_id) {
            account.password_reset_token_hash = Some(token_hash.to_string());
            account.password_reset_expires_at = Some(expires_at);
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn complete_password_reset(
        &self,
        token_hash: &str,
        new_password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let mut state = self.lock()?;
        let account = state.accounts.values_mut().find(|a| {
            a.password_reset_token_hash.as_deref() == Some(token_hash)
                && a.password_reset_expires_at.map_or(false, |exp| exp > now)
        });

        Ok(account.map(|account| {
            account.password_hash = new_password_hash.to_string();
            account.password_reset_token_hash = None;
            account.password_reset_expires_at = None;
            account.updated_at = Utc::now();
            account.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Duration;
    use std::sync::Arc;

    fn pending_owner(email: &str, token: &str) -> Account {
        Account::new(
            "Owner".to_string(),
            email.to_string(),
            "$argon2id$fake".to_string(),
            Role::TournamentOwner,
            AccountStatus::Pending,
        )
        .with_verification_token(token.to_string())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_and_keeps_first() {
        let store = InMemoryAccountStore::new();
        let first = pending_owner("a@x.com", "t1");
        store.insert_account(&first).await.unwrap();

        let second = pending_owner("a@x.com", "t2");
        let err = store.insert_account(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict("Email")));

        let stored = store.find_account_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(store.account_count(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_sensitive() {
        let store = InMemoryAccountStore::new();
        store.insert_account(&pending_owner("a@x.com", "t1")).await.unwrap();
        assert!(store.find_account_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verification_token_is_consumed_once() {
        let store = InMemoryAccountStore::new();
        store.insert_account(&pending_owner("a@x.com", "tok")).await.unwrap();

        let verified = store.consume_verification_token("tok").await.unwrap().unwrap();
        assert_eq!(verified.status, AccountStatus::Verified);
        assert!(verified.verification_token.is_none());

        assert!(store.consume_verification_token("tok").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verification_token_only_applies_to_pending_accounts() {
        let store = InMemoryAccountStore::new();
        let invited = Account::new(
            "Guest".to_string(),
            "g@x.com".to_string(),
            "$argon2id$fake".to_string(),
            Role::Player,
            AccountStatus::Invited,
        )
        .with_verification_token("tok".to_string());
        store.insert_account(&invited).await.unwrap();

        assert!(store.consume_verification_token("tok").await.unwrap().is_none());
        let stored = store.find_account_by_id(invited.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AccountStatus::Invited);
        assert_eq!(stored.verification_token.as_deref(), Some("tok"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_verification_consumes_token_once() {
        let store = Arc::new(InMemoryAccountStore::new());
        store.insert_account(&pending_owner("a@x.com", "tok")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.consume_verification_token("tok").await })
            })
            .collect();

        let mut verified = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                verified += 1;
            }
        }
        assert_eq!(verified, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_password_reset_completes_once() {
        let store = Arc::new(InMemoryAccountStore::new());
        let account = pending_owner("a@x.com", "t1");
        store.insert_account(&account).await.unwrap();
        let now = Utc::now();
        store
            .set_password_reset(account.id, "digest", now + Duration::hours(1))
            .await
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .complete_password_reset("digest", &format!("hash-{}", i), now)
                        .await
                })
            })
            .collect();

        let mut completed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                completed += 1;
            }
        }
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn test_organization_insert_is_all_or_nothing() {
        let store = InMemoryAccountStore::new();
        store.insert_account(&pending_owner("a@x.com", "t1")).await.unwrap();

        let org = Organization::new("Chess Club".to_string());
        let owner = pending_owner("a@x.com", "t2").with_organization(org.id);
        let err = store
            .insert_organization_with_owner(&org, &owner)
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict("Email")));
        assert_eq!(store.organization_count(), 0);
        assert!(store.find_organization_by_id(org.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_respects_expiry() {
        let store = InMemoryAccountStore::new();
        let account = pending_owner("a@x.com", "t1");
        store.insert_account(&account).await.unwrap();

        let now = Utc::now();
        store
            .set_password_reset(account.id, "digest", now + Duration::hours(1))
            .await
            .unwrap();

        let late = now + Duration::hours(2);
        assert!(store
            .complete_password_reset("digest", "new-hash", late)
            .await
            .unwrap()
            .is_none());

        let updated = store
            .complete_password_reset("digest", "new-hash", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert!(updated.password_reset_token_hash.is_none());

        assert!(store
            .complete_password_reset("digest", "other", now)
            .await
            .unwrap()
            .is_none());
    }
}
