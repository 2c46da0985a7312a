use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use std::fmt;

use crate::config::PasswordHashConfig;

/// Newtype for password to prevent accidental logging
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// Newtype for password hash
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Argon2id hasher with configurable cost.
///
/// Verification reads the parameters embedded in the stored PHC string, so
/// raising the cost later does not invalidate existing hashes.
#[derive(Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(config: &PasswordHashConfig) -> Result<Self, anyhow::Error> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 parameters: {}", e))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &Password) -> Result<PasswordHashString, anyhow::Error> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2()
            .hash_password(password.as_str().as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();

        Ok(PasswordHashString::new(password_hash))
    }

    /// Constant-time check of `password` against a stored hash.
    ///
    /// A stored value that is not a valid PHC string never matches.
    pub fn verify(&self, password: &Password, password_hash: &PasswordHashString) -> bool {
        let parsed_hash = match PasswordHash::new(password_hash.as_str()) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is not a valid PHC string");
                return false;
            }
        };

        self.argon2()
            .verify_password(password.as_str().as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(&PasswordHashConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .expect("valid params")
    }

    #[test]
    fn test_hash_password() {
        let password = Password::new("mySecurePassword123".to_string());
        let hash = hasher().hash(&password).expect("Failed to hash password");

        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(hash.as_str().contains("m=1024,t=1,p=1"));
    }

    #[test]
    fn test_verify_password_correct() {
        let hasher = hasher();
        let password = Password::new("secret1".to_string());
        let hash = hasher.hash(&password).expect("Failed to hash password");

        assert!(hasher.verify(&password, &hash));
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hasher = hasher();
        let hash = hasher
            .hash(&Password::new("secret1".to_string()))
            .expect("Failed to hash password");

        assert!(!hasher.verify(&Password::new("secret2".to_string()), &hash));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hasher = hasher();
        let password = Password::new("mySecurePassword123".to_string());
        let hash1 = hasher.hash(&password).expect("Failed to hash password");
        let hash2 = hasher.hash(&password).expect("Failed to hash password");

        assert_ne!(hash1.as_str(), hash2.as_str());
        assert!(hasher.verify(&password, &hash1));
        assert!(hasher.verify(&password, &hash2));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        let hasher = hasher();
        let bogus = PasswordHashString::new("plaintext-by-mistake".to_string());
        assert!(!hasher.verify(&Password::new("plaintext-by-mistake".to_string()), &bogus));
    }

    #[test]
    fn test_password_debug_is_redacted() {
        let password = Password::new("hunter22".to_string());
        assert!(!format!("{:?}", password).contains("hunter22"));
    }

    #[test]
    fn test_rejects_invalid_params() {
        let result = CredentialHasher::new(&PasswordHashConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(result.is_err());
    }
}
